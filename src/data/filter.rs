use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::{Dataset, Record};

// ---------------------------------------------------------------------------
// Selection: what the sidebar currently has ticked
// ---------------------------------------------------------------------------

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// Inverted ranges contain nothing.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The categorical dimensions the sidebar filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Machine,
    Status,
    Maintenance,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Machine, Dimension::Status, Dimension::Maintenance];

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Machine => "Machine",
            Dimension::Status => "Machine status",
            Dimension::Maintenance => "Maintenance required",
        }
    }

    /// Every value the cleaned dataset offers for this dimension.
    pub fn options(self, dataset: &Dataset) -> &BTreeSet<String> {
        match self {
            Dimension::Machine => &dataset.machines,
            Dimension::Status => &dataset.statuses,
            Dimension::Maintenance => &dataset.maintenance_values,
        }
    }

    fn value_of(self, record: &Record) -> &str {
        match self {
            Dimension::Machine => &record.machine,
            Dimension::Status => &record.machine_status,
            Dimension::Maintenance => &record.maintenance_required,
        }
    }
}

/// A conjunctive filter over the cleaned dataset.
///
/// Unlike a "no constraint when empty" filter, an empty set here selects
/// nothing: unticking every machine hides every row. `Default` selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub machines: BTreeSet<String>,
    pub statuses: BTreeSet<String>,
    pub maintenance: BTreeSet<String>,
    /// `None` only for an empty dataset, which has no dates to select.
    pub period: Option<DateRange>,
}

impl Selection {
    /// Everything selected: all distinct values, the full observed period.
    pub fn all(dataset: &Dataset) -> Self {
        Selection {
            machines: dataset.machines.clone(),
            statuses: dataset.statuses.clone(),
            maintenance: dataset.maintenance_values.clone(),
            period: dataset
                .date_bounds
                .map(|(start, end)| DateRange::new(start, end)),
        }
    }

    pub fn values(&self, dim: Dimension) -> &BTreeSet<String> {
        match dim {
            Dimension::Machine => &self.machines,
            Dimension::Status => &self.statuses,
            Dimension::Maintenance => &self.maintenance,
        }
    }

    pub fn values_mut(&mut self, dim: Dimension) -> &mut BTreeSet<String> {
        match dim {
            Dimension::Machine => &mut self.machines,
            Dimension::Status => &mut self.statuses,
            Dimension::Maintenance => &mut self.maintenance,
        }
    }

    /// Toggle a single value of a dimension.
    pub fn toggle(&mut self, dim: Dimension, value: &str) {
        let selected = self.values_mut(dim);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
    }

    /// Select all values the dataset offers for a dimension.
    pub fn select_all(&mut self, dim: Dimension, dataset: &Dataset) {
        *self.values_mut(dim) = dim.options(dataset).clone();
    }

    /// Deselect all values of a dimension.
    pub fn select_none(&mut self, dim: Dimension) {
        self.values_mut(dim).clear();
    }

    /// Does a record satisfy every predicate?
    pub fn matches(&self, record: &Record) -> bool {
        Dimension::ALL
            .iter()
            .all(|dim| self.values(*dim).contains(dim.value_of(record)))
            && self.period.is_some_and(|p| p.contains(record.date))
    }
}

// ---------------------------------------------------------------------------
// FilteredView
// ---------------------------------------------------------------------------

/// The records of a dataset that pass a selection, in dataset order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// A view over explicit row indices.
    pub fn from_indices(dataset: &'a Dataset, indices: Vec<usize>) -> Self {
        FilteredView { dataset, indices }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn into_indices(self) -> Vec<usize> {
        self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let dataset = self.dataset;
        self.indices.iter().map(move |&i| &dataset.records[i])
    }
}

/// Apply the selection. The dataset is never modified; option lists for the
/// sidebar keep coming from `dataset`, not from the returned view.
pub fn filter<'a>(dataset: &'a Dataset, selection: &Selection) -> FilteredView<'a> {
    let indices = dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| selection.matches(r))
        .map(|(i, _)| i)
        .collect();
    FilteredView { dataset, indices }
}
