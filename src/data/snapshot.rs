use super::aggregate::{correlation, AggregateTables, Correlation};
use super::filter::{filter, FilteredView, Selection};
use super::model::Dataset;

/// Everything one render cycle shows: which rows are visible, the derived
/// tables, and the humidity/temperature correlation.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub visible: Vec<usize>,
    pub tables: AggregateTables,
    pub correlation: Correlation,
}

impl Snapshot {
    /// True when the selection matched no rows.
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Re-borrow the visible rows as a view over `dataset`.
    pub fn view<'a>(&self, dataset: &'a Dataset) -> FilteredView<'a> {
        FilteredView::from_indices(dataset, self.visible.clone())
    }
}

/// Recompute the view, the tables and the correlation from scratch.
/// Nothing is carried over from earlier calls.
pub fn render(dataset: &Dataset, selection: &Selection) -> Snapshot {
    let view = filter(dataset, selection);
    let tables = AggregateTables::compute(&view);
    let correlation = correlation(&view);

    if view.is_empty() {
        log::debug!("Selection matches no rows");
    } else {
        log::debug!(
            "Selection matches {} of {} rows across {} machines",
            view.len(),
            dataset.len(),
            tables.temperature_range.len()
        );
    }

    Snapshot {
        visible: view.into_indices(),
        tables,
        correlation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate::NotApplicable;
    use crate::data::model::{Readings, Record};
    use chrono::{NaiveDate, NaiveTime};
    use std::collections::BTreeMap;

    fn dataset() -> Dataset {
        let rec = |machine: &str, temp: f64, hum: f64| Record {
            date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            time: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            machine: machine.into(),
            readings: Readings::new([temp, 1.0, hum, 1.0, 1.0]),
            machine_status: "Running".into(),
            maintenance_required: "No".into(),
            failure_type: Some("Normal".into()),
            extra: BTreeMap::new(),
        };
        Dataset::from_records(
            vec![rec("A", 10.0, 40.0), rec("A", 20.0, 35.0), rec("B", 30.0, 20.0)],
            Vec::new(),
        )
    }

    #[test]
    fn render_is_a_pure_function_of_its_inputs() {
        let ds = dataset();
        let sel = Selection::all(&ds);
        let first = render(&ds, &sel);
        let mut narrowed = sel.clone();
        narrowed.machines = ["B".to_string()].into();
        let _ = render(&ds, &narrowed);
        assert_eq!(render(&ds, &sel), first);
        assert_eq!(first.visible, vec![0, 1, 2]);
        assert!(first.correlation.value().unwrap() < 0.0);
    }

    #[test]
    fn single_row_view_has_no_correlation() {
        let ds = dataset();
        let mut sel = Selection::all(&ds);
        sel.machines = ["B".to_string()].into();
        let snap = render(&ds, &sel);
        assert_eq!(snap.view(&ds).len(), 1);
        assert_eq!(
            snap.correlation,
            Correlation::NotApplicable(NotApplicable::TooFewRows { rows: 1 })
        );
    }

    #[test]
    fn empty_selection_degrades_gracefully() {
        let ds = dataset();
        let mut sel = Selection::all(&ds);
        sel.maintenance.clear();
        let snap = render(&ds, &sel);
        assert!(snap.is_empty());
        assert_eq!(snap.tables, AggregateTables::default());
        assert!(snap.correlation.value().is_none());
    }
}
