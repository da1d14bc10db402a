use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use super::filter::FilteredView;
use super::model::{Measurement, Record, MAINTENANCE_YES};

// ---------------------------------------------------------------------------
// Table rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureRange {
    pub machine: String,
    pub max: f64,
    pub min: f64,
}

/// A per-machine mean of one measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineMean {
    pub machine: String,
    pub mean: f64,
}

/// Distinct machines per category.
///
/// `percent` is taken against the sum of all group counts, so it always adds
/// up to 100. `fleet_percent` is taken against the distinct machines in the
/// view; a machine that shows up under several categories counts in each, so
/// these can add up to more than 100.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineShare {
    pub label: String,
    pub machines: usize,
    pub percent: f64,
    pub fleet_percent: f64,
}

/// Row count per category, with its share of all counted rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrences {
    pub label: String,
    pub count: usize,
    pub percent: f64,
}

/// Sum of a measurement per machine and its share of the grand total.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueShare {
    pub machine: String,
    pub total: f64,
    pub percent: f64,
}

/// One line per machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Series<X> {
    pub machine: String,
    pub points: Vec<(X, f64)>,
}

/// Failure type -> machines that reported it, with occurrence counts.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureBreakdown {
    pub failure_type: String,
    pub total: usize,
    pub machines: Vec<(String, usize)>,
}

// ---------------------------------------------------------------------------
// All tables for one view
// ---------------------------------------------------------------------------

/// Every derived table the panels draw. Each one is computed independently
/// from the view; an empty view gives empty tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateTables {
    pub temperature_range: Vec<TemperatureRange>,
    pub energy_mean: Vec<MachineMean>,
    pub vibration_mean: Vec<MachineMean>,
    pub failure_by_machine: Vec<MachineShare>,
    pub failure_occurrences: Vec<Occurrences>,
    pub status_distribution: Vec<MachineShare>,
    pub status_occurrences: Vec<Occurrences>,
    pub temperature_share: Vec<ValueShare>,
    pub energy_by_date: Vec<Series<NaiveDate>>,
    pub temperature_series: Vec<Series<NaiveDateTime>>,
    pub failure_breakdown: Vec<FailureBreakdown>,
    pub maintenance_due: Vec<String>,
}

impl AggregateTables {
    pub fn compute(view: &FilteredView<'_>) -> Self {
        if view.is_empty() {
            return AggregateTables::default();
        }
        AggregateTables {
            temperature_range: temperature_range(view),
            energy_mean: machine_mean(view, Measurement::EnergyConsumption),
            vibration_mean: machine_mean(view, Measurement::Vibration),
            failure_by_machine: distinct_machine_shares(view, |r| r.failure_type.as_deref()),
            failure_occurrences: occurrences(view, |r| r.failure_type.as_deref()),
            status_distribution: distinct_machine_shares(view, |r| Some(r.machine_status.as_str())),
            status_occurrences: occurrences(view, |r| Some(r.machine_status.as_str())),
            temperature_share: value_share(view, Measurement::Temperature),
            energy_by_date: energy_by_date(view),
            temperature_series: temperature_series(view),
            failure_breakdown: failure_breakdown(view),
            maintenance_due: maintenance_due(view),
        }
    }
}

fn by_machine<'a>(view: &FilteredView<'a>) -> BTreeMap<&'a str, Vec<&'a Record>> {
    let mut groups: BTreeMap<&'a str, Vec<&'a Record>> = BTreeMap::new();
    for r in view.records() {
        groups.entry(r.machine.as_str()).or_default().push(r);
    }
    groups
}

pub fn temperature_range(view: &FilteredView<'_>) -> Vec<TemperatureRange> {
    by_machine(view)
        .into_iter()
        .map(|(machine, rows)| {
            let temps = rows.iter().map(|r| r.get(Measurement::Temperature));
            TemperatureRange {
                machine: machine.to_string(),
                max: temps.clone().fold(f64::NEG_INFINITY, f64::max),
                min: temps.fold(f64::INFINITY, f64::min),
            }
        })
        .collect()
}

pub fn machine_mean(view: &FilteredView<'_>, m: Measurement) -> Vec<MachineMean> {
    by_machine(view)
        .into_iter()
        .map(|(machine, rows)| MachineMean {
            machine: machine.to_string(),
            mean: rows.iter().map(|r| r.get(m)).sum::<f64>() / rows.len() as f64,
        })
        .collect()
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

/// Distinct machines per category. Rows whose key is `None` are skipped.
pub fn distinct_machine_shares<'a>(
    view: &FilteredView<'a>,
    key: impl Fn(&'a Record) -> Option<&'a str>,
) -> Vec<MachineShare> {
    let mut groups: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut fleet: BTreeSet<&str> = BTreeSet::new();
    for r in view.records() {
        fleet.insert(&r.machine);
        if let Some(k) = key(r) {
            groups.entry(k).or_default().insert(&r.machine);
        }
    }

    let memberships: usize = groups.values().map(BTreeSet::len).sum();
    groups
        .into_iter()
        .map(|(label, machines)| MachineShare {
            label: label.to_string(),
            machines: machines.len(),
            percent: percent(machines.len() as f64, memberships as f64),
            fleet_percent: percent(machines.len() as f64, fleet.len() as f64),
        })
        .collect()
}

/// Row count per category. Rows whose key is `None` are skipped.
pub fn occurrences<'a>(
    view: &FilteredView<'a>,
    key: impl Fn(&'a Record) -> Option<&'a str>,
) -> Vec<Occurrences> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for r in view.records() {
        if let Some(k) = key(r) {
            *counts.entry(k).or_default() += 1;
        }
    }

    let total: usize = counts.values().sum();
    counts
        .into_iter()
        .map(|(label, count)| Occurrences {
            label: label.to_string(),
            count,
            percent: percent(count as f64, total as f64),
        })
        .collect()
}

pub fn value_share(view: &FilteredView<'_>, m: Measurement) -> Vec<ValueShare> {
    let totals: Vec<(&str, f64)> = by_machine(view)
        .into_iter()
        .map(|(machine, rows)| (machine, rows.iter().map(|r| r.get(m)).sum::<f64>()))
        .collect();
    let grand: f64 = totals.iter().map(|(_, t)| t).sum();
    totals
        .into_iter()
        .map(|(machine, total)| ValueShare {
            machine: machine.to_string(),
            total,
            percent: percent(total, grand),
        })
        .collect()
}

fn energy_by_date(view: &FilteredView<'_>) -> Vec<Series<NaiveDate>> {
    by_machine(view)
        .into_iter()
        .map(|(machine, rows)| {
            let mut per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
            for r in rows {
                *per_day.entry(r.date).or_default() += r.get(Measurement::EnergyConsumption);
            }
            Series {
                machine: machine.to_string(),
                points: per_day.into_iter().collect(),
            }
        })
        .collect()
}

/// One chronologically sorted temperature series per machine.
fn temperature_series(view: &FilteredView<'_>) -> Vec<Series<NaiveDateTime>> {
    by_machine(view)
        .into_iter()
        .map(|(machine, rows)| {
            let mut points: Vec<(NaiveDateTime, f64)> = rows
                .iter()
                .map(|r| (r.timestamp(), r.get(Measurement::Temperature)))
                .collect();
            points.sort_by_key(|(ts, _)| *ts);
            Series {
                machine: machine.to_string(),
                points,
            }
        })
        .collect()
}

fn failure_breakdown(view: &FilteredView<'_>) -> Vec<FailureBreakdown> {
    let mut tree: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
    for r in view.records() {
        if let Some(ft) = r.failure_type.as_deref() {
            *tree.entry(ft).or_default().entry(&r.machine).or_default() += 1;
        }
    }
    tree.into_iter()
        .map(|(failure_type, machines)| FailureBreakdown {
            failure_type: failure_type.to_string(),
            total: machines.values().sum(),
            machines: machines
                .into_iter()
                .map(|(m, n)| (m.to_string(), n))
                .collect(),
        })
        .collect()
}

fn maintenance_due(view: &FilteredView<'_>) -> Vec<String> {
    view.records()
        .filter(|r| r.maintenance_required == MAINTENANCE_YES)
        .map(|r| r.machine.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NotApplicable {
    TooFewRows { rows: usize },
    ZeroVariance,
    NonFinite,
}

impl fmt::Display for NotApplicable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotApplicable::TooFewRows { rows } => write!(f, "needs at least 2 rows, have {rows}"),
            NotApplicable::ZeroVariance => write!(f, "a variable is constant"),
            NotApplicable::NonFinite => write!(f, "a value is not finite"),
        }
    }
}

/// Pearson correlation of humidity and temperature over a view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correlation {
    Coefficient(f64),
    NotApplicable(NotApplicable),
}

impl Correlation {
    pub fn value(&self) -> Option<f64> {
        match self {
            Correlation::Coefficient(r) => Some(*r),
            Correlation::NotApplicable(_) => None,
        }
    }
}

impl fmt::Display for Correlation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Correlation::Coefficient(r) => write!(f, "{r:.3}"),
            Correlation::NotApplicable(why) => write!(f, "n/a ({why})"),
        }
    }
}

pub fn correlation(view: &FilteredView<'_>) -> Correlation {
    pearson(
        view.records()
            .map(|r| (r.get(Measurement::Humidity), r.get(Measurement::Temperature))),
    )
}

pub fn pearson(pairs: impl Iterator<Item = (f64, f64)>) -> Correlation {
    let pairs: Vec<(f64, f64)> = pairs.collect();
    let n = pairs.len();
    if n < 2 {
        return Correlation::NotApplicable(NotApplicable::TooFewRows { rows: n });
    }

    if pairs.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return Correlation::NotApplicable(NotApplicable::NonFinite);
    }

    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    let (mut x2, mut y2) = (0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
        x2 += x * x;
        y2 += y * y;
    }

    // Spread is measured relative to the magnitude of the values.
    if sxx <= f64::EPSILON * x2 || syy <= f64::EPSILON * y2 {
        return Correlation::NotApplicable(NotApplicable::ZeroVariance);
    }
    let r = sxy / (sxx.sqrt() * syy.sqrt());
    if !r.is_finite() {
        return Correlation::NotApplicable(NotApplicable::NonFinite);
    }
    Correlation::Coefficient(r.clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{filter, Selection};
    use crate::data::model::{Dataset, Readings};
    use chrono::NaiveTime;

    fn record(machine: &str, status: &str, failure: Option<&str>, temp: f64, energy: f64) -> Record {
        Record {
            date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            machine: machine.into(),
            readings: Readings::new([temp, 0.5, temp / 2.0, 3.0, energy]),
            machine_status: status.into(),
            maintenance_required: if status == "Failure" { "Yes" } else { "No" }.into(),
            failure_type: failure.map(String::from),
            extra: BTreeMap::new(),
        }
    }

    fn sample() -> Dataset {
        Dataset::from_records(
            vec![
                record("A", "Running", Some("Normal"), 10.0, 1.0),
                record("A", "Failure", Some("Overheating"), 30.0, 3.0),
                record("B", "Running", Some("Normal"), 50.0, 2.0),
                record("C", "Idle", None, 20.0, 4.0),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn temperature_range_per_machine() {
        let ds = sample();
        let t = AggregateTables::compute(&filter(&ds, &Selection::all(&ds)));
        assert_eq!(
            t.temperature_range,
            vec![
                TemperatureRange { machine: "A".into(), max: 30.0, min: 10.0 },
                TemperatureRange { machine: "B".into(), max: 50.0, min: 50.0 },
                TemperatureRange { machine: "C".into(), max: 20.0, min: 20.0 },
            ]
        );
        assert_eq!(t.energy_mean[0], MachineMean { machine: "A".into(), mean: 2.0 });
    }

    #[test]
    fn failure_tables_use_their_own_denominators() {
        let ds = sample();
        let t = AggregateTables::compute(&filter(&ds, &Selection::all(&ds)));

        // Normal: A, B. Overheating: A. C has no failure type.
        let normal = &t.failure_by_machine[0];
        assert_eq!(normal.label, "Normal");
        assert_eq!(normal.machines, 2);
        assert!((normal.percent - 200.0 / 3.0).abs() < 1e-9);
        assert!((normal.fleet_percent - 200.0 / 3.0).abs() < 1e-9);
        let over = &t.failure_by_machine[1];
        assert!((over.percent - 100.0 / 3.0).abs() < 1e-9);

        let occ: Vec<(&str, usize)> = t
            .failure_occurrences
            .iter()
            .map(|o| (o.label.as_str(), o.count))
            .collect();
        assert_eq!(occ, vec![("Normal", 2), ("Overheating", 1)]);
        let sum: f64 = t.failure_occurrences.iter().map(|o| o.percent).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn status_distribution_counts_distinct_machines() {
        let ds = sample();
        let t = AggregateTables::compute(&filter(&ds, &Selection::all(&ds)));
        let rows: Vec<(&str, usize)> = t
            .status_distribution
            .iter()
            .map(|s| (s.label.as_str(), s.machines))
            .collect();
        assert_eq!(rows, vec![("Failure", 1), ("Idle", 1), ("Running", 2)]);
        let sum: f64 = t.status_distribution.iter().map(|s| s.percent).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        // Running: 2 of 3 machines.
        assert!((t.status_distribution[2].fleet_percent - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn auxiliary_tables() {
        let ds = sample();
        let t = AggregateTables::compute(&filter(&ds, &Selection::all(&ds)));
        assert_eq!(t.maintenance_due, vec!["A".to_string()]);
        assert_eq!(t.temperature_series.len(), 3);
        assert_eq!(t.temperature_series[0].points.len(), 2);
        assert_eq!(t.energy_by_date[0].points, vec![(ds.records[0].date, 4.0)]);
        let share: f64 = t.temperature_share.iter().map(|s| s.percent).sum();
        assert!((share - 100.0).abs() < 1e-9);
        assert_eq!(t.failure_breakdown[0].failure_type, "Normal");
        assert_eq!(t.failure_breakdown[0].total, 2);
    }

    #[test]
    fn empty_view_gives_empty_tables() {
        let ds = sample();
        let mut sel = Selection::all(&ds);
        sel.machines.clear();
        let view = filter(&ds, &sel);
        assert_eq!(AggregateTables::compute(&view), AggregateTables::default());
        assert_eq!(
            correlation(&view),
            Correlation::NotApplicable(NotApplicable::TooFewRows { rows: 0 })
        );
    }

    #[test]
    fn pearson_cases() {
        let perfect = pearson([(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)].into_iter());
        assert!((perfect.value().unwrap() - 1.0).abs() < 1e-12);
        let inverse = pearson([(1.0, 3.0), (2.0, 2.0), (3.0, 1.0)].into_iter());
        assert!((inverse.value().unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(
            pearson([(1.0, 5.0), (2.0, 5.0)].into_iter()),
            Correlation::NotApplicable(NotApplicable::ZeroVariance)
        );
        assert_eq!(
            pearson([(1.0, 5.0)].into_iter()),
            Correlation::NotApplicable(NotApplicable::TooFewRows { rows: 1 })
        );
    }

    #[test]
    fn pearson_scales_with_the_data() {
        let tiny = pearson([(1e-9, 1.0), (2e-9, 2.0), (3e-9, 3.0)].into_iter());
        assert!((tiny.value().unwrap() - 1.0).abs() < 1e-9);
        let huge = pearson([(1e12, 1.0), (1e12, 2.0), (1e12, 3.0)].into_iter());
        assert_eq!(huge, Correlation::NotApplicable(NotApplicable::ZeroVariance));
        assert_eq!(
            pearson([(0.0, 1.0), (0.0, 2.0)].into_iter()),
            Correlation::NotApplicable(NotApplicable::ZeroVariance)
        );
    }

    #[test]
    fn pearson_never_reports_nan() {
        let c = pearson([(f64::INFINITY, 1.0), (20.0, 2.0), (30.0, 3.0)].into_iter());
        assert_eq!(c, Correlation::NotApplicable(NotApplicable::NonFinite));
        assert_eq!(c.to_string(), "n/a (a value is not finite)");
        let c = pearson([(f64::NAN, 1.0), (2.0, 2.0)].into_iter());
        assert!(c.value().is_none());
    }

    #[test]
    fn humidity_temperature_correlation() {
        // Humidity is temp / 2 in the sample, so the correlation is exact.
        let ds = sample();
        let c = correlation(&filter(&ds, &Selection::all(&ds)));
        assert!((c.value().unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(c.to_string(), "1.000");
    }
}
