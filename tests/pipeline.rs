use std::collections::BTreeMap;
use std::io::Write;

use chrono::NaiveDate;
use proptest::prelude::*;

use rusty_factory::data::aggregate::{Correlation, TemperatureRange};
use rusty_factory::data::clean::{clean, median, FallbackSource};
use rusty_factory::data::filter::{filter, DateRange, Selection};
use rusty_factory::data::loader::{load_csv, DataLoadError};
use rusty_factory::data::model::{Measurement, RawDataset, RawRecord, Readings};
use rusty_factory::data::snapshot::render;

const HEADER: &str = "timestamp,machine,temperature,vibration,humidity,pressure,energy_consumption,machine_status,failure_type,downtime_risk,maintenance_required";

fn write_csv(rows: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file
}

#[test]
fn two_machine_scenario_end_to_end() {
    let file = write_csv(&[
        "2025-01-01 08:00:00,A,10,0.5,40,,1.0,Running,Normal,0.2,No",
        "2025-01-01 09:00:00,A,,0.5,42,,1.2,,Normal,,Yes",
        "2025-01-02 08:00:00,A,30,0.6,41,,1.1,Running,Overheating,,",
        "2025-01-01 08:00:00,B,,0.4,50,3.0,2.0,Idle,Normal,,No",
        "2025-01-02 08:00:00,B,50,0.4,55,3.2,2.2,Running,Normal,0.9,No",
        "2025-01-02 09:00:00,,99,9.9,99,9.9,9.9,Running,Normal,,No",
    ]);

    let raw = load_csv(file.path()).unwrap();
    assert_eq!(raw.len(), 6);

    let outcome = clean(&raw);
    let ds = &outcome.dataset;
    assert_eq!(ds.len(), 5);
    assert_eq!(outcome.report.rows_dropped, 1);

    let temps: Vec<(&str, f64)> = ds
        .records
        .iter()
        .map(|r| (r.machine.as_str(), r.get(Measurement::Temperature)))
        .collect();
    assert_eq!(
        temps,
        vec![("A", 10.0), ("A", 20.0), ("A", 30.0), ("B", 50.0), ("B", 50.0)]
    );

    // A never reports pressure: global median of B's readings.
    let a_pressure = ds.records[0].get(Measurement::Pressure);
    assert!((a_pressure - 3.1).abs() < 1e-9);
    assert_eq!(outcome.report.fallbacks.len(), 1);
    assert!(matches!(
        outcome.report.fallbacks[0].source,
        FallbackSource::GlobalMedian(_)
    ));

    assert_eq!(ds.records[1].machine_status, "Idle");
    assert_eq!(ds.records[2].maintenance_required, "No");
    assert!(!ds.columns.iter().any(|c| c == "downtime_risk"));

    let mut sel = Selection::all(ds);
    sel.machines = ["A".to_string()].into();
    let snap = render(ds, &sel);
    assert_eq!(snap.visible.len(), 3);
    assert_eq!(
        snap.tables.temperature_range,
        vec![TemperatureRange {
            machine: "A".into(),
            max: 30.0,
            min: 10.0
        }]
    );
}

#[test]
fn empty_maintenance_selection_empties_everything() {
    let file = write_csv(&[
        "2025-01-01 08:00:00,A,10,0.5,40,1,1.0,Running,Normal,,No",
        "2025-01-01 09:00:00,B,20,0.5,42,1,1.2,Running,Normal,,Yes",
    ]);
    let ds = clean(&load_csv(file.path()).unwrap()).dataset;
    let mut sel = Selection::all(&ds);
    sel.maintenance.clear();

    let snap = render(&ds, &sel);
    assert!(snap.is_empty());
    assert!(snap.tables.temperature_range.is_empty());
    assert!(snap.tables.status_distribution.is_empty());
    assert!(snap.tables.failure_by_machine.is_empty());
    assert!(matches!(snap.correlation, Correlation::NotApplicable(_)));
}

#[test]
fn missing_required_column_is_fatal() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "timestamp,machine,temperature").unwrap();
    writeln!(file, "2025-01-01 08:00:00,A,10").unwrap();
    let err = load_csv(file.path()).unwrap_err();
    assert!(matches!(err, DataLoadError::MissingColumns(_)));
    assert!(err.to_string().contains("energy_consumption"));
}

#[test]
fn infinite_reading_fails_the_load() {
    let file = write_csv(&[
        "2025-01-01 08:00:00,A,inf,0.5,40,1,1.0,Running,Normal,,No",
        "2025-01-01 09:00:00,A,20,0.5,42,1,1.2,Running,Normal,,No",
        "2025-01-01 10:00:00,A,30,0.5,45,1,1.1,Running,Normal,,No",
    ]);
    match load_csv(file.path()).unwrap_err() {
        DataLoadError::Number { row, column, value } => {
            assert_eq!((row, column.as_str(), value.as_str()), (2, "temperature", "inf"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn arb_record() -> impl Strategy<Value = RawRecord> {
    let reading = || prop::option::weighted(0.7, (0i32..100).prop_map(f64::from));
    (
        prop::option::weighted(0.9, prop::sample::select(vec!["A", "B", "C", "D"])),
        0u32..10,
        [reading(), reading(), reading(), reading(), reading()],
        prop::option::of(prop::sample::select(vec!["Running", "Idle", "Failure"])),
        prop::option::of(prop::sample::select(vec!["Yes", "No"])),
        prop::option::of(prop::sample::select(vec!["Normal", "Overheating", "Leak"])),
    )
        .prop_map(|(machine, day, readings, status, maintenance, failure)| RawRecord {
            timestamp: NaiveDate::from_ymd_opt(2025, 3, 1 + day)
                .unwrap()
                .and_hms_opt(6, 0, 0)
                .unwrap(),
            machine: machine.map(String::from),
            readings: Readings::new(readings),
            machine_status: status.map(String::from),
            maintenance_required: maintenance.map(String::from),
            failure_type: failure.map(String::from),
            downtime_risk: None,
            extra: BTreeMap::new(),
        })
}

fn arb_raw() -> impl Strategy<Value = RawDataset> {
    prop::collection::vec(arb_record(), 0..40).prop_map(|records| RawDataset {
        records,
        columns: HEADER.split(',').map(String::from).collect(),
    })
}

fn arb_subset(options: &[&'static str]) -> impl Strategy<Value = Vec<String>> {
    prop::sample::subsequence(options.to_vec(), 0..=options.len())
        .prop_map(|v| v.into_iter().map(String::from).collect())
}

proptest! {
    #[test]
    fn cleaning_is_idempotent(raw in arb_raw()) {
        let once = clean(&raw);
        let twice = clean(&once.dataset.to_raw());
        prop_assert_eq!(&twice.dataset, &once.dataset);
        prop_assert!(twice.report.is_noop());
    }

    #[test]
    fn imputed_values_are_group_medians(raw in arb_raw()) {
        let out = clean(&raw);
        let kept: Vec<&RawRecord> = raw.records.iter().filter(|r| r.machine.is_some()).collect();
        prop_assert_eq!(kept.len(), out.dataset.len());

        for m in Measurement::ALL {
            for (before, after) in kept.iter().zip(&out.dataset.records) {
                let value = after.get(m);
                prop_assert!(!value.is_nan());
                match before.readings.get(m) {
                    Some(v) => prop_assert_eq!(value, v),
                    None => {
                        let group: Vec<f64> = kept
                            .iter()
                            .filter(|r| r.machine == before.machine)
                            .filter_map(|r| r.readings.get(m))
                            .collect();
                        if let Some(expected) = median(group) {
                            prop_assert_eq!(value, expected);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn filter_is_a_conjunction(
        raw in arb_raw(),
        machines in arb_subset(&["A", "B", "C", "D"]),
        statuses in arb_subset(&["Running", "Idle", "Failure"]),
        maintenance in arb_subset(&["Yes", "No"]),
        start in 0u32..10,
        len in 0u32..10,
    ) {
        let ds = clean(&raw).dataset;
        let day = |d: u32| NaiveDate::from_ymd_opt(2025, 3, 1 + d).unwrap();
        let sel = Selection {
            machines: machines.into_iter().collect(),
            statuses: statuses.into_iter().collect(),
            maintenance: maintenance.into_iter().collect(),
            period: Some(DateRange::new(day(start), day((start + len).min(9)))),
        };
        let view = filter(&ds, &sel);
        let visible: Vec<usize> = view.indices().to_vec();

        for (i, r) in ds.records.iter().enumerate() {
            let expected = sel.machines.contains(&r.machine)
                && sel.statuses.contains(&r.machine_status)
                && sel.maintenance.contains(&r.maintenance_required)
                && sel.period.unwrap().contains(r.date);
            prop_assert_eq!(visible.contains(&i), expected);
        }
        if sel.machines.is_empty() || sel.statuses.is_empty() || sel.maintenance.is_empty() {
            prop_assert!(view.is_empty());
        }
    }

    #[test]
    fn distribution_percentages_sum_to_100(raw in arb_raw()) {
        let ds = clean(&raw).dataset;
        let snap = render(&ds, &Selection::all(&ds));
        if !snap.is_empty() {
            let status: f64 = snap.tables.status_distribution.iter().map(|s| s.percent).sum();
            prop_assert!((status - 100.0).abs() < 1e-6);

            if !snap.tables.failure_by_machine.is_empty() {
                let failure: f64 = snap.tables.failure_by_machine.iter().map(|s| s.percent).sum();
                prop_assert!((failure - 100.0).abs() < 1e-6);
            }
            if let Correlation::Coefficient(r) = snap.correlation {
                prop_assert!((-1.0..=1.0).contains(&r));
            }
        } else {
            prop_assert!(snap.tables.temperature_range.is_empty());
            prop_assert!(matches!(snap.correlation, Correlation::NotApplicable(_)));
        }
    }
}
