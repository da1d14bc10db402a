use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const TIMESTAMP: &str = "timestamp";
pub const MACHINE: &str = "machine";
pub const MACHINE_STATUS: &str = "machine_status";
pub const MAINTENANCE_REQUIRED: &str = "maintenance_required";
pub const FAILURE_TYPE: &str = "failure_type";
pub const DOWNTIME_RISK: &str = "downtime_risk";
pub const DATE: &str = "date";
pub const TIME: &str = "time";

/// Columns the loader refuses to work without.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    TIMESTAMP,
    MACHINE,
    "temperature",
    "vibration",
    "humidity",
    "pressure",
    "energy_consumption",
    MACHINE_STATUS,
    MAINTENANCE_REQUIRED,
    FAILURE_TYPE,
];

pub const DEFAULT_STATUS: &str = "Idle";
pub const DEFAULT_MAINTENANCE: &str = "No";
pub const MAINTENANCE_YES: &str = "Yes";

// ---------------------------------------------------------------------------
// Measurement – the five continuous sensor readings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Measurement {
    Temperature,
    Vibration,
    Humidity,
    Pressure,
    EnergyConsumption,
}

impl Measurement {
    pub const ALL: [Measurement; 5] = [
        Measurement::Temperature,
        Measurement::Vibration,
        Measurement::Humidity,
        Measurement::Pressure,
        Measurement::EnergyConsumption,
    ];

    /// CSV column name.
    pub fn column(self) -> &'static str {
        match self {
            Measurement::Temperature => "temperature",
            Measurement::Vibration => "vibration",
            Measurement::Humidity => "humidity",
            Measurement::Pressure => "pressure",
            Measurement::EnergyConsumption => "energy_consumption",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Fixed-size storage for the five measurements, indexed by [`Measurement`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Readings<T>([T; 5]);

impl<T: Copy> Readings<T> {
    pub fn new(values: [T; 5]) -> Self {
        Readings(values)
    }

    pub fn get(&self, m: Measurement) -> T {
        self.0[m.index()]
    }

    pub fn set(&mut self, m: Measurement, value: T) {
        self.0[m.index()] = value;
    }

    pub fn map<U: Copy>(&self, mut f: impl FnMut(Measurement, T) -> U) -> Readings<U> {
        let mut out = [f(Measurement::ALL[0], self.0[0]); 5];
        for m in Measurement::ALL.into_iter().skip(1) {
            out[m.index()] = f(m, self.get(m));
        }
        Readings(out)
    }
}

// ---------------------------------------------------------------------------
// RawRecord / RawDataset – the CSV as loaded, nulls still present
// ---------------------------------------------------------------------------

/// One CSV row before cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub timestamp: NaiveDateTime,
    pub machine: Option<String>,
    pub readings: Readings<Option<f64>>,
    pub machine_status: Option<String>,
    pub maintenance_required: Option<String>,
    pub failure_type: Option<String>,
    pub downtime_risk: Option<f64>,
    /// Columns with no special meaning, passed through verbatim.
    pub extra: BTreeMap<String, String>,
}

/// The loaded table: rows plus the header in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawDataset {
    pub records: Vec<RawRecord>,
    pub columns: Vec<String>,
}

impl RawDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

// ---------------------------------------------------------------------------
// Record / Dataset – the cleaned, canonical data
// ---------------------------------------------------------------------------

/// A cleaned machine reading. Every measurement is present.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub machine: String,
    pub readings: Readings<f64>,
    pub machine_status: String,
    pub maintenance_required: String,
    pub failure_type: Option<String>,
    pub extra: BTreeMap<String, String>,
}

impl Record {
    pub fn get(&self, m: Measurement) -> f64 {
        self.readings.get(m)
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// The cleaned dataset with pre-computed option lists for the filters.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub records: Vec<Record>,
    /// Output columns in display order.
    pub columns: Vec<String>,
    pub machines: BTreeSet<String>,
    pub statuses: BTreeSet<String>,
    pub maintenance_values: BTreeSet<String>,
    pub failure_types: BTreeSet<String>,
    /// Earliest and latest observed date (None for an empty dataset).
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
}

impl Dataset {
    /// Build the distinct-value indices from cleaned records.
    pub fn from_records(records: Vec<Record>, columns: Vec<String>) -> Self {
        let mut machines = BTreeSet::new();
        let mut statuses = BTreeSet::new();
        let mut maintenance_values = BTreeSet::new();
        let mut failure_types = BTreeSet::new();
        let mut date_bounds: Option<(NaiveDate, NaiveDate)> = None;

        for r in &records {
            machines.insert(r.machine.clone());
            statuses.insert(r.machine_status.clone());
            maintenance_values.insert(r.maintenance_required.clone());
            if let Some(ft) = &r.failure_type {
                failure_types.insert(ft.clone());
            }
            date_bounds = Some(match date_bounds {
                None => (r.date, r.date),
                Some((lo, hi)) => (lo.min(r.date), hi.max(r.date)),
            });
        }

        Dataset {
            records,
            columns,
            machines,
            statuses,
            maintenance_values,
            failure_types,
            date_bounds,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Convert back into the raw shape, e.g. to feed the cleaner again.
    pub fn to_raw(&self) -> RawDataset {
        let records = self
            .records
            .iter()
            .map(|r| RawRecord {
                timestamp: r.timestamp(),
                machine: Some(r.machine.clone()),
                readings: r.readings.map(|_, v| Some(v)),
                machine_status: Some(r.machine_status.clone()),
                maintenance_required: Some(r.maintenance_required.clone()),
                failure_type: r.failure_type.clone(),
                downtime_risk: None,
                extra: r.extra.clone(),
            })
            .collect();

        RawDataset {
            records,
            columns: self.columns.clone(),
        }
    }
}
