use std::collections::BTreeSet;

use super::loader::is_null_token;
use super::model::{
    Measurement, RawDataset, RawRecord, DOWNTIME_RISK, FAILURE_TYPE, MACHINE, MACHINE_STATUS,
    MAINTENANCE_REQUIRED, TIMESTAMP,
};

/// How many distinct sample values each column shows.
const SAMPLE_VALUES: usize = 5;

// ---------------------------------------------------------------------------
// Data quality report on the raw CSV
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    DateTime,
    Number,
    Text,
}

impl ColumnKind {
    pub fn label(self) -> &'static str {
        match self {
            ColumnKind::DateTime => "datetime",
            ColumnKind::Number => "number",
            ColumnKind::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnQuality {
    pub column: String,
    pub kind: ColumnKind,
    pub nulls: usize,
    pub distinct: usize,
    /// First distinct non-null values in file order.
    pub samples: Vec<String>,
}

impl ColumnQuality {
    pub fn null_ratio(&self, rows: usize) -> f64 {
        if rows == 0 {
            0.0
        } else {
            self.nulls as f64 / rows as f64
        }
    }
}

/// Per-column summary of the file before any cleaning.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QualityReport {
    pub rows: usize,
    pub columns: Vec<ColumnQuality>,
}

impl QualityReport {
    pub fn from_raw(raw: &RawDataset) -> Self {
        let columns = raw
            .columns
            .iter()
            .map(|name| column_quality(name, &raw.records))
            .collect();
        QualityReport {
            rows: raw.len(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnQuality> {
        self.columns.iter().find(|c| c.column == name)
    }
}

fn column_quality(name: &str, records: &[RawRecord]) -> ColumnQuality {
    let kind = kind_of(name, records);
    let mut nulls = 0;
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut samples = Vec::new();

    for r in records {
        match cell(name, r) {
            None => nulls += 1,
            Some(v) => {
                if seen.insert(v.clone()) && samples.len() < SAMPLE_VALUES {
                    samples.push(v);
                }
            }
        }
    }

    ColumnQuality {
        column: name.to_string(),
        kind,
        nulls,
        distinct: seen.len(),
        samples,
    }
}

fn measurement(name: &str) -> Option<Measurement> {
    Measurement::ALL.into_iter().find(|m| m.column() == name)
}

fn kind_of(name: &str, records: &[RawRecord]) -> ColumnKind {
    if name == TIMESTAMP {
        return ColumnKind::DateTime;
    }
    if name == DOWNTIME_RISK || measurement(name).is_some() {
        return ColumnKind::Number;
    }
    let numeric = records
        .iter()
        .filter_map(|r| r.extra.get(name))
        .filter(|v| !is_null_token(v))
        .all(|v| v.parse::<f64>().is_ok());
    let any = records
        .iter()
        .any(|r| r.extra.get(name).is_some_and(|v| !is_null_token(v)));
    match name {
        MACHINE | MACHINE_STATUS | MAINTENANCE_REQUIRED | FAILURE_TYPE => ColumnKind::Text,
        _ if any && numeric => ColumnKind::Number,
        _ => ColumnKind::Text,
    }
}

fn cell(name: &str, r: &RawRecord) -> Option<String> {
    if let Some(m) = measurement(name) {
        return r.readings.get(m).map(|v| v.to_string());
    }
    match name {
        TIMESTAMP => Some(r.timestamp.to_string()),
        MACHINE => r.machine.clone(),
        MACHINE_STATUS => r.machine_status.clone(),
        MAINTENANCE_REQUIRED => r.maintenance_required.clone(),
        FAILURE_TYPE => r.failure_type.clone(),
        DOWNTIME_RISK => r.downtime_risk.map(|v| v.to_string()),
        other => r.extra.get(other).filter(|v| !is_null_token(v)).cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;

    fn load(text: &str) -> RawDataset {
        read_csv(csv::Reader::from_reader(text.as_bytes())).unwrap()
    }

    #[test]
    fn counts_nulls_distincts_and_samples() {
        let raw = load(
            "timestamp,machine,temperature,vibration,humidity,pressure,energy_consumption,machine_status,failure_type,downtime_risk,maintenance_required,anomaly_flag\n\
             2025-01-01 00:00:00,M1,70,1,1,1,1,Running,Normal,,No,0\n\
             2025-01-01 00:01:00,M2,,1,1,1,1,Idle,Normal,,No,1\n\
             2025-01-01 00:02:00,M1,72,1,1,1,1,,Normal,0.5,Yes,0\n",
        );
        let report = QualityReport::from_raw(&raw);
        assert_eq!(report.rows, 3);
        assert_eq!(report.columns.len(), 12);

        let temp = report.column("temperature").unwrap();
        assert_eq!(temp.kind, ColumnKind::Number);
        assert_eq!(temp.nulls, 1);
        assert_eq!(temp.samples, vec!["70".to_string(), "72".to_string()]);

        let risk = report.column("downtime_risk").unwrap();
        assert_eq!(risk.nulls, 2);
        assert!((risk.null_ratio(report.rows) - 2.0 / 3.0).abs() < 1e-12);

        let machine = report.column("machine").unwrap();
        assert_eq!(machine.kind, ColumnKind::Text);
        assert_eq!(machine.distinct, 2);

        let flag = report.column("anomaly_flag").unwrap();
        assert_eq!(flag.kind, ColumnKind::Number);
        assert_eq!(flag.distinct, 2);

        assert_eq!(report.column("timestamp").unwrap().kind, ColumnKind::DateTime);
    }

    #[test]
    fn extra_columns_share_the_loader_null_tokens() {
        let raw = load(
            "timestamp,machine,temperature,vibration,humidity,pressure,energy_consumption,machine_status,failure_type,maintenance_required,anomaly_flag,operator\n\
             2025-01-01 00:00:00,M1,NA,1,1,1,1,Running,Normal,No,NA,None\n\
             2025-01-01 00:01:00,M1,70,1,1,1,1,Running,Normal,No,1,ann\n",
        );
        let report = QualityReport::from_raw(&raw);

        let temp = report.column("temperature").unwrap();
        let flag = report.column("anomaly_flag").unwrap();
        assert_eq!(flag.nulls, temp.nulls);
        assert_eq!(flag.nulls, 1);
        assert_eq!(flag.kind, ColumnKind::Number);
        assert_eq!(flag.samples, vec!["1".to_string()]);

        let operator = report.column("operator").unwrap();
        assert_eq!(operator.nulls, 1);
        assert_eq!(operator.kind, ColumnKind::Text);
        assert_eq!(operator.distinct, 1);
    }
}
