use std::collections::{BTreeMap, HashMap};

use super::model::{
    Dataset, Measurement, RawDataset, RawRecord, Record, DATE, DEFAULT_MAINTENANCE, DEFAULT_STATUS,
    DOWNTIME_RISK, TIME, TIMESTAMP,
};

// ---------------------------------------------------------------------------
// Cleaning report
// ---------------------------------------------------------------------------

/// Where an imputed value came from when a machine had no observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FallbackSource {
    /// Median of the measurement over every machine.
    GlobalMedian(f64),
    /// No machine has a single observation; `0.0` is used.
    Zero,
}

impl FallbackSource {
    pub fn value(self) -> f64 {
        match self {
            FallbackSource::GlobalMedian(v) => v,
            FallbackSource::Zero => 0.0,
        }
    }
}

/// A machine whose measurement column was entirely null.
#[derive(Debug, Clone, PartialEq)]
pub struct ImputationFallback {
    pub machine: String,
    pub measurement: Measurement,
    pub source: FallbackSource,
    /// Number of rows filled with the fallback value.
    pub rows: usize,
}

/// What the cleaner changed. All zeros means the input was already clean.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningReport {
    pub rows_in: usize,
    pub rows_dropped: usize,
    pub downtime_risk_dropped: bool,
    pub imputed: BTreeMap<Measurement, usize>,
    pub statuses_defaulted: usize,
    pub maintenance_defaulted: usize,
    pub fallbacks: Vec<ImputationFallback>,
}

impl CleaningReport {
    pub fn total_imputed(&self) -> usize {
        self.imputed.values().sum()
    }

    /// True when cleaning touched nothing.
    pub fn is_noop(&self) -> bool {
        self.rows_dropped == 0
            && !self.downtime_risk_dropped
            && self.total_imputed() == 0
            && self.statuses_defaulted == 0
            && self.maintenance_defaulted == 0
    }
}

pub struct CleanOutcome {
    pub dataset: Dataset,
    pub report: CleaningReport,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Clean a loaded dataset. The steps run in a fixed order: row drop happens
/// before imputation so dropped rows never contribute to a group median.
///
/// 1. split `timestamp` into `date` and `time`
/// 2. drop rows without a machine
/// 3. drop `downtime_risk`
/// 4. fill null measurements with the machine's median
/// 5. null `machine_status` -> `"Idle"`
/// 6. null `maintenance_required` -> `"No"`
pub fn clean(raw: &RawDataset) -> CleanOutcome {
    let mut report = CleaningReport {
        rows_in: raw.len(),
        downtime_risk_dropped: raw.has_column(DOWNTIME_RISK),
        ..Default::default()
    };

    let columns = output_columns(&raw.columns);

    let kept: Vec<&RawRecord> = raw.records.iter().filter(|r| r.machine.is_some()).collect();
    report.rows_dropped = raw.len() - kept.len();

    let fills = imputation_table(&kept, &mut report);

    let records = kept
        .into_iter()
        .map(|r| {
            // Only rows with a machine survived the filter above.
            let key = r.machine.as_deref().unwrap_or_default();

            let readings = r.readings.map(|m, v| match v {
                Some(v) => v,
                None => {
                    *report.imputed.entry(m).or_default() += 1;
                    fills.get(&(key, m)).copied().unwrap_or(0.0)
                }
            });

            let machine_status = r.machine_status.clone().unwrap_or_else(|| {
                report.statuses_defaulted += 1;
                DEFAULT_STATUS.to_string()
            });
            let maintenance_required = r.maintenance_required.clone().unwrap_or_else(|| {
                report.maintenance_defaulted += 1;
                DEFAULT_MAINTENANCE.to_string()
            });

            Record {
                date: r.timestamp.date(),
                time: r.timestamp.time(),
                machine: key.to_string(),
                readings,
                machine_status,
                maintenance_required,
                failure_type: r.failure_type.clone(),
                extra: r.extra.clone(),
            }
        })
        .collect();

    log::info!(
        "Cleaned {} rows: dropped {}, imputed {} values, defaulted {} statuses and {} maintenance flags",
        report.rows_in,
        report.rows_dropped,
        report.total_imputed(),
        report.statuses_defaulted,
        report.maintenance_defaulted
    );

    CleanOutcome {
        dataset: Dataset::from_records(records, columns),
        report,
    }
}

/// `timestamp` becomes `date` + `time`, `downtime_risk` disappears.
fn output_columns(input: &[String]) -> Vec<String> {
    fn push_unique(out: &mut Vec<String>, name: &str) {
        if !out.iter().any(|c| c == name) {
            out.push(name.to_string());
        }
    }

    let mut out: Vec<String> = Vec::with_capacity(input.len() + 1);
    for col in input {
        match col.as_str() {
            TIMESTAMP => {
                push_unique(&mut out, DATE);
                push_unique(&mut out, TIME);
            }
            DOWNTIME_RISK => {}
            other => push_unique(&mut out, other),
        }
    }
    out
}

/// Per (machine, measurement) fill value for every group that has a null.
fn imputation_table<'a>(
    rows: &[&'a RawRecord],
    report: &mut CleaningReport,
) -> HashMap<(&'a str, Measurement), f64> {
    let mut groups: BTreeMap<&'a str, Vec<&'a RawRecord>> = BTreeMap::new();
    for r in rows {
        if let Some(machine) = r.machine.as_deref() {
            groups.entry(machine).or_default().push(*r);
        }
    }

    let mut fills = HashMap::new();
    for m in Measurement::ALL {
        let global = median(rows.iter().filter_map(|r| r.readings.get(m)).collect());

        for (machine, members) in &groups {
            let nulls = members.iter().filter(|r| r.readings.get(m).is_none()).count();
            if nulls == 0 {
                continue;
            }
            let observed: Vec<f64> = members.iter().filter_map(|r| r.readings.get(m)).collect();
            let value = match median(observed) {
                Some(v) => v,
                None => {
                    let source = match global {
                        Some(v) => FallbackSource::GlobalMedian(v),
                        None => FallbackSource::Zero,
                    };
                    log::warn!(
                        "Machine '{machine}' has no {m} readings; filling {nulls} rows with {:?}",
                        source
                    );
                    report.fallbacks.push(ImputationFallback {
                        machine: machine.to_string(),
                        measurement: m,
                        source,
                        rows: nulls,
                    });
                    source.value()
                }
            };
            fills.insert((*machine, m), value);
        }
    }
    fills
}

/// Median of the values; the mean of the two middle values for even counts.
pub fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
