use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Column layout of the smart-manufacturing export.
#[derive(Serialize)]
struct SampleRow {
    timestamp: String,
    machine_id: u32,
    machine: Option<String>,
    temperature: Option<f64>,
    vibration: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
    energy_consumption: Option<f64>,
    machine_status: Option<&'static str>,
    anomaly_flag: u8,
    predicted_remaining_life: u32,
    failure_type: &'static str,
    downtime_risk: Option<f64>,
    maintenance_required: Option<&'static str>,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// `Some(v)` except with probability `p_null`.
    fn maybe(&mut self, p_null: f64, v: f64) -> Option<f64> {
        if self.chance(p_null) {
            None
        } else {
            Some((v * 100.0).round() / 100.0)
        }
    }
}

const MACHINES: usize = 6;
const DAYS: i64 = 14;
const READINGS_PER_DAY: i64 = 24;

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "smart_manufacturing_data.csv".to_string());

    let start = NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid start date")?;
    let statuses = ["Running", "Running", "Running", "Idle", "Failure"];
    let failures = [
        "Normal",
        "Normal",
        "Normal",
        "Overheating",
        "Vibration Issue",
        "Pressure Drop",
        "Electrical Fault",
    ];

    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("creating {output_path}"))?;
    let mut rows = 0usize;

    for step in 0..DAYS * READINGS_PER_DAY {
        let timestamp = start + Duration::hours(step);
        for m in 1..=MACHINES as u32 {
            let base_temp = 60.0 + 5.0 * m as f64;
            let status = rng.pick(&statuses);
            let failure = if status == "Failure" {
                rng.pick(&failures[3..])
            } else {
                rng.pick(&failures)
            };
            let hot = failure == "Overheating";

            let temperature = rng.gauss(base_temp + if hot { 15.0 } else { 0.0 }, 4.0);
            let vibration = rng.gauss(0.5, 0.15).abs();
            let humidity = rng.gauss(45.0, 8.0);
            let pressure = rng.gauss(3.0, 0.4);
            let energy = rng.gauss(1.5 + 0.2 * m as f64, 0.3).abs();
            let risk = rng.next_f64();

            let row = SampleRow {
                timestamp: timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                machine_id: m,
                // A few rows lose their machine name and get dropped by cleaning.
                machine: (!rng.chance(0.01)).then(|| format!("Machine_{m}")),
                temperature: rng.maybe(0.05, temperature),
                vibration: rng.maybe(0.05, vibration),
                humidity: rng.maybe(0.05, humidity),
                // The last machine's pressure sensor never reports.
                pressure: if m == MACHINES as u32 {
                    None
                } else {
                    rng.maybe(0.05, pressure)
                },
                energy_consumption: rng.maybe(0.05, energy),
                machine_status: (!rng.chance(0.03)).then_some(status),
                anomaly_flag: u8::from(status == "Failure"),
                predicted_remaining_life: (rng.next_u64() % 500) as u32,
                failure_type: failure,
                downtime_risk: rng.maybe(0.45, risk),
                maintenance_required: if rng.chance(0.03) {
                    None
                } else if status == "Failure" || rng.chance(0.1) {
                    Some("Yes")
                } else {
                    Some("No")
                },
            };
            writer.serialize(row)?;
            rows += 1;
        }
    }
    writer.flush()?;

    println!("Wrote {rows} readings for {MACHINES} machines to {output_path}");
    Ok(())
}
