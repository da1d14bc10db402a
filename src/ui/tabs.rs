use chrono::NaiveDate;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use rusty_factory::data::aggregate::AggregateTables;
use rusty_factory::data::model::{Dataset, Measurement, Record, DOWNTIME_RISK};
use rusty_factory::data::snapshot::Snapshot;

use crate::color::Palettes;
use crate::state::{AppState, Session, Tab};
use crate::ui::plot::{self, BarGroup, Slice};

// ---------------------------------------------------------------------------
// Central panel: one function per tab
// ---------------------------------------------------------------------------

/// Render the active tab in the central panel.
pub fn central_panel(ui: &mut Ui, state: &AppState) {
    let (Some(session), Some(snapshot)) = (&state.session, &state.snapshot) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a sensor CSV to start  (File → Open…)");
        });
        return;
    };

    if state.tab != Tab::Home && snapshot.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("No rows match the current filters.");
        });
        return;
    }

    match state.tab {
        Tab::Home => home(ui, session),
        Tab::Table => table(ui, &session.dataset, snapshot),
        Tab::Temperature => temperature(ui, &snapshot.tables, &session.palettes),
        Tab::Energy => energy(ui, &snapshot.tables, &session.palettes),
        Tab::FailureType => failure_type(ui, &snapshot.tables, &session.palettes),
        Tab::Status => status(ui, &snapshot.tables, &session.palettes),
    }
}

// ---------------------------------------------------------------------------
// Home
// ---------------------------------------------------------------------------

fn home(ui: &mut Ui, session: &Session) {
    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        ui.heading("Smart manufacturing dashboard");
        ui.label("An overview of the machine sensor readings.");
        ui.label("Use the filters in the sidebar to explore the data.");
        ui.separator();

        let report = &session.cleaning;
        ui.strong("Cleaning");
        ui.label(format!(
            "{} rows read, {} dropped for a missing machine, {} kept.",
            report.rows_in,
            report.rows_dropped,
            session.dataset.len()
        ));
        if report.downtime_risk_dropped {
            let sparse = session
                .quality
                .column(DOWNTIME_RISK)
                .map(|c| 100.0 * c.null_ratio(session.quality.rows))
                .unwrap_or(0.0);
            ui.label(format!(
                "Column downtime_risk removed ({sparse:.0}% of its values are missing)."
            ));
        }
        for m in Measurement::ALL {
            let n = report.imputed.get(&m).copied().unwrap_or(0);
            if n > 0 {
                ui.label(format!("{m}: {n} values filled with the machine median."));
            }
        }
        ui.label(format!(
            "{} statuses set to Idle, {} maintenance flags set to No.",
            report.statuses_defaulted, report.maintenance_defaulted
        ));
        for f in &report.fallbacks {
            ui.label(
                RichText::new(format!(
                    "{} has no {} readings; {} rows filled with {:.3}.",
                    f.machine,
                    f.measurement,
                    f.rows,
                    f.source.value()
                ))
                .color(Color32::YELLOW),
            );
        }
        ui.separator();

        ui.strong("Data quality (before cleaning)");
        egui::Grid::new("quality_grid")
            .striped(true)
            .show(ui, |ui: &mut Ui| {
                for h in ["Column", "Type", "Nulls", "Distinct", "First values"] {
                    ui.strong(h);
                }
                ui.end_row();
                for c in &session.quality.columns {
                    ui.label(&c.column);
                    ui.label(c.kind.label());
                    ui.label(format!(
                        "{} ({:.0}%)",
                        c.nulls,
                        100.0 * c.null_ratio(session.quality.rows)
                    ));
                    ui.label(c.distinct.to_string());
                    ui.label(c.samples.join(", "));
                    ui.end_row();
                }
            });
    });
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

fn table(ui: &mut Ui, dataset: &Dataset, snapshot: &Snapshot) {
    ui.heading("General table");
    let columns = &dataset.columns;
    let view = snapshot.view(dataset);
    let rows = view.indices();

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .columns(Column::auto().at_least(60.0), columns.len())
        .header(20.0, |mut header| {
            for c in columns {
                header.col(|ui: &mut Ui| {
                    ui.strong(c);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let record = &dataset.records[rows[row.index()]];
                for c in columns {
                    row.col(|ui: &mut Ui| {
                        ui.label(cell_text(record, c));
                    });
                }
            });
        });
}

fn cell_text(record: &Record, column: &str) -> String {
    if let Some(m) = Measurement::ALL.into_iter().find(|m| m.column() == column) {
        return format!("{:.2}", record.get(m));
    }
    match column {
        "date" => record.date.to_string(),
        "time" => record.time.to_string(),
        "machine" => record.machine.clone(),
        "machine_status" => record.machine_status.clone(),
        "maintenance_required" => record.maintenance_required.clone(),
        "failure_type" => record.failure_type.clone().unwrap_or_default(),
        other => record.extra.get(other).cloned().unwrap_or_default(),
    }
}

// ---------------------------------------------------------------------------
// Temperature
// ---------------------------------------------------------------------------

fn temperature(ui: &mut Ui, tables: &AggregateTables, palettes: &Palettes) {
    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        ui.heading("Temperature by machine");
        ui.columns(2, |cols| {
            cols[0].strong("Maximum and minimum temperature");
            plot::grouped_bars(
                &mut cols[0],
                "temp_range",
                "°C",
                vec![
                    BarGroup {
                        name: "Max temperature".into(),
                        color: Color32::from_rgb(230, 90, 70),
                        values: tables
                            .temperature_range
                            .iter()
                            .map(|r| (r.machine.clone(), r.max))
                            .collect(),
                    },
                    BarGroup {
                        name: "Min temperature".into(),
                        color: Color32::from_rgb(80, 140, 230),
                        values: tables
                            .temperature_range
                            .iter()
                            .map(|r| (r.machine.clone(), r.min))
                            .collect(),
                    },
                ],
            );

            cols[1].strong("Temperature distribution by machine");
            let slices: Vec<Slice> = tables
                .temperature_share
                .iter()
                .map(|s| Slice::new(&s.machine, s.total, palettes.machines.color_for(&s.machine)))
                .collect();
            plot::pie(&mut cols[1], "temp_share", &slices);
            for s in &tables.temperature_share {
                cols[1].small(format!("{}: {:.1} total, {:.1}%", s.machine, s.total, s.percent));
            }
        });

        ui.separator();
        ui.strong("Temperature over time");
        for series in &tables.temperature_series {
            let Some(origin) = series.points.first().map(|(ts, _)| *ts) else {
                continue;
            };
            let points: Vec<[f64; 2]> = series
                .points
                .iter()
                .map(|(ts, v)| [(*ts - origin).num_seconds() as f64 / 86_400.0, *v])
                .collect();
            ui.label(&series.machine);
            plot::lines(
                ui,
                &format!("temp_series_{}", series.machine),
                &format!("days since {origin}"),
                "°C",
                vec![(
                    series.machine.clone(),
                    palettes.machines.color_for(&series.machine),
                    points,
                )],
                false,
            );
        }
    });
}

// ---------------------------------------------------------------------------
// Energy
// ---------------------------------------------------------------------------

fn energy(ui: &mut Ui, tables: &AggregateTables, palettes: &Palettes) {
    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        ui.heading("Energy by machine");

        let origin: Option<NaiveDate> = tables
            .energy_by_date
            .iter()
            .filter_map(|s| s.points.first().map(|(d, _)| *d))
            .min();
        if let Some(origin) = origin {
            ui.strong("Energy consumption over time");
            let series: Vec<_> = tables
                .energy_by_date
                .iter()
                .map(|s| {
                    let points: Vec<[f64; 2]> = s
                        .points
                        .iter()
                        .map(|(d, v)| [(*d - origin).num_days() as f64, *v])
                        .collect();
                    (s.machine.clone(), palettes.machines.color_for(&s.machine), points)
                })
                .collect();
            plot::lines(
                ui,
                "energy_area",
                &format!("days since {origin}"),
                "kWh",
                series,
                true,
            );
        }

        ui.separator();
        ui.strong("Mean energy consumption");
        let slices: Vec<Slice> = tables
            .energy_mean
            .iter()
            .map(|m| Slice::new(&m.machine, m.mean, palettes.machines.color_for(&m.machine)))
            .collect();
        plot::category_bars(ui, "energy_mean", "kWh", &slices, false);
    });
}

// ---------------------------------------------------------------------------
// Failure type
// ---------------------------------------------------------------------------

fn failure_type(ui: &mut Ui, tables: &AggregateTables, palettes: &Palettes) {
    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        ui.heading("Failure types");
        ui.columns(2, |cols| {
            cols[0].strong("Machines per failure type");
            let by_machine: Vec<Slice> = tables
                .failure_by_machine
                .iter()
                .map(|s| {
                    Slice::new(&s.label, s.machines as f64, palettes.failures.color_for(&s.label))
                })
                .collect();
            plot::category_bars(&mut cols[0], "failure_machines", "machines", &by_machine, false);
            share_grid(
                &mut cols[0],
                "failure_machines_grid",
                tables
                    .failure_by_machine
                    .iter()
                    .map(|s| (s.label.as_str(), s.machines, s.percent, s.fleet_percent)),
            );

            cols[1].strong("Occurrences per failure type");
            let occurrences: Vec<Slice> = tables
                .failure_occurrences
                .iter()
                .map(|o| Slice::new(&o.label, o.count as f64, palettes.failures.color_for(&o.label)))
                .collect();
            plot::pie(&mut cols[1], "failure_occurrences", &occurrences);
        });

        ui.separator();
        ui.strong("Failure type → machine");
        let parents: Vec<(Slice, Vec<Slice>)> = tables
            .failure_breakdown
            .iter()
            .map(|f| {
                let parent = Slice::new(
                    &f.failure_type,
                    f.total as f64,
                    palettes.failures.color_for(&f.failure_type),
                );
                let children = f
                    .machines
                    .iter()
                    .map(|(m, n)| {
                        Slice::new(
                            format!("{} / {m}", f.failure_type),
                            *n as f64,
                            palettes.machines.color_for(m),
                        )
                    })
                    .collect();
                (parent, children)
            })
            .collect();
        plot::sunburst(ui, "failure_sunburst", &parents);
    });
}

// ---------------------------------------------------------------------------
// Status & vibration
// ---------------------------------------------------------------------------

fn status(ui: &mut Ui, tables: &AggregateTables, palettes: &Palettes) {
    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        ui.heading("Machine status");
        ui.columns(2, |cols| {
            cols[0].strong("Machines per status");
            let slices: Vec<Slice> = tables
                .status_distribution
                .iter()
                .map(|s| Slice::new(&s.label, s.machines as f64, palettes.statuses.color_for(&s.label)))
                .collect();
            plot::category_bars(&mut cols[0], "status_machines", "machines", &slices, false);
            share_grid(
                &mut cols[0],
                "status_grid",
                tables
                    .status_distribution
                    .iter()
                    .map(|s| (s.label.as_str(), s.machines, s.percent, s.fleet_percent)),
            );

            cols[1].strong("Readings per status");
            let readings: Vec<Slice> = tables
                .status_occurrences
                .iter()
                .map(|o| Slice::new(&o.label, o.count as f64, palettes.statuses.color_for(&o.label)))
                .collect();
            plot::pie(&mut cols[1], "status_occurrences", &readings);
        });

        ui.separator();
        ui.strong("Mean vibration by machine");
        let vibration: Vec<Slice> = tables
            .vibration_mean
            .iter()
            .map(|m| Slice::new(&m.machine, m.mean, palettes.machines.color_for(&m.machine)))
            .collect();
        plot::category_bars(ui, "vibration_mean", "mm/s", &vibration, true);

        if !tables.maintenance_due.is_empty() {
            ui.separator();
            ui.strong("Machines flagged for maintenance");
            ui.label(tables.maintenance_due.join(", "));
        }
    });
}

/// Count / percentage table under a distribution chart.
fn share_grid<'a>(
    ui: &mut Ui,
    id: &str,
    rows: impl Iterator<Item = (&'a str, usize, f64, f64)>,
) {
    egui::Grid::new(id).striped(true).show(ui, |ui: &mut Ui| {
        for h in ["", "Machines", "%", "% of fleet"] {
            ui.strong(h);
        }
        ui.end_row();
        for (label, count, percent, fleet) in rows {
            ui.label(label);
            ui.label(count.to_string());
            ui.label(format!("{percent:.1}"));
            ui.label(format!("{fleet:.1}"));
            ui.end_row();
        }
    });
}
