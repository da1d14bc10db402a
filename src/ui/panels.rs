use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use rusty_factory::data::filter::{DateRange, Dimension};
use rusty_factory::data::loader::load_csv;

use crate::state::{AppState, Session, Tab};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(session) = &state.session else {
        ui.label("No dataset loaded.");
        return;
    };

    // Options always come from the cleaned dataset, never from the view,
    // so a filter can be widened again after narrowing it.
    let options: Vec<(Dimension, Vec<String>)> = Dimension::ALL
        .iter()
        .map(|dim| (*dim, dim.options(&session.dataset).iter().cloned().collect()))
        .collect();
    let bounds = session.dataset.date_bounds;
    let palette = session.palettes.machines.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }
            ui.separator();

            // ---- Period ----
            if let (Some((lo, hi)), Some(period)) = (bounds, state.selection.period) {
                ui.strong("Period");
                let mut start = period.start;
                let mut end = period.end;
                let mut changed = false;
                ui.horizontal(|ui: &mut Ui| {
                    ui.label("From");
                    changed |= ui
                        .add(DatePickerButton::new(&mut start).id_salt("period_start"))
                        .changed();
                });
                ui.horizontal(|ui: &mut Ui| {
                    ui.label("To");
                    changed |= ui
                        .add(DatePickerButton::new(&mut end).id_salt("period_end"))
                        .changed();
                });
                ui.small(format!("Data covers {lo} to {hi}"));
                if changed {
                    state.set_period(DateRange::new(start, end));
                }
                ui.separator();
            }

            // ---- Per-dimension filter widgets (collapsible) ----
            for (dim, all_values) in &options {
                let n_selected = state.selection.values(*dim).len();
                let header_text = format!("{}  ({n_selected}/{})", dim.label(), all_values.len());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(dim.label())
                    .default_open(*dim != Dimension::Machine)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(*dim);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(*dim);
                            }
                        });

                        for val in all_values {
                            let mut checked = state.selection.values(*dim).contains(val);
                            let mut text = RichText::new(val);
                            if *dim == Dimension::Machine {
                                text = text.color(palette.color_for(val));
                            }
                            if ui.checkbox(&mut checked, text).changed() {
                                state.toggle_filter_value(*dim, val);
                            }
                        }
                    });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar and the tab strip.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(session), Some(snapshot)) = (&state.session, &state.snapshot) {
            ui.label(format!(
                "{}: {} rows loaded, {} visible",
                session.source,
                session.dataset.len(),
                snapshot.visible.len()
            ));
            ui.separator();
            ui.label(format!("Humidity ~ temperature r = {}", snapshot.correlation));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });

    ui.horizontal(|ui: &mut Ui| {
        for tab in Tab::ALL {
            ui.selectable_value(&mut state.tab, tab, tab.title());
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

/// Pick another CSV. A failed load keeps the current session.
pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open sensor data")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        match load_csv(&path) {
            Ok(raw) => {
                let source = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                state.set_session(Session::new(source, &raw));
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                state.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}
