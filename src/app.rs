use eframe::egui;

use crate::state::{AppState, Session};
use crate::ui::{panels, tabs};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RustyFactoryApp {
    pub state: AppState,
}

impl RustyFactoryApp {
    pub fn new(session: Session) -> Self {
        let mut state = AppState::default();
        state.set_session(session);
        Self { state }
    }
}

impl eframe::App for RustyFactoryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar + tabs ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: active tab ----
        egui::CentralPanel::default().show(ctx, |ui| {
            tabs::central_panel(ui, &self.state);
        });
    }
}
