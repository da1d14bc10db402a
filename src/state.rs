use rusty_factory::data::clean::{clean, CleaningReport};
use rusty_factory::data::filter::{DateRange, Dimension, Selection};
use rusty_factory::data::model::{Dataset, RawDataset};
use rusty_factory::data::quality::QualityReport;
use rusty_factory::data::snapshot::{render, Snapshot};

use crate::color::{ColorMap, Palettes};

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Table,
    Temperature,
    Energy,
    FailureType,
    Status,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Home,
        Tab::Table,
        Tab::Temperature,
        Tab::Energy,
        Tab::FailureType,
        Tab::Status,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Home => "Home",
            Tab::Table => "Table",
            Tab::Temperature => "Temperature",
            Tab::Energy => "Energy",
            Tab::FailureType => "Failure Type",
            Tab::Status => "Status & Vibration",
        }
    }
}

// ---------------------------------------------------------------------------
// Loaded session
// ---------------------------------------------------------------------------

/// One loaded file: the cleaned dataset plus what cleaning reported.
pub struct Session {
    pub source: String,
    pub dataset: Dataset,
    pub cleaning: CleaningReport,
    pub quality: QualityReport,
    pub palettes: Palettes,
}

impl Session {
    pub fn new(source: String, raw: &RawDataset) -> Self {
        let quality = QualityReport::from_raw(raw);
        let outcome = clean(raw);
        let palettes = Palettes {
            machines: ColorMap::new(&outcome.dataset.machines),
            statuses: ColorMap::new(&outcome.dataset.statuses),
            failures: ColorMap::new(&outcome.dataset.failure_types),
        };
        Session {
            source,
            dataset: outcome.dataset,
            cleaning: outcome.report,
            quality,
            palettes,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded data (None until a file loads).
    pub session: Option<Session>,

    /// What the sidebar currently selects.
    pub selection: Selection,

    /// Output of the last render cycle.
    pub snapshot: Option<Snapshot>,

    pub tab: Tab,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            session: None,
            selection: Selection::default(),
            snapshot: None,
            tab: Tab::Home,
            status_message: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded file, reset filters and render once.
    pub fn set_session(&mut self, session: Session) {
        self.selection = Selection::all(&session.dataset);
        self.session = Some(session);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the snapshot after a selection change.
    pub fn refilter(&mut self) {
        if let Some(s) = &self.session {
            self.snapshot = Some(render(&s.dataset, &self.selection));
        }
    }

    pub fn toggle_filter_value(&mut self, dim: Dimension, value: &str) {
        self.selection.toggle(dim, value);
        self.refilter();
    }

    pub fn select_all(&mut self, dim: Dimension) {
        if let Some(s) = &self.session {
            self.selection.select_all(dim, &s.dataset);
            self.refilter();
        }
    }

    pub fn select_none(&mut self, dim: Dimension) {
        self.selection.select_none(dim);
        self.refilter();
    }

    pub fn set_period(&mut self, period: DateRange) {
        self.selection.period = Some(period);
        self.refilter();
    }

    /// Back to "everything selected".
    pub fn reset_filters(&mut self) {
        if let Some(s) = &self.session {
            self.selection = Selection::all(&s.dataset);
            self.refilter();
        }
    }
}
