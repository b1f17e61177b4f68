use tracing::{debug, info, warn};

use crate::models::{DateSelection, HistoricEvent};
use crate::workflow::{QueryRequest, WorkflowState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Model,
    Date,
    Results,
}

impl Focus {
    pub const fn next(self) -> Self {
        match self {
            Self::Model => Self::Date,
            Self::Date => Self::Results,
            Self::Results => Self::Model,
        }
    }
}

/// A query handed out by [`App::begin_submission`]. Only the result carrying
/// the latest ticket is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub ticket: u64,
    pub model: String,
    pub date: DateSelection,
}

#[derive(Debug)]
pub struct App {
    pub should_quit: bool,
    pub exit_pending: bool,
    pub show_help: bool,
    pub focus: Focus,

    pub available_models: Vec<String>,
    pub selected_model: Option<usize>,
    pub preferred_model: Option<String>,
    pub models_loading: bool,
    pub models_error: Option<String>,
    pub backend_healthy: Option<bool>,

    pub selected_date: DateSelection,
    pub queried_date: Option<DateSelection>,
    pub state: WorkflowState,
    pub selected_event: usize,
    pub scroll_offset: usize,

    ticket: u64,
}

impl App {
    pub fn new(preferred_model: Option<String>) -> Self {
        Self {
            should_quit: false,
            exit_pending: false,
            show_help: false,
            focus: Focus::Model,
            available_models: Vec::new(),
            selected_model: None,
            preferred_model,
            models_loading: true,
            models_error: None,
            backend_healthy: None,
            selected_date: DateSelection::today(),
            queried_date: None,
            state: WorkflowState::Idle,
            selected_event: 0,
            scroll_offset: 0,
            ticket: 0,
        }
    }

    pub const fn quit(&mut self) {
        self.should_quit = true;
    }

    pub const fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub const fn cycle_focus(&mut self) {
        self.focus = self.focus.next();
    }

    pub const fn is_loading(&self) -> bool {
        matches!(self.state, WorkflowState::Loading)
    }

    pub fn set_models(&mut self, result: Result<Vec<String>, String>) {
        self.models_loading = false;
        match result {
            Ok(models) => {
                self.models_error = None;
                self.selected_model = self
                    .preferred_model
                    .as_ref()
                    .and_then(|preferred| models.iter().position(|m| m == preferred));
                self.available_models = models;
            }
            Err(error) => {
                self.models_error = Some(error);
                self.available_models.clear();
                self.selected_model = None;
            }
        }
    }

    /// Selected model identifier, empty when nothing is selected.
    pub fn current_model(&self) -> &str {
        self.selected_model
            .and_then(|index| self.available_models.get(index))
            .map_or("", String::as_str)
    }

    pub fn select_next_model(&mut self) {
        let count = self.available_models.len();
        if count == 0 {
            return;
        }
        self.selected_model = Some(self.selected_model.map_or(0, |i| (i + 1) % count));
    }

    pub fn select_previous_model(&mut self) {
        let count = self.available_models.len();
        if count == 0 {
            return;
        }
        let previous = self.selected_model.map_or(count - 1, |i| (i + count - 1) % count);
        self.selected_model = Some(previous);
    }

    pub fn shift_date_days(&mut self, days: i64) {
        self.selected_date = self.selected_date.shift_days(days);
    }

    pub fn shift_date_months(&mut self, months: i32) {
        self.selected_date = self.selected_date.shift_months(months);
    }

    /// Start a query for the current selection. Without a model the state
    /// goes straight to `Error` and nothing is returned; otherwise the state
    /// is `Loading` and the caller runs the returned submission.
    pub fn begin_submission(&mut self) -> Option<Submission> {
        self.ticket += 1;
        self.queried_date = Some(self.selected_date);
        self.selected_event = 0;
        self.scroll_offset = 0;

        match QueryRequest::new(self.current_model(), self.selected_date) {
            Ok(request) => {
                info!(ticket = self.ticket, provider = %request.provider, "Submitting query");
                self.state = WorkflowState::Loading;
                Some(Submission {
                    ticket: self.ticket,
                    model: request.provider,
                    date: self.selected_date,
                })
            }
            Err(error) => {
                debug!(%error, "Submission rejected");
                self.state = WorkflowState::Error(error.user_message());
                None
            }
        }
    }

    /// Apply the outcome of a submission. Returns `false` when a newer
    /// submission has started since, in which case the result is dropped.
    pub fn finish_submission(&mut self, ticket: u64, state: WorkflowState) -> bool {
        if ticket != self.ticket {
            warn!(ticket, latest = self.ticket, "Discarding stale query result");
            return false;
        }
        self.state = state;
        self.selected_event = 0;
        self.scroll_offset = 0;
        true
    }

    pub fn events(&self) -> &[HistoricEvent] {
        match &self.state {
            WorkflowState::Success(events) => events.as_slice(),
            _ => &[],
        }
    }

    pub fn selected_event(&self) -> Option<&HistoricEvent> {
        self.events().get(self.selected_event)
    }

    pub fn select_next_event(&mut self) {
        if self.selected_event + 1 < self.events().len() {
            self.selected_event += 1;
        }
    }

    pub const fn select_previous_event(&mut self) {
        self.selected_event = self.selected_event.saturating_sub(1);
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(None)
    }
}
