use chrono::{DateTime, Local};
use std::fmt::Display;

use crate::error::ValidationError;
use crate::flows::FlowEvent;
use crate::models::{JobDetails, JobSummary, SearchQuery};

pub const FALLBACK_ERROR: &str = "An unexpected error occurred.";

/// Where the search flow stands. Validation happens inside `submit_search`
/// and never outlives the call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchPhase {
    #[default]
    Idle,
    Loading,
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Keywords,
    Location,
    Results,
}

/// A search that passed validation and should be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub generation: u64,
    pub query: SearchQuery,
}

/// A detail lookup for the job that was just selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailsTicket {
    pub generation: u64,
    pub id: String,
}

/// Everything the screen shows. Only the search and detail flows write to it.
///
/// Each flow stamps its requests with an increasing generation; a completion
/// whose generation is no longer the latest for its flow is dropped.
#[derive(Debug, Default)]
pub struct AppState {
    pub keywords: String,
    pub location: String,
    pub jobs: Vec<JobSummary>,
    pub loading: bool,
    pub details_loading: bool,
    pub error: Option<String>,
    pub selected: Option<usize>,
    pub job_details: Option<JobDetails>,
    pub cursor: usize,
    pub focus: Focus,
    pub phase: SearchPhase,
    pub scroll_offset: u16,
    pub last_search: Option<DateTime<Local>>,
    search_generation: u64,
    details_generation: u64,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(query: SearchQuery) -> Self {
        Self {
            keywords: query.keywords,
            location: query.location,
            ..Self::default()
        }
    }

    pub fn query(&self) -> SearchQuery {
        SearchQuery::new(self.keywords.clone(), self.location.clone())
    }

    // --- Search flow ---

    /// Validate the form and, if it passes, reset dependent state and hand
    /// back the request to send.
    pub fn submit_search(&mut self) -> Result<SearchTicket, ValidationError> {
        let query = self.query();
        if let Err(err) = query.validate() {
            self.error = Some(err.to_string());
            self.phase = SearchPhase::Failed;
            return Err(err);
        }

        self.clear_selection();
        self.loading = true;
        self.phase = SearchPhase::Loading;
        self.search_generation += 1;

        Ok(SearchTicket {
            generation: self.search_generation,
            query,
        })
    }

    /// Apply a search completion. Returns false if it was stale.
    pub fn finish_search<E: Display>(
        &mut self,
        generation: u64,
        result: Result<Vec<JobSummary>, E>,
    ) -> bool {
        if generation != self.search_generation {
            tracing::debug!(
                generation,
                latest = self.search_generation,
                "discarding stale search result"
            );
            return false;
        }

        self.loading = false;
        match result {
            Ok(jobs) => {
                // a row picked from the old list while this search ran no longer exists
                self.clear_selection();
                self.jobs = jobs;
                self.cursor = 0;
                self.phase = SearchPhase::Success;
                self.last_search = Some(Local::now());
            }
            Err(err) => {
                self.error = Some(flow_message(&err));
                self.phase = SearchPhase::Failed;
            }
        }
        true
    }

    // --- Detail flow ---

    /// Make sure details for `index` are shown or on their way.
    ///
    /// A summary that already carries a description is shown as-is; otherwise
    /// its id is looked up. Selecting the job that is already shown (or
    /// already loading) does nothing.
    pub fn select(&mut self, index: usize) -> Option<DetailsTicket> {
        let job = self.jobs.get(index)?.clone();
        if self.selected == Some(index) && (self.job_details.is_some() || self.details_loading) {
            return None;
        }

        self.clear_selection();
        self.selected = Some(index);
        self.cursor = index;

        if job.has_description() {
            self.job_details = Some(JobDetails::from_summary(&job));
            return None;
        }

        let id = job.id?;
        self.details_loading = true;
        Some(DetailsTicket {
            generation: self.details_generation,
            id,
        })
    }

    pub fn select_at_cursor(&mut self) -> Option<DetailsTicket> {
        self.select(self.cursor)
    }

    /// Apply a detail completion. Returns false if it was stale.
    pub fn finish_details<E: Display>(
        &mut self,
        generation: u64,
        result: Result<JobDetails, E>,
    ) -> bool {
        if generation != self.details_generation {
            tracing::debug!(
                generation,
                latest = self.details_generation,
                "discarding stale job details"
            );
            return false;
        }

        self.details_loading = false;
        match result {
            Ok(details) => self.job_details = Some(details),
            Err(err) => self.error = Some(flow_message(&err)),
        }
        true
    }

    pub fn apply(&mut self, event: FlowEvent) -> bool {
        match event {
            FlowEvent::SearchFinished { generation, result } => {
                self.finish_search(generation, result)
            }
            FlowEvent::DetailsFinished { generation, result } => {
                self.finish_details(generation, result)
            }
        }
    }

    /// Drop selection, details and any error, and orphan any lookup still in
    /// flight.
    fn clear_selection(&mut self) {
        self.error = None;
        self.selected = None;
        self.job_details = None;
        self.details_loading = false;
        self.scroll_offset = 0;
        self.details_generation += 1;
    }

    // --- Accessors ---

    pub fn selected_job(&self) -> Option<&JobSummary> {
        self.selected.and_then(|index| self.jobs.get(index))
    }

    /// Link for "open externally": loaded details first, then the summary's own URL.
    pub fn apply_url(&self) -> Option<&str> {
        if let Some(details) = &self.job_details {
            return details.apply_url();
        }
        self.selected_job()
            .and_then(|job| job.url.as_deref())
            .filter(|url| !url.trim().is_empty())
    }

    /// The empty-state message only makes sense once nothing is loading.
    pub fn show_empty_message(&self) -> bool {
        self.jobs.is_empty() && !self.loading
    }

    // --- Form editing and navigation ---

    fn focused_field(&mut self) -> Option<&mut String> {
        match self.focus {
            Focus::Keywords => Some(&mut self.keywords),
            Focus::Location => Some(&mut self.location),
            Focus::Results => None,
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(field) = self.focused_field() {
            field.push(c);
            self.reset_phase();
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.focused_field() {
            field.pop();
            self.reset_phase();
        }
    }

    fn reset_phase(&mut self) {
        if matches!(self.phase, SearchPhase::Success | SearchPhase::Failed) {
            self.phase = SearchPhase::Idle;
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            Focus::Keywords => Focus::Location,
            Focus::Location => Focus::Results,
            Focus::Results => Focus::Keywords,
        };
    }

    pub fn focus_prev(&mut self) {
        self.focus = match self.focus {
            Focus::Keywords => Focus::Results,
            Focus::Location => Focus::Keywords,
            Focus::Results => Focus::Location,
        };
    }

    pub fn cursor_next(&mut self) {
        if !self.jobs.is_empty() && self.cursor < self.jobs.len() - 1 {
            self.cursor += 1;
        }
    }

    pub fn cursor_prev(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }
}

/// User-facing text for a failed flow.
fn flow_message(err: &impl Display) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        FALLBACK_ERROR.to_string()
    } else {
        message
    }
}
