use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::JobSource;
use crate::app::{DetailsTicket, SearchTicket};
use crate::error::ApiError;
use crate::models::{JobDetails, JobSummary};

/// A finished network call, tagged with the generation it was issued under.
#[derive(Debug)]
pub enum FlowEvent {
    SearchFinished {
        generation: u64,
        result: Result<Vec<JobSummary>, ApiError>,
    },
    DetailsFinished {
        generation: u64,
        result: Result<JobDetails, ApiError>,
    },
}

/// Runs search and detail calls on the tokio runtime so the UI loop never
/// blocks on the network. Completions come back on the channel returned by
/// [`FlowRunner::new`].
pub struct FlowRunner {
    handle: Handle,
    source: Arc<dyn JobSource>,
    events: UnboundedSender<FlowEvent>,
}

impl FlowRunner {
    pub fn new(handle: Handle, source: Arc<dyn JobSource>) -> (Self, UnboundedReceiver<FlowEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let runner = Self {
            handle,
            source,
            events,
        };
        (runner, receiver)
    }

    pub fn search(&self, ticket: SearchTicket) {
        let source = Arc::clone(&self.source);
        let events = self.events.clone();
        tracing::info!(
            generation = ticket.generation,
            keywords = %ticket.query.keywords.trim(),
            location = %ticket.query.location.trim(),
            "search issued"
        );
        self.handle.spawn(async move {
            let result = source.search(&ticket.query).await;
            match &result {
                Ok(jobs) => tracing::info!(generation = ticket.generation, count = jobs.len(), "search finished"),
                Err(err) => tracing::warn!(
                    generation = ticket.generation,
                    network = err.is_network(),
                    error = %err,
                    "search failed"
                ),
            }
            let event = FlowEvent::SearchFinished {
                generation: ticket.generation,
                result,
            };
            if events.send(event).is_err() {
                tracing::debug!("UI gone before search finished");
            }
        });
    }

    pub fn details(&self, ticket: DetailsTicket) {
        let source = Arc::clone(&self.source);
        let events = self.events.clone();
        tracing::info!(generation = ticket.generation, id = %ticket.id, "details issued");
        self.handle.spawn(async move {
            let result = source.job_details(&ticket.id).await;
            if let Err(err) = &result {
                tracing::warn!(
                    generation = ticket.generation,
                    id = %ticket.id,
                    network = err.is_network(),
                    error = %err,
                    "details failed"
                );
            }
            let event = FlowEvent::DetailsFinished {
                generation: ticket.generation,
                result,
            };
            if events.send(event).is_err() {
                tracing::debug!("UI gone before details finished");
            }
        });
    }
}
