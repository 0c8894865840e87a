use serde::Serialize;

use crate::models::event_routes::{EventRoute, StoreError, UpsertOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Complete,
    Partial,
    Failed,
}

#[derive(Debug)]
pub struct EventResult {
    pub event: String,
    pub result: Result<UpsertOutcome, StoreError>,
}

/// Per-event results of one `create_listeners` call, in the order the
/// events were given. Routes written before a failure stay written.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub results: Vec<EventResult>,
}

#[derive(Debug, Serialize)]
pub struct EventReport {
    pub event: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub status: BatchStatus,
    pub events: Vec<EventReport>,
}

impl BatchOutcome {
    pub fn status(&self) -> BatchStatus {
        let failed = self.failed_events().len();
        match failed {
            0 => BatchStatus::Complete,
            n if n == self.results.len() => BatchStatus::Failed,
            _ => BatchStatus::Partial,
        }
    }

    pub fn failed_events(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| r.result.is_err())
            .map(|r| r.event.as_str())
            .collect()
    }

    pub fn routes(&self) -> Vec<&EventRoute> {
        self.results
            .iter()
            .filter_map(|r| r.result.as_ref().ok())
            .map(|outcome| outcome.route())
            .collect()
    }

    pub fn report(&self) -> BatchReport {
        BatchReport {
            status: self.status(),
            events: self
                .results
                .iter()
                .map(|r| EventReport {
                    event: r.event.clone(),
                    ok: r.result.is_ok(),
                    error: r.result.as_ref().err().map(|e| e.to_string()),
                })
                .collect(),
        }
    }

    /// Collapse into all-or-nothing form. The first store error is
    /// returned as is; routes already written are not undone.
    pub fn into_result(self) -> Result<Vec<EventRoute>, StoreError> {
        self.results
            .into_iter()
            .map(|r| r.result.map(UpsertOutcome::into_route))
            .collect()
    }
}
