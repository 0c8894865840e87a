//! Listener registry.
//!
//! Maps `(app_name, event, identifier_value)` triggers coming from external
//! systems to the flow that handles them inside a project. At most one route
//! exists per `(app_name, event, identifier_value, project_id)`; registering
//! the same trigger again for another flow moves the route to that flow.

pub mod batch;

use futures::future::join_all;
use serde::Deserialize;

use crate::info;
use crate::models::event_routes::{
    EventRoute, EventRouteRepository, RouteColumn, RouteFilter, StoreError,
};
use crate::telemetry::LogKey;

pub use batch::{BatchOutcome, BatchReport, BatchStatus, EventResult};

/// Columns that identify a route for upserts. `flow_id` is the value
/// being bound, not part of the key.
pub const ROUTE_CONFLICT_KEY: [RouteColumn; 4] = [
    RouteColumn::AppName,
    RouteColumn::Event,
    RouteColumn::IdentifierValue,
    RouteColumn::ProjectId,
];

#[derive(Debug, Clone, Deserialize)]
pub struct ListListeners {
    pub app_name: String,
    pub event: String,
    pub identifier_value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateListeners {
    pub app_name: String,
    pub events: Vec<String>,
    pub identifier_value: String,
    pub flow_id: String,
    pub project_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteListeners {
    pub project_id: String,
    pub flow_id: String,
}

pub struct ListenerRegistry<'a, R: EventRouteRepository + ?Sized> {
    pub repo: &'a R,
}

impl<R: EventRouteRepository + ?Sized> ListenerRegistry<'_, R> {
    /// Routes matching the trigger, across all projects.
    pub async fn list_listeners(
        &self,
        request: &ListListeners,
    ) -> Result<Vec<EventRoute>, StoreError> {
        self.repo
            .find_by(&RouteFilter {
                app_name: Some(request.app_name.clone()),
                event: Some(request.event.clone()),
                identifier_value: Some(request.identifier_value.clone()),
                ..Default::default()
            })
            .await
    }

    /// Upsert one route per event, concurrently, and report every result.
    pub async fn register_batch(&self, request: &CreateListeners) -> BatchOutcome {
        let mut events: Vec<&str> = Vec::with_capacity(request.events.len());
        for event in &request.events {
            if !events.contains(&event.as_str()) {
                events.push(event);
            }
        }
        if events.is_empty() {
            info!(
                LogKey::ListenersCreateEmpty,
                app_name = request.app_name.as_str(),
                flow_id = request.flow_id.as_str(),
                "No events given, nothing to register"
            );
            return BatchOutcome::default();
        }
        info!(
            LogKey::ListenersCreate,
            app_name = request.app_name.as_str(),
            events = ?events,
            identifier_value = request.identifier_value.as_str(),
            flow_id = request.flow_id.as_str(),
            project_id = request.project_id.as_str(),
            "Creating listeners"
        );

        let routes: Vec<EventRoute> = events
            .iter()
            .map(|event| {
                EventRoute::new(
                    &request.app_name,
                    event,
                    &request.identifier_value,
                    &request.flow_id,
                    &request.project_id,
                )
            })
            .collect();
        let results = join_all(
            routes
                .iter()
                .map(|route| self.repo.upsert(route, &ROUTE_CONFLICT_KEY)),
        )
        .await;

        BatchOutcome {
            results: routes
                .into_iter()
                .zip(results)
                .map(|(route, result)| EventResult {
                    event: route.event,
                    result,
                })
                .collect(),
        }
    }

    /// All-or-nothing form of `register_batch`: fails with the first store
    /// error, without rolling back routes that were written.
    pub async fn create_listeners(
        &self,
        request: &CreateListeners,
    ) -> Result<Vec<EventRoute>, StoreError> {
        self.register_batch(request).await.into_result()
    }

    /// Remove every route owned by the flow, whatever its trigger.
    /// Returns the number of routes removed.
    pub async fn delete_listeners(&self, request: &DeleteListeners) -> Result<u64, StoreError> {
        self.repo
            .delete(&RouteFilter {
                project_id: Some(request.project_id.clone()),
                flow_id: Some(request.flow_id.clone()),
                ..Default::default()
            })
            .await
    }
}
