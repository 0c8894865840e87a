use std::sync::Mutex;

use async_trait::async_trait;

use super::event_routes::{
    EventRoute, EventRouteRepository, RouteColumn, RouteFilter, StoreError, UpsertOutcome,
};

/// Event routes held in process memory, in insertion order.
#[derive(Default)]
pub struct InMemoryEventRoutes {
    routes: Mutex<Vec<EventRoute>>,
}

impl InMemoryEventRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<EventRoute>> {
        // Writes never leave the vector half-updated, so poisoning is ignored
        self.routes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl EventRouteRepository for InMemoryEventRoutes {
    async fn find_by(&self, filter: &RouteFilter) -> Result<Vec<EventRoute>, StoreError> {
        Ok(self
            .lock()
            .iter()
            .filter(|route| filter.matches(route))
            .cloned()
            .collect())
    }

    async fn upsert(
        &self,
        route: &EventRoute,
        conflict_columns: &[RouteColumn],
    ) -> Result<UpsertOutcome, StoreError> {
        if conflict_columns.is_empty() {
            return Err(StoreError::MissingConflictTarget);
        }
        let mut routes = self.lock();
        let existing = routes.iter_mut().find(|stored| {
            conflict_columns
                .iter()
                .all(|c| stored.value_of(*c) == route.value_of(*c))
        });
        match existing {
            Some(stored) => {
                for column in RouteColumn::ALL {
                    if conflict_columns.contains(&column) {
                        continue;
                    }
                    let value = route.value_of(column).to_string();
                    match column {
                        RouteColumn::AppName => stored.app_name = value,
                        RouteColumn::Event => stored.event = value,
                        RouteColumn::IdentifierValue => stored.identifier_value = value,
                        RouteColumn::FlowId => stored.flow_id = value,
                        RouteColumn::ProjectId => stored.project_id = value,
                    }
                }
                stored.updated = route.updated;
                Ok(UpsertOutcome::Updated(stored.clone()))
            }
            None => {
                routes.push(route.clone());
                Ok(UpsertOutcome::Inserted(route.clone()))
            }
        }
    }

    async fn delete(&self, filter: &RouteFilter) -> Result<u64, StoreError> {
        if filter.is_empty() {
            return Err(StoreError::EmptyCriteria);
        }
        let mut routes = self.lock();
        let before = routes.len();
        routes.retain(|route| !filter.matches(route));
        Ok((before - routes.len()) as u64)
    }
}
