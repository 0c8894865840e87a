use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, PgPool, Postgres, QueryBuilder, Row};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

const ROUTE_COLUMNS: &str =
    "id, app_name, event, identifier_value, flow_id, project_id, created, updated";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventRoute {
    pub id: Uuid,
    pub app_name: String,
    pub event: String,
    pub identifier_value: String,
    pub flow_id: String,
    pub project_id: String,
    #[serde(with = "time::serde::timestamp")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::timestamp")]
    pub updated: OffsetDateTime,
}
impl PartialEq for EventRoute {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id &&
        self.app_name == other.app_name &&
        self.event == other.event &&
        self.identifier_value == other.identifier_value &&
        self.flow_id == other.flow_id &&
        self.project_id == other.project_id &&
        // When timestamps go in and out of database they lose precision
        self.created.unix_timestamp() == other.created.unix_timestamp() &&
        self.updated.unix_timestamp() == other.updated.unix_timestamp()
    }
}
impl Eq for EventRoute {}

impl EventRoute {
    pub fn new(
        app_name: &str,
        event: &str,
        identifier_value: &str,
        flow_id: &str,
        project_id: &str,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        EventRoute {
            id: Uuid::new_v4(),
            app_name: app_name.to_string(),
            event: event.to_string(),
            identifier_value: identifier_value.to_string(),
            flow_id: flow_id.to_string(),
            project_id: project_id.to_string(),
            created: now,
            updated: now,
        }
    }

    pub fn value_of(&self, column: RouteColumn) -> &str {
        match column {
            RouteColumn::AppName => &self.app_name,
            RouteColumn::Event => &self.event,
            RouteColumn::IdentifierValue => &self.identifier_value,
            RouteColumn::FlowId => &self.flow_id,
            RouteColumn::ProjectId => &self.project_id,
        }
    }
}

/// The string columns of `event_routes` that can be filtered on or used
/// as a conflict target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteColumn {
    AppName,
    Event,
    IdentifierValue,
    FlowId,
    ProjectId,
}

impl RouteColumn {
    pub const ALL: [RouteColumn; 5] = [
        RouteColumn::AppName,
        RouteColumn::Event,
        RouteColumn::IdentifierValue,
        RouteColumn::FlowId,
        RouteColumn::ProjectId,
    ];

    pub fn column_name(&self) -> &'static str {
        match self {
            RouteColumn::AppName => "app_name",
            RouteColumn::Event => "event",
            RouteColumn::IdentifierValue => "identifier_value",
            RouteColumn::FlowId => "flow_id",
            RouteColumn::ProjectId => "project_id",
        }
    }
}

/// Equality conditions, ANDed together. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteFilter {
    pub app_name: Option<String>,
    pub event: Option<String>,
    pub identifier_value: Option<String>,
    pub flow_id: Option<String>,
    pub project_id: Option<String>,
}

impl RouteFilter {
    pub fn conditions(&self) -> Vec<(RouteColumn, &str)> {
        RouteColumn::ALL
            .into_iter()
            .filter_map(|column| {
                let value = match column {
                    RouteColumn::AppName => self.app_name.as_deref(),
                    RouteColumn::Event => self.event.as_deref(),
                    RouteColumn::IdentifierValue => self.identifier_value.as_deref(),
                    RouteColumn::FlowId => self.flow_id.as_deref(),
                    RouteColumn::ProjectId => self.project_id.as_deref(),
                };
                value.map(|v| (column, v))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions().is_empty()
    }

    pub fn matches(&self, route: &EventRoute) -> bool {
        self.conditions()
            .into_iter()
            .all(|(column, value)| route.value_of(column) == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(EventRoute),
    Updated(EventRoute),
}

impl UpsertOutcome {
    pub fn route(&self) -> &EventRoute {
        match self {
            UpsertOutcome::Inserted(route) | UpsertOutcome::Updated(route) => route,
        }
    }

    pub fn into_route(self) -> EventRoute {
        match self {
            UpsertOutcome::Inserted(route) | UpsertOutcome::Updated(route) => route,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("upsert needs at least one conflict column")]
    MissingConflictTarget,
    #[error("empty criteria are not allowed for delete")]
    EmptyCriteria,
}

/// Storage contract for event routes.
///
/// `upsert` must be atomic with respect to `conflict_columns`: two
/// concurrent upserts sharing the same conflict values leave exactly one
/// row behind. Columns outside the conflict key, except `id` and
/// `created`, are overwritten by the incoming route.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRouteRepository: Send + Sync {
    async fn find_by(&self, filter: &RouteFilter) -> Result<Vec<EventRoute>, StoreError>;

    async fn upsert(
        &self,
        route: &EventRoute,
        conflict_columns: &[RouteColumn],
    ) -> Result<UpsertOutcome, StoreError>;

    async fn delete(&self, filter: &RouteFilter) -> Result<u64, StoreError>;
}

fn push_conditions(builder: &mut QueryBuilder<'_, Postgres>, filter: &RouteFilter) {
    for (i, (column, value)) in filter.conditions().into_iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        builder.push(column.column_name());
        builder.push(" = ");
        builder.push_bind(value.to_string());
    }
}

pub struct EventRouteModel {
    pub db_pool: PgPool,
}

impl EventRouteModel {
    pub fn upsert_sql(conflict_columns: &[RouteColumn]) -> String {
        let target = conflict_columns
            .iter()
            .map(|c| c.column_name())
            .collect::<Vec<_>>()
            .join(", ");
        let mut assignments: Vec<String> = RouteColumn::ALL
            .iter()
            .filter(|c| !conflict_columns.contains(*c))
            .map(|c| format!("{0} = EXCLUDED.{0}", c.column_name()))
            .collect();
        assignments.push("updated = EXCLUDED.updated".to_string());
        format!(
            r#"INSERT INTO event_routes ({columns})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT ({target}) DO UPDATE SET {assignments}
            RETURNING {columns}, (xmax = 0) AS inserted"#,
            columns = ROUTE_COLUMNS,
            target = target,
            assignments = assignments.join(", "),
        )
    }

    pub async fn fetch_one_by_id(&self, id: &Uuid) -> Result<EventRoute, StoreError> {
        let route = sqlx::query_as::<_, EventRoute>(&format!(
            "SELECT {} FROM event_routes WHERE id = $1",
            ROUTE_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.db_pool)
        .await?;
        Ok(route)
    }
}

#[async_trait]
impl EventRouteRepository for EventRouteModel {
    async fn find_by(&self, filter: &RouteFilter) -> Result<Vec<EventRoute>, StoreError> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM event_routes", ROUTE_COLUMNS));
        push_conditions(&mut builder, filter);
        let routes = builder
            .build_query_as::<EventRoute>()
            .fetch_all(&self.db_pool)
            .await?;
        Ok(routes)
    }

    async fn upsert(
        &self,
        route: &EventRoute,
        conflict_columns: &[RouteColumn],
    ) -> Result<UpsertOutcome, StoreError> {
        if conflict_columns.is_empty() {
            return Err(StoreError::MissingConflictTarget);
        }
        let sql = EventRouteModel::upsert_sql(conflict_columns);
        let row: PgRow = sqlx::query(&sql)
            .bind(route.id)
            .bind(&route.app_name)
            .bind(&route.event)
            .bind(&route.identifier_value)
            .bind(&route.flow_id)
            .bind(&route.project_id)
            .bind(route.created)
            .bind(route.updated)
            .fetch_one(&self.db_pool)
            .await?;
        let inserted: bool = row.try_get("inserted")?;
        let stored = EventRoute::from_row(&row)?;
        Ok(match inserted {
            true => UpsertOutcome::Inserted(stored),
            false => UpsertOutcome::Updated(stored),
        })
    }

    async fn delete(&self, filter: &RouteFilter) -> Result<u64, StoreError> {
        if filter.is_empty() {
            return Err(StoreError::EmptyCriteria);
        }
        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM event_routes");
        push_conditions(&mut builder, filter);
        let result = builder.build().execute(&self.db_pool).await?;
        Ok(result.rows_affected())
    }
}
