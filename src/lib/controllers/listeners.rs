use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::{
    error_and_incr, info_and_incr,
    models::event_routes::EventRouteRepository,
    registry::{BatchStatus, CreateListeners, DeleteListeners, ListListeners, ListenerRegistry},
    telemetry::{LogKey, StatsD},
};

#[derive(Serialize, Deserialize, Debug)]
pub struct DeleteResponse {
    pub deleted: u64,
}

pub async fn list(
    query: web::Query<ListListeners>,
    repo: web::Data<dyn EventRouteRepository>,
    statsd: web::Data<StatsD>,
) -> HttpResponse {
    let registry = ListenerRegistry {
        repo: repo.get_ref(),
    };
    match registry.list_listeners(&query).await {
        Ok(routes) => {
            statsd.incr(&LogKey::ListenersList);
            HttpResponse::Ok().json(routes)
        }
        Err(e) => {
            error_and_incr!(
                statsd,
                LogKey::ListenersListFailed,
                error = e,
                app_name = query.app_name.as_str(),
                event = query.event.as_str(),
                "Could not list listeners"
            );
            HttpResponse::InternalServerError().finish()
        }
    }
}

pub async fn create(
    data: web::Json<CreateListeners>,
    repo: web::Data<dyn EventRouteRepository>,
    statsd: web::Data<StatsD>,
) -> HttpResponse {
    let registry = ListenerRegistry {
        repo: repo.get_ref(),
    };
    let outcome = registry.register_batch(&data).await;
    match outcome.status() {
        BatchStatus::Complete => {
            let routes: Vec<_> = outcome.routes().into_iter().cloned().collect();
            statsd.gauge(&LogKey::ListenersCreate, routes.len());
            HttpResponse::Created().json(routes)
        }
        BatchStatus::Partial => {
            error_and_incr!(
                statsd,
                LogKey::ListenersCreatePartial,
                flow_id = data.flow_id.as_str(),
                failed = ?outcome.failed_events(),
                "Some listeners could not be created"
            );
            HttpResponse::InternalServerError().json(outcome.report())
        }
        BatchStatus::Failed => {
            error_and_incr!(
                statsd,
                LogKey::ListenersCreateFailed,
                flow_id = data.flow_id.as_str(),
                "No listeners could be created"
            );
            HttpResponse::InternalServerError().json(outcome.report())
        }
    }
}

pub async fn delete(
    query: web::Query<DeleteListeners>,
    repo: web::Data<dyn EventRouteRepository>,
    statsd: web::Data<StatsD>,
) -> HttpResponse {
    let registry = ListenerRegistry {
        repo: repo.get_ref(),
    };
    match registry.delete_listeners(&query).await {
        Ok(deleted) => {
            info_and_incr!(
                statsd,
                LogKey::ListenersDelete,
                project_id = query.project_id.as_str(),
                flow_id = query.flow_id.as_str(),
                deleted = deleted,
                "Deleted listeners"
            );
            HttpResponse::Ok().json(DeleteResponse { deleted })
        }
        Err(e) => {
            error_and_incr!(
                statsd,
                LogKey::ListenersDeleteFailed,
                error = e,
                flow_id = query.flow_id.as_str(),
                "Could not delete listeners"
            );
            HttpResponse::InternalServerError().finish()
        }
    }
}
