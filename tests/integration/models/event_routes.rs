use crate::integration::utils::{get_test_db_pool, random_simple_ascii_string};
use lib::models::event_routes::{
    EventRoute, EventRouteModel, EventRouteRepository, RouteFilter, StoreError, UpsertOutcome,
};
use lib::registry::ROUTE_CONFLICT_KEY;
use pretty_assertions::assert_eq;

fn make_fake_route(flow_id: &str) -> EventRoute {
    EventRoute::new(
        "crm",
        "person.created",
        &random_simple_ascii_string(),
        flow_id,
        "P1",
    )
}

#[tokio::test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_event_route_model_upsert_inserts_then_updates() {
    let model = EventRouteModel {
        db_pool: get_test_db_pool().await,
    };
    let route = make_fake_route("F1");
    let outcome = model
        .upsert(&route, &ROUTE_CONFLICT_KEY)
        .await
        .expect("Failed to upsert.");
    assert_eq!(outcome, UpsertOutcome::Inserted(route.clone()));

    let mut moved = route.clone();
    moved.id = uuid::Uuid::new_v4();
    moved.flow_id = "F2".to_string();
    match model
        .upsert(&moved, &ROUTE_CONFLICT_KEY)
        .await
        .expect("Failed to upsert.")
    {
        UpsertOutcome::Updated(stored) => {
            assert_eq!(stored.id, route.id);
            assert_eq!(stored.flow_id, "F2");
        }
        other => panic!("Expected an update, got {:?}", other),
    }
    let stored = model
        .fetch_one_by_id(&route.id)
        .await
        .expect("Could not fetch from DB.");
    assert_eq!(stored.flow_id, "F2");
}

#[tokio::test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_event_route_model_concurrent_upserts_leave_one_row() {
    let model = EventRouteModel {
        db_pool: get_test_db_pool().await,
    };
    let route = make_fake_route("F0");
    let attempts: Vec<EventRoute> = (0..8)
        .map(|i| {
            let mut r = route.clone();
            r.id = uuid::Uuid::new_v4();
            r.flow_id = format!("F{}", i);
            r
        })
        .collect();
    let results = futures::future::join_all(
        attempts
            .iter()
            .map(|r| model.upsert(r, &ROUTE_CONFLICT_KEY)),
    )
    .await;
    assert!(results.iter().all(|r| r.is_ok()));
    let found = model
        .find_by(&RouteFilter {
            identifier_value: Some(route.identifier_value.clone()),
            ..Default::default()
        })
        .await
        .expect("Failed to find.");
    assert_eq!(found.len(), 1);
}

#[tokio::test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_event_route_model_delete_is_scoped() {
    let model = EventRouteModel {
        db_pool: get_test_db_pool().await,
    };
    let keep = make_fake_route("F1");
    let mut other_project = make_fake_route("F1");
    other_project.project_id = "P2".to_string();
    for route in [&keep, &other_project] {
        model
            .upsert(route, &ROUTE_CONFLICT_KEY)
            .await
            .expect("Failed to upsert.");
    }
    let deleted = model
        .delete(&RouteFilter {
            project_id: Some("P2".to_string()),
            flow_id: Some("F1".to_string()),
            ..Default::default()
        })
        .await
        .expect("Failed to delete.");
    assert_eq!(deleted, 1);
    model
        .fetch_one_by_id(&keep.id)
        .await
        .expect("Route in other project should remain.");

    let result = model.delete(&RouteFilter::default()).await;
    assert!(matches!(result, Err(StoreError::EmptyCriteria)));
}
