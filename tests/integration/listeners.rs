use crate::integration::utils::{
    send_delete_request, send_get_request, send_post_request, send_put_request, spawn_app,
    TEST_PASSWORD,
};
use lib::models::event_routes::EventRoute;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn create_body(events: &[&str], flow_id: &str) -> Value {
    json!({
        "app_name": "crm",
        "events": events,
        "identifier_value": "42",
        "flow_id": flow_id,
        "project_id": "P1",
    })
}

#[tokio::test]
async fn test_create_then_list_listeners() {
    let app = spawn_app().await;
    let r = send_post_request(
        &app,
        "/listeners",
        create_body(&["person.created", "deal.won"], "F1"),
        Some(TEST_PASSWORD),
    )
    .await;
    assert_eq!(r.status(), 201);
    let created: Vec<EventRoute> = r.json().await.expect("Failed to parse created routes");
    assert_eq!(created.len(), 2);
    assert_eq!(app.routes.len(), 2);

    let r = send_get_request(
        &app,
        "/listeners?app_name=crm&event=person.created&identifier_value=42",
    )
    .await;
    assert_eq!(r.status(), 200);
    let listed: Vec<EventRoute> = r.json().await.expect("Failed to parse listed routes");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].flow_id, "F1");
    assert_eq!(listed[0].project_id, "P1");
}

#[tokio::test]
async fn test_list_unknown_trigger_is_empty() {
    let app = spawn_app().await;
    let r = send_get_request(
        &app,
        "/listeners?app_name=crm&event=person.deleted&identifier_value=42",
    )
    .await;
    assert_eq!(r.status(), 200);
    let listed: Vec<EventRoute> = r.json().await.expect("Failed to parse listed routes");
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_list_requires_every_parameter() {
    let app = spawn_app().await;
    let r = send_get_request(&app, "/listeners?app_name=crm&event=person.created").await;
    assert_eq!(r.status(), 400);
}

#[tokio::test]
async fn test_create_overwrites_flow_for_same_trigger() {
    let app = spawn_app().await;
    for flow_id in ["F1", "F2"] {
        let r = send_post_request(
            &app,
            "/listeners",
            create_body(&["person.created"], flow_id),
            Some(TEST_PASSWORD),
        )
        .await;
        assert_eq!(r.status(), 201);
    }
    assert_eq!(app.routes.len(), 1);
    let r = send_get_request(
        &app,
        "/listeners?app_name=crm&event=person.created&identifier_value=42",
    )
    .await;
    let listed: Vec<EventRoute> = r.json().await.expect("Failed to parse listed routes");
    assert_eq!(listed[0].flow_id, "F2");
}

#[tokio::test]
async fn test_delete_listeners_for_a_flow() {
    let app = spawn_app().await;
    send_post_request(
        &app,
        "/listeners",
        create_body(&["a", "b"], "F1"),
        Some(TEST_PASSWORD),
    )
    .await;
    let r = send_delete_request(&app, "/listeners?project_id=P1&flow_id=F1", Some(TEST_PASSWORD))
        .await;
    assert_eq!(r.status(), 200);
    let body: Value = r.json().await.expect("Failed to parse delete response");
    assert_eq!(body, json!({"deleted": 2}));
    assert!(app.routes.is_empty());

    // Nothing left, still a success
    let r = send_delete_request(&app, "/listeners?project_id=P1&flow_id=F1", Some(TEST_PASSWORD))
        .await;
    assert_eq!(r.status(), 200);
    let body: Value = r.json().await.expect("Failed to parse delete response");
    assert_eq!(body, json!({"deleted": 0}));
}

#[tokio::test]
async fn test_mutating_routes_need_the_password() {
    let app = spawn_app().await;
    let test_cases = vec![None, Some("wrong password")];
    for password in test_cases {
        let r = send_post_request(&app, "/listeners", create_body(&["a"], "F1"), password).await;
        assert_eq!(r.status(), 401, "POST with {:?}", password);
        let r = send_delete_request(&app, "/listeners?project_id=P1&flow_id=F1", password).await;
        assert_eq!(r.status(), 401, "DELETE with {:?}", password);
    }
    assert!(app.routes.is_empty());
}

#[tokio::test]
async fn test_unsupported_method_is_not_allowed() {
    let app = spawn_app().await;
    let r = send_put_request(&app, "/listeners", create_body(&["a"], "F1")).await;
    assert_eq!(r.status(), 405);
    assert!(app.routes.is_empty());
}
