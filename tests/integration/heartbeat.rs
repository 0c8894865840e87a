use crate::integration::utils::{send_get_request, spawn_app};

#[tokio::test]
async fn test_heartbeats_get() {
    let app = spawn_app().await;
    let test_cases = vec!["/__heartbeat__", "/__lbheartbeat__"];
    for path in test_cases {
        let r = send_get_request(&app, path).await;
        assert_eq!(r.status(), 200, "Failed on path: {}", path);
        assert_eq!(r.text().await.expect("Response body missing."), "OK");
    }
}
