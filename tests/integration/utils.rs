use fake::{Fake, StringFaker};
use lib::appconfig::{connect_to_database_and_migrate, run_server};
use lib::models::{event_routes::EventRouteRepository, memory::InMemoryEventRoutes};
use lib::settings::{get_settings, Settings};
use lib::telemetry::{init_tracing, StatsD};
use once_cell::sync::Lazy;
use serde_json::Value;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::net::TcpListener;
use std::sync::Arc;
use uuid::Uuid;

// Set TEST_LOG to see server logs while running the tests.
static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        init_tracing("event-routing", "info", std::io::stdout);
    } else {
        init_tracing("event-routing", "info", std::io::sink);
    };
});

pub const TEST_PASSWORD: &str = "a password";

pub struct TestApp {
    pub settings: Settings,
    pub routes: Arc<InMemoryEventRoutes>,
}

impl TestApp {
    pub fn build_url(&self, path: &str) -> String {
        format!("http://{}{}", self.settings.server_address(), path)
    }
}

fn test_settings() -> Settings {
    Settings {
        host: "127.0.0.1".to_string(),
        port: "0".to_string(),
        authentication: TEST_PASSWORD.to_string(),
        database_url: "postgres://unused".to_string(),
        environment: "test".to_string(),
        log_level: "info".to_string(),
        sentry_dsn: "".to_string(),
        statsd_host: "127.0.0.1".to_string(),
        statsd_port: 8125,
    }
}

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let mut settings = test_settings();
    let listener =
        TcpListener::bind(format!("{}:0", settings.host)).expect("Failed to bind random port");
    let port = listener.local_addr().expect("No local address").port();
    let routes = Arc::new(InMemoryEventRoutes::new());
    let repo: Arc<dyn EventRouteRepository> = routes.clone();
    let server = run_server(settings.clone(), listener, repo, StatsD::nop())
        .expect("Failed to start server");
    let _ = tokio::spawn(server);
    settings.port = format!("{}", port);
    TestApp { settings, routes }
}

async fn create_test_database(database_url: &str) -> String {
    let randomized_test_database_url = format!("{}_test_{}", database_url, Uuid::new_v4());
    let database_name = randomized_test_database_url
        .rsplit('/')
        .next()
        .expect("Database url has no name")
        .to_string();
    let mut connection = PgConnection::connect(database_url)
        .await
        .expect("Failed to connect to postgres.");
    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, &database_name).as_str())
        .await
        .expect("Failed to create test database.");
    randomized_test_database_url
}

pub async fn get_test_db_pool() -> PgPool {
    let settings = get_settings();
    let test_database_url = create_test_database(&settings.database_url).await;
    connect_to_database_and_migrate(&test_database_url).await
}

pub fn random_simple_ascii_string() -> String {
    const ASCII: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ._-";
    let f = StringFaker::with(Vec::from(ASCII), 8..90);
    f.fake()
}

pub async fn send_get_request(app: &TestApp, path: &str) -> reqwest::Response {
    let path = app.build_url(path);
    reqwest::get(&path).await.expect("Failed to GET")
}

pub async fn send_post_request(
    app: &TestApp,
    path: &str,
    data: Value,
    password: Option<&str>,
) -> reqwest::Response {
    let client = reqwest::Client::new();
    let mut request = client.post(app.build_url(path)).json(&data);
    if let Some(password) = password {
        request = request.basic_auth("user", Some(password));
    }
    request.send().await.expect("Failed to POST")
}

pub async fn send_delete_request(
    app: &TestApp,
    path: &str,
    password: Option<&str>,
) -> reqwest::Response {
    let client = reqwest::Client::new();
    let mut request = client.delete(app.build_url(path));
    if let Some(password) = password {
        request = request.basic_auth("user", Some(password));
    }
    request.send().await.expect("Failed to DELETE")
}

pub async fn send_put_request(app: &TestApp, path: &str, data: Value) -> reqwest::Response {
    let client = reqwest::Client::new();
    client
        .put(app.build_url(path))
        .json(&data)
        .send()
        .await
        .expect("Failed to PUT")
}
