use lib::{
    appconfig::{connect_to_database_and_migrate, run_server},
    info,
    models::event_routes::{EventRouteModel, EventRouteRepository},
    settings::get_settings,
    telemetry::{init_sentry, init_tracing, LogKey, StatsD},
};
use std::{net::TcpListener, sync::Arc};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let settings = get_settings();

    init_tracing("event-routing-web", &settings.log_level, std::io::stdout);
    let _guard = init_sentry(&settings);

    let addr = settings.server_address();
    let db_pool = connect_to_database_and_migrate(&settings.database_url).await;
    let routes: Arc<dyn EventRouteRepository> = Arc::new(EventRouteModel { db_pool });
    let statsd = StatsD::new(&settings);
    info!(LogKey::ServerInit, "Server running at http://{}", addr);
    run_server(settings, TcpListener::bind(addr)?, routes, statsd)?.await?;

    Ok(())
}
