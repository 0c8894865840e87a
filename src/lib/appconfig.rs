use actix_web::{
    dev::{Server, ServiceRequest},
    error::ErrorUnauthorized,
    web::{delete, get, post, resource, Data},
    App, Error, HttpServer,
};
use actix_web_httpauth::extractors::basic::BasicAuth;
use actix_web_httpauth::middleware::HttpAuthentication;
use sqlx::{migrate, postgres::PgPoolOptions, PgPool};
use std::{net::TcpListener, sync::Arc, time::Duration};
use tracing_actix_web_mozlog::MozLog;

use crate::{
    controllers, models::event_routes::EventRouteRepository, settings::Settings, telemetry::StatsD,
};

async fn basic_auth_middleware(
    req: ServiceRequest,
    credentials: BasicAuth,
) -> Result<ServiceRequest, Error> {
    // Intentional expect. Can't go on without them.
    let settings = req.app_data::<Data<Settings>>().expect("Missing settings");
    let password = match credentials.password() {
        Some(password) => password,
        None => return Err(ErrorUnauthorized("Password missing.")),
    };
    if password.eq(&settings.authentication) {
        Ok(req)
    } else {
        Err(ErrorUnauthorized("Incorrect password."))
    }
}

pub fn run_server(
    settings: Settings,
    listener: TcpListener,
    routes: Arc<dyn EventRouteRepository>,
    statsd: StatsD,
) -> Result<Server, std::io::Error> {
    let routes: Data<dyn EventRouteRepository> = Data::from(routes);
    let statsd = Data::new(statsd);
    let settings = Data::new(settings);
    let server = HttpServer::new(move || {
        let moz_log = MozLog::default();
        App::new()
            .wrap(moz_log)
            .wrap(sentry_actix::Sentry::new())
            // Custodial
            .service(resource("/__heartbeat__").route(get().to(controllers::custodial::heartbeat)))
            .service(
                resource("/__lbheartbeat__").route(get().to(controllers::custodial::heartbeat)),
            )
            // Listeners. Reads are open, writes need basic auth.
            .service(
                resource("/listeners")
                    .route(get().to(controllers::listeners::list))
                    .route(
                        post()
                            .to(controllers::listeners::create)
                            .wrap(HttpAuthentication::basic(basic_auth_middleware)),
                    )
                    .route(
                        delete()
                            .to(controllers::listeners::delete)
                            .wrap(HttpAuthentication::basic(basic_auth_middleware)),
                    ),
            )
            .app_data(routes.clone())
            .app_data(statsd.clone())
            .app_data(settings.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}

pub async fn connect_to_database_and_migrate(database_url: &str) -> PgPool {
    let connection_pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .expect("Failed to connect to Postgres.");
    migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate database.");
    connection_pool
}
