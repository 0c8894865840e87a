use actix_web::{Error, HttpResponse};

/*
 * Custodial Helpers
 * -----------------
 * Load balancer and uptime checks
 */

pub async fn heartbeat() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().body("OK"))
}
