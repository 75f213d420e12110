use actix_web::{web, HttpResponse, Responder};

use crate::config::WaitlistSettings;
use crate::store::WaitlistStore;

#[derive(serde::Serialize)]
pub struct WaitlistCountResponse {
    pub count: i64,
}

/// Externally reported waitlist size: live count from whichever store is
/// reachable plus the fixed historical offset. Infallible; an unreachable
/// store contributes zero.
pub fn aggregate_count(live_count: i64, historical_offset: i64) -> i64 {
    live_count + historical_offset
}

#[tracing::instrument(name = "Waitlist count handler", skip(store, settings))]
pub async fn handle_waitlist_count(
    store: web::Data<WaitlistStore>,
    settings: web::Data<WaitlistSettings>,
) -> impl Responder {
    let count = aggregate_count(store.count().await, settings.historical_offset);

    HttpResponse::Ok().json(WaitlistCountResponse { count })
}
