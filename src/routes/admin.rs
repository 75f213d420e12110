use actix_web::{web, HttpResponse, ResponseError};
use reqwest::StatusCode;

use crate::domain::signup::Signup;
use crate::store::{StoreError, WaitlistStore};

#[derive(serde::Serialize)]
pub struct SignupListResponse {
    pub success: bool,
    pub signups: Vec<Signup>,
}

#[derive(thiserror::Error)]
pub enum AdminError {
    #[error("The backing store is not available.")]
    StoreUnavailable,
    #[error("Failed to read from the backing store.")]
    Store(#[source] StoreError),
}

impl std::fmt::Debug for AdminError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)
    }
}

impl ResponseError for AdminError {
    fn status_code(&self) -> StatusCode {
        match self {
            AdminError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AdminError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "message": self.to_string(),
        }))
    }
}

impl From<StoreError> for AdminError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable => AdminError::StoreUnavailable,
            other => AdminError::Store(other),
        }
    }
}

/// Read-only projection for the admin dashboard, newest signup first.
#[tracing::instrument(name = "Listing all signups handler", skip(store))]
pub async fn handle_list_signups(
    store: web::Data<WaitlistStore>,
) -> Result<HttpResponse, AdminError> {
    let signups = store.list_all().await?;

    Ok(HttpResponse::Ok().json(SignupListResponse {
        success: true,
        signups,
    }))
}

/// One-shot reconciliation of the mirror into the primary store.
#[tracing::instrument(name = "Mirror migration handler", skip(store))]
pub async fn handle_migrate_mirror(
    store: web::Data<WaitlistStore>,
) -> Result<HttpResponse, AdminError> {
    let report = store.migrate_mirror_to_primary().await?;

    tracing::info!(
        "Migration completed: {} migrated, {} errors out of {}",
        report.migrated_count,
        report.error_count,
        report.total_attempted
    );

    Ok(HttpResponse::Ok().json(report))
}
