use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use reqwest::StatusCode;

use crate::config::WaitlistSettings;
use crate::domain::classification::{Classification, ClassificationError, EmailType};
use crate::domain::new_signup::{NewSignup, SignupBody, SignupValidationError};
use crate::domain::signup::{Signup, SourceMetadata};
use crate::email_client::EmailClient;
use crate::routes::count::aggregate_count;
use crate::store::{StoreError, WaitlistStore};

/// Uniform response envelope for the waitlist form. Rejections reuse the same
/// shape with `success: false` and no count.
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinWaitlistResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_type: Option<String>,
}

impl JoinWaitlistResponse {
    fn admitted(message: String, count: i64, email_type: EmailType) -> JoinWaitlistResponse {
        JoinWaitlistResponse {
            success: true,
            message,
            count: Some(count),
            email_type: Some(email_type.as_ref().to_string()),
        }
    }

    fn rejected(message: String) -> JoinWaitlistResponse {
        JoinWaitlistResponse {
            success: false,
            message,
            count: None,
            email_type: None,
        }
    }
}

#[derive(thiserror::Error)]
pub enum JoinWaitlistError {
    #[error(transparent)]
    Validation(#[from] SignupValidationError),
    // Unreachable after validation, kept for values that bypass it.
    #[error("Please enter a valid email address")]
    Malformed(#[from] ClassificationError),
    #[error("This email is already on the waitlist.")]
    DuplicateEmail,
    // The underlying cause is logged at the store boundary, never exposed.
    #[error("An unexpected error occurred. Please try again.")]
    Persistence(#[source] StoreError),
}

impl std::fmt::Debug for JoinWaitlistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)
    }
}

impl ResponseError for JoinWaitlistError {
    fn status_code(&self) -> StatusCode {
        match self {
            JoinWaitlistError::Validation(_) => StatusCode::BAD_REQUEST,
            JoinWaitlistError::Malformed(_) => StatusCode::BAD_REQUEST,
            JoinWaitlistError::DuplicateEmail => StatusCode::CONFLICT,
            JoinWaitlistError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(JoinWaitlistResponse::rejected(self.to_string()))
    }
}

/// Admission pipeline for one submission: validate, classify, dedup-check,
/// persist, recount, respond, then notify the registrant off the request path.
#[tracing::instrument(
    name = "Joining the waitlist handler",
    skip(body, request, store, email_client, settings),
    fields(
        signup_email = tracing::field::Empty,
        signup_university = tracing::field::Empty
    )
)]
pub async fn handle_join_waitlist(
    body: web::Json<SignupBody>,
    request: HttpRequest,
    store: web::Data<WaitlistStore>,
    email_client: web::Data<EmailClient>,
    settings: web::Data<WaitlistSettings>,
) -> Result<HttpResponse, JoinWaitlistError> {
    let new_signup = NewSignup::parse(body.into_inner(), &settings)?;

    tracing::Span::current()
        .record("signup_email", &tracing::field::display(new_signup.email.as_ref()))
        .record(
            "signup_university",
            &tracing::field::display(&new_signup.university),
        );

    let classification = Classification::derive(&new_signup.email, &settings)?;

    // Best-effort short circuit with a friendly error; the unique index on
    // email is the authoritative duplicate enforcement.
    if store.exists(&new_signup.email).await {
        return Err(JoinWaitlistError::DuplicateEmail);
    }

    let signup = Signup::admit(new_signup, &classification, source_metadata(&request));

    store.write(&signup).await.map_err(|err| match err {
        StoreError::DuplicateEmail => JoinWaitlistError::DuplicateEmail,
        other => JoinWaitlistError::Persistence(other),
    })?;

    let count = aggregate_count(store.count().await, settings.historical_offset);
    let email_type = classification.email_type();

    send_welcome_email(&email_client, &signup, email_type);

    Ok(HttpResponse::Ok().json(JoinWaitlistResponse::admitted(
        admission_message(email_type),
        count,
        email_type,
    )))
}

fn admission_message(email_type: EmailType) -> String {
    match email_type {
        EmailType::Priority => {
            "Welcome! You've been added to our priority list as a university student.".to_string()
        }
        _ => "You've been added to the waitlist! Check your email for confirmation.".to_string(),
    }
}

/// Fire-and-forget: the welcome email runs as a detached task so its outcome
/// never changes the response already produced for the caller. At most once,
/// no retry.
fn send_welcome_email(email_client: &web::Data<EmailClient>, signup: &Signup, email_type: EmailType) {
    let email_client = email_client.clone();
    let recipient = signup.email.clone();
    let html_body = welcome_email_html(email_type);

    tokio::spawn(async move {
        if let Err(err) = email_client
            .send_email(recipient.clone(), "Welcome to the waitlist!", &html_body)
            .await
        {
            tracing::warn!(
                "Failed to send a welcome email to {}: {:?}",
                recipient.as_ref(),
                err
            );
        }
    });
}

fn welcome_email_html(email_type: EmailType) -> String {
    let note = match email_type {
        EmailType::Priority => "As a university student you are on our priority list.",
        _ => "We will let you know as soon as a spot opens up.",
    };

    format!(
        r#"
            <div>
                <h1>You're on the waitlist!</h1>
                <p>{}</p>
            </div>
        "#,
        note
    )
}

fn source_metadata(request: &HttpRequest) -> SourceMetadata {
    SourceMetadata {
        ip_address: request
            .connection_info()
            .realip_remote_addr()
            .map(str::to_string),
        user_agent: header_value(request, header::USER_AGENT.as_str()),
        referrer: header_value(request, header::REFERER.as_str()),
    }
}

fn header_value(request: &HttpRequest, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
