use sqlx::{postgres::PgRow, PgPool, Row};

use crate::domain::signup::{Signup, SourceMetadata};
use crate::domain::waitlist_email::WaitlistEmail;

/// Postgres error code raised when the unique index on email is violated.
const UNIQUE_VIOLATION: &str = "23505";

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

#[tracing::instrument(name = "Insert a signup into the primary store", skip(pool, signup))]
pub async fn insert_signup(pool: &PgPool, signup: &Signup) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO waitlist_signups
            (id, name, email, university, is_priority_email, email_domain, created_at,
             ip_address, user_agent, referrer)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(signup.id)
    .bind(signup.name.as_deref())
    .bind(signup.email.as_ref())
    .bind(&signup.university)
    .bind(signup.is_priority_email)
    .bind(&signup.email_domain)
    .bind(signup.created_at)
    .bind(signup.source.ip_address.as_deref())
    .bind(signup.source.user_agent.as_deref())
    .bind(signup.source.referrer.as_deref())
    .execute(pool)
    .await?;

    Ok(())
}

#[tracing::instrument(name = "Check whether an email exists in the primary store", skip(pool))]
pub async fn signup_exists(pool: &PgPool, email: &WaitlistEmail) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT 1 FROM waitlist_signups WHERE email = $1")
        .bind(email.as_ref())
        .fetch_optional(pool)
        .await?;

    Ok(row.is_some())
}

#[tracing::instrument(name = "Count signups in the primary store", skip(pool))]
pub async fn count_signups(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) AS total FROM waitlist_signups")
        .fetch_one(pool)
        .await?;

    Ok(row.get("total"))
}

#[tracing::instrument(name = "Fetch all signups from the primary store", skip(pool))]
pub async fn fetch_all_signups(pool: &PgPool) -> Result<Vec<Signup>, sqlx::Error> {
    sqlx::query(
        r#"
        SELECT id, name, email, university, is_priority_email, email_domain, created_at,
               ip_address, user_agent, referrer
        FROM waitlist_signups
        ORDER BY created_at DESC
        "#,
    )
    .map(|row: PgRow| Signup {
        id: row.get("id"),
        name: row.get("name"),
        email: WaitlistEmail::parse(row.get("email")).unwrap(),
        university: row.get("university"),
        is_priority_email: row.get("is_priority_email"),
        email_domain: row.get("email_domain"),
        created_at: row.get("created_at"),
        source: SourceMetadata {
            ip_address: row.get("ip_address"),
            user_agent: row.get("user_agent"),
            referrer: row.get("referrer"),
        },
    })
    .fetch_all(pool)
    .await
}
