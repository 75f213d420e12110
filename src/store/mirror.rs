use std::collections::HashMap;

use crate::domain::signup::Signup;
use crate::domain::waitlist_email::WaitlistEmail;

// Key layout of the mirror: a set of normalized emails, a per-email hash with
// the signup attributes, and a monotonically incremented counter.
const EMAILS_SET_KEY: &str = "waitlist_emails";
const COUNT_KEY: &str = "waitlist_count";

fn user_key(email: &str) -> String {
    format!("waitlist_user:{}", email)
}

/// A raw mirror record: the set member plus whatever attributes the hash holds.
#[derive(Debug)]
pub struct MirrorEntry {
    pub email: String,
    pub fields: HashMap<String, String>,
}

/// Adds the signup to the mirror. Returns false when the email was already a
/// member of the set, in which case the hash and counter are left untouched.
#[tracing::instrument(name = "Mirror a signup into the secondary store", skip(client, signup))]
pub async fn mirror_signup(client: &redis::Client, signup: &Signup) -> Result<bool, redis::RedisError> {
    let mut conn = client.get_tokio_connection().await?;

    let added: i64 = redis::cmd("SADD")
        .arg(EMAILS_SET_KEY)
        .arg(signup.email.as_ref())
        .query_async(&mut conn)
        .await?;

    if added == 0 {
        return Ok(false);
    }

    let _: i64 = redis::cmd("HSET")
        .arg(user_key(signup.email.as_ref()))
        .arg("name")
        .arg(signup.name.as_deref().unwrap_or_default())
        .arg("university")
        .arg(&signup.university)
        .arg("is_priority_email")
        .arg(signup.is_priority_email.to_string())
        .arg("joined_at")
        .arg(signup.created_at.to_rfc3339())
        .query_async(&mut conn)
        .await?;

    let _: i64 = redis::cmd("INCR")
        .arg(COUNT_KEY)
        .query_async(&mut conn)
        .await?;

    Ok(true)
}

#[tracing::instrument(name = "Check whether an email exists in the secondary store", skip(client))]
pub async fn email_in_mirror(
    client: &redis::Client,
    email: &WaitlistEmail,
) -> Result<bool, redis::RedisError> {
    let mut conn = client.get_tokio_connection().await?;

    redis::cmd("SISMEMBER")
        .arg(EMAILS_SET_KEY)
        .arg(email.as_ref())
        .query_async(&mut conn)
        .await
}

#[tracing::instrument(name = "Count emails in the secondary store", skip(client))]
pub async fn set_cardinality(client: &redis::Client) -> Result<i64, redis::RedisError> {
    let mut conn = client.get_tokio_connection().await?;

    redis::cmd("SCARD")
        .arg(EMAILS_SET_KEY)
        .query_async(&mut conn)
        .await
}

/// Reads every email in the mirror set together with its attribute hash. Used
/// only by the one-shot migration into the primary store.
#[tracing::instrument(name = "Fetch all entries from the secondary store", skip(client))]
pub async fn fetch_all_entries(
    client: &redis::Client,
) -> Result<Vec<MirrorEntry>, redis::RedisError> {
    let mut conn = client.get_tokio_connection().await?;

    let emails: Vec<String> = redis::cmd("SMEMBERS")
        .arg(EMAILS_SET_KEY)
        .query_async(&mut conn)
        .await?;

    let mut entries = Vec::with_capacity(emails.len());

    for email in emails {
        let fields: HashMap<String, String> = redis::cmd("HGETALL")
            .arg(user_key(&email))
            .query_async(&mut conn)
            .await?;

        entries.push(MirrorEntry { email, fields });
    }

    Ok(entries)
}
