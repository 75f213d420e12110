pub mod mirror;
pub mod primary;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::signup::{Signup, SourceMetadata};
use crate::domain::waitlist_email::WaitlistEmail;
use crate::store::mirror::MirrorEntry;

/// Gateway over the two backing stores. The relational store is authoritative;
/// the key-value mirror is best-effort and may lag or be absent entirely.
/// Either store can be unconfigured, which degrades it to "unavailable".
pub struct WaitlistStore {
    primary: Option<PgPool>,
    mirror: Option<redis::Client>,
}

#[derive(Debug, Clone, Copy)]
pub struct WriteOutcome {
    pub primary_stored: bool,
    pub mirror_stored: bool,
}

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("This email is already on the waitlist.")]
    DuplicateEmail,
    #[error("No backing store is available.")]
    Unavailable,
    #[error("Primary store operation failed.")]
    Primary(#[source] sqlx::Error),
    #[error("Secondary store operation failed.")]
    Mirror(#[source] redis::RedisError),
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)
    }
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub migrated_count: u64,
    pub error_count: u64,
    pub total_attempted: u64,
}

impl WaitlistStore {
    pub fn new(primary: Option<PgPool>, mirror: Option<redis::Client>) -> WaitlistStore {
        if primary.is_none() {
            tracing::warn!("Primary store is not configured; running on the mirror only");
        }

        WaitlistStore { primary, mirror }
    }

    /// Dedup read path: the system of record when reachable, else the mirror.
    /// Fails open — a store error reports "does not exist" so admission stays
    /// available; the unique index backstops duplicates that slip through.
    pub async fn exists(&self, email: &WaitlistEmail) -> bool {
        if let Some(pool) = &self.primary {
            match primary::signup_exists(pool, email).await {
                Ok(exists) => return exists,
                Err(err) => {
                    tracing::warn!("Primary dedup check failed, trying the mirror: {:?}", err);
                }
            }
        }

        if let Some(client) = &self.mirror {
            match mirror::email_in_mirror(client, email).await {
                Ok(exists) => return exists,
                Err(err) => {
                    tracing::warn!("Mirror dedup check failed, failing open: {:?}", err);
                }
            }
        }

        false
    }

    /// Writes the signup. With a primary configured, the primary write decides
    /// the outcome and the mirror write is attempted afterwards, its failure
    /// logged and swallowed. Without a primary, a mirror-only write is the
    /// outcome. A unique-index violation surfaces as `DuplicateEmail`.
    pub async fn write(&self, signup: &Signup) -> Result<WriteOutcome, StoreError> {
        if let Some(pool) = &self.primary {
            primary::insert_signup(pool, signup).await.map_err(|err| {
                if primary::is_unique_violation(&err) {
                    StoreError::DuplicateEmail
                } else {
                    tracing::error!("Primary store write failed: {:?}", err);
                    StoreError::Primary(err)
                }
            })?;

            let mirror_stored = self.mirror_best_effort(signup).await;

            return Ok(WriteOutcome {
                primary_stored: true,
                mirror_stored,
            });
        }

        if let Some(client) = &self.mirror {
            let added = mirror::mirror_signup(client, signup).await.map_err(|err| {
                tracing::error!("Mirror-only write failed: {:?}", err);
                StoreError::Mirror(err)
            })?;

            if !added {
                return Err(StoreError::DuplicateEmail);
            }

            return Ok(WriteOutcome {
                primary_stored: false,
                mirror_stored: true,
            });
        }

        Err(StoreError::Unavailable)
    }

    async fn mirror_best_effort(&self, signup: &Signup) -> bool {
        let Some(client) = &self.mirror else {
            return false;
        };

        match mirror::mirror_signup(client, signup).await {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!("Mirror write failed after a primary write: {:?}", err);
                false
            }
        }
    }

    /// Live waitlist size from a single store, never blended: the primary
    /// count when reachable, else the mirror set cardinality, else zero.
    pub async fn count(&self) -> i64 {
        if let Some(pool) = &self.primary {
            match primary::count_signups(pool).await {
                Ok(count) => return count,
                Err(err) => {
                    tracing::warn!("Primary count failed, trying the mirror: {:?}", err);
                }
            }
        }

        if let Some(client) = &self.mirror {
            match mirror::set_cardinality(client).await {
                Ok(count) => return count,
                Err(err) => {
                    tracing::warn!("Mirror count failed, reporting zero: {:?}", err);
                }
            }
        }

        0
    }

    /// Admin read path; primary only, newest first.
    pub async fn list_all(&self) -> Result<Vec<Signup>, StoreError> {
        let pool = self.primary.as_ref().ok_or(StoreError::Unavailable)?;

        primary::fetch_all_signups(pool).await.map_err(StoreError::Primary)
    }

    /// One-shot reconciliation: replays every mirror entry into the primary
    /// store, skipping entries that are malformed, missing their attribute
    /// hash, or already present. Validation and classification are not re-run;
    /// mirror entries were admitted through the pipeline originally.
    #[tracing::instrument(name = "Migrate mirror entries into the primary store", skip(self))]
    pub async fn migrate_mirror_to_primary(&self) -> Result<MigrationReport, StoreError> {
        let client = self.mirror.as_ref().ok_or(StoreError::Unavailable)?;
        let pool = self.primary.as_ref().ok_or(StoreError::Unavailable)?;

        let entries = mirror::fetch_all_entries(client)
            .await
            .map_err(StoreError::Mirror)?;

        let mut report = MigrationReport {
            total_attempted: entries.len() as u64,
            ..MigrationReport::default()
        };

        for entry in entries {
            let Some(signup) = signup_from_mirror_entry(&entry) else {
                tracing::info!("Skipping mirror entry for {}: malformed or no details", entry.email);
                continue;
            };

            match primary::signup_exists(pool, &signup.email).await {
                Ok(true) => {
                    tracing::info!("{} already exists in the primary store, skipping", entry.email);
                    continue;
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::error!("Existence check failed for {}: {:?}", entry.email, err);
                    report.error_count += 1;
                    continue;
                }
            }

            match primary::insert_signup(pool, &signup).await {
                Ok(()) => report.migrated_count += 1,
                Err(err) if primary::is_unique_violation(&err) => {
                    // Lost the race against a concurrent admission; already there.
                    tracing::info!("{} was inserted concurrently, skipping", entry.email);
                }
                Err(err) => {
                    tracing::error!("Failed to migrate {}: {:?}", entry.email, err);
                    report.error_count += 1;
                }
            }
        }

        Ok(report)
    }
}

fn signup_from_mirror_entry(entry: &MirrorEntry) -> Option<Signup> {
    if entry.fields.is_empty() {
        return None;
    }

    let email = WaitlistEmail::parse(entry.email.clone()).ok()?;
    let email_domain = email.domain()?.to_string();

    let created_at = entry
        .fields
        .get("joined_at")
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    Some(Signup {
        id: Uuid::new_v4(),
        name: entry.fields.get("name").filter(|name| !name.is_empty()).cloned(),
        email,
        university: entry
            .fields
            .get("university")
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string()),
        is_priority_email: entry.fields.get("is_priority_email").map(String::as_str)
            == Some("true"),
        email_domain,
        created_at,
        source: SourceMetadata::default(),
    })
}
