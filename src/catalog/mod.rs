//! One-shot catalog importer.
//!
//! Fetches the creature list from the upstream content API, maps each
//! record to a catalog entry, and inserts it into the fish table. Runs at
//! startup before the server accepts requests, and only when the catalog
//! is still empty. No retry; the first constraint violation aborts the
//! load, so a partial load is possible on failure.

use serde::Deserialize;
use tracing::info;

use crate::db::DbPool;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to fetch creature list from upstream API")]
    Fetch(#[from] reqwest::Error),

    #[error("Upstream API returned {0}")]
    Status(reqwest::StatusCode),

    #[error("Failed to insert catalog entry")]
    Insert(#[from] sqlx::Error),
}

/// A creature record mapped to the local catalog shape.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    pub icon_url: String,
    pub catchphrase: Option<String>,
}

/// Raw upstream record. Only the fields we map are deserialized.
#[derive(Debug, Deserialize)]
struct UpstreamFish {
    name: UpstreamName,
    icon_uri: String,
    #[serde(rename = "catch-phrase")]
    catch_phrase: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamName {
    #[serde(rename = "name-USen")]
    name_usen: String,
}

impl From<UpstreamFish> for CatalogEntry {
    fn from(raw: UpstreamFish) -> Self {
        Self {
            name: raw.name.name_usen,
            icon_url: raw.icon_uri,
            catchphrase: raw.catch_phrase,
        }
    }
}

/// Client for the upstream creature API.
pub struct CatalogClient {
    base_url: String,
    client: reqwest::Client,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the full fish list. Single page, no retry.
    pub async fn fetch_fish(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let url = format!("{}/fish", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header("User-Agent", "Creel")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CatalogError::Status(response.status()));
        }

        let raw: Vec<UpstreamFish> = response.json().await?;
        Ok(raw.into_iter().map(CatalogEntry::from).collect())
    }
}

/// Insert catalog entries row by row. Not wrapped in a transaction: a
/// duplicate name or icon URL fails the load at the point of conflict.
pub async fn seed_entries(pool: &DbPool, entries: &[CatalogEntry]) -> Result<(), CatalogError> {
    for entry in entries {
        sqlx::query("INSERT INTO fish (name, icon_url, catchphrase) VALUES (?, ?, ?)")
            .bind(&entry.name)
            .bind(&entry.icon_url)
            .bind(&entry.catchphrase)
            .execute(pool)
            .await?;
    }
    Ok(())
}

/// Populate the fish catalog if it is empty. Idempotent across restarts:
/// a non-empty catalog skips the fetch entirely.
pub async fn load_catalog(pool: &DbPool, client: &CatalogClient) -> Result<(), CatalogError> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM fish")
        .fetch_one(pool)
        .await?;

    if existing > 0 {
        info!("Fish catalog already has {} entries, skipping seed", existing);
        return Ok(());
    }

    let entries = client.fetch_fish().await?;
    seed_entries(pool, &entries).await?;

    info!("Seeded fish catalog with {} entries", entries.len());
    Ok(())
}
