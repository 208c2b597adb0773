//! Fish catalog model.
//!
//! Rows are reference data: seeded once by the catalog loader and shared
//! by every user. The struct doubles as the JSON view, so its shape must
//! stay round-trip stable.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Fish {
    pub id: i64,
    pub name: String,
    pub icon_url: String,
    pub catchphrase: Option<String>,
}
