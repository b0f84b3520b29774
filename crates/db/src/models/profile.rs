//! Talent profile model. Profile sections are free-form JSON documents.

use casting_core::types::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A profile row from the `profiles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Profile {
    pub id: EntityId,
    pub user_id: EntityId,
    pub basic_info: serde_json::Value,
    pub appearance: serde_json::Value,
    pub sizes: serde_json::Value,
    pub details: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a profile. Omitted sections default to `{}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProfile {
    pub user_id: EntityId,
    pub basic_info: Option<serde_json::Value>,
    pub appearance: Option<serde_json::Value>,
    pub sizes: Option<serde_json::Value>,
    pub details: Option<serde_json::Value>,
}
