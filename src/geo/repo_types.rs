use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// One recorded lookup. Field names on the wire follow the web client.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SearchHistoryEntry {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub ip_address: String,
    pub geo_info: String, // provider JSON, serialized
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
