use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// The slice of an organization the API attaches to events and profiles.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSummary {
    pub id: Uuid,
    pub name: String,
    pub logo_url: Option<String>,
}
