use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Component A — Template store (§3, §4.A). `body` is valid Jinja-style
/// template source; the renderer's grammar is validated at write time.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub staff_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplate {
    pub name: String,
    pub subject: String,
    pub body: String,
    pub staff_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTemplate {
    pub name: String,
    pub subject: String,
    pub body: String,
}
