use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Row backing the mock auth collaborator (§1, §6: "the mock auth service"
/// is out of core scope but specified at the interface). Mirrors
/// `original_source/src/schemas/auth_service.py::UserData`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

impl Subscriber {
    /// Render context contribution: `UserData.fields ∪ unit.context` (§4.J
    /// step 4c).
    pub fn as_context(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "email": self.email,
            "first_name": self.first_name,
            "last_name": self.last_name,
            "birth_date": self.birth_date,
            "phone": self.phone,
            "avatar": self.avatar,
        })
    }
}
