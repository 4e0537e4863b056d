use crate::error::OrderError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Contact details gathered while talking to a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSession {
    pub session_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub collected_at: DateTime<Utc>,
}

impl CustomerSession {
    /// Starts a session. At least one contact field must be non-blank.
    pub fn start(
        name: Option<String>,
        email: Option<String>,
        phone: Option<String>,
    ) -> Result<Self, OrderError> {
        let name = non_blank(name);
        let email = non_blank(email);
        let phone = non_blank(phone);
        if name.is_none() && email.is_none() && phone.is_none() {
            return Err(OrderError::ValidationError(
                "Provide at least a name, email or phone".to_string(),
            ));
        }
        Ok(Self {
            session_id: Uuid::new_v4(),
            name,
            email,
            phone,
            collected_at: Utc::now(),
        })
    }

    /// Identifier stored on orders: the email when known, else the name.
    pub fn customer_identifier(&self) -> Option<&str> {
        customer_identifier(self.name.as_deref(), self.email.as_deref())
    }
}

pub fn customer_identifier<'a>(name: Option<&'a str>, email: Option<&'a str>) -> Option<&'a str> {
    email
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .or_else(|| name.map(str::trim).filter(|n| !n.is_empty()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
