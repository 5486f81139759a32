//! Contact and destination client views.
//!
//! Only the attributes the engine consults are modelled; the owning domain
//! objects live elsewhere.

use serde::{Deserialize, Serialize};

/// The contact about to be sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Contact {
    /// Unique identifier for the contact
    pub id: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub zipcode: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Contact {
    /// Create a contact with only an id set.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Set the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the phone number.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Set the mobile number.
    pub fn with_mobile(mut self, mobile: impl Into<String>) -> Self {
        self.mobile = Some(mobile.into());
        self
    }

    /// Trimmed email, or `None` when blank.
    pub fn trimmed_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

/// A category a destination client belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
}

/// The destination a contact would be sent to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactClient {
    /// Unique identifier for the client
    pub id: i64,

    /// Optional category shared with other clients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl ContactClient {
    /// Create a client without a category.
    pub fn new(id: i64) -> Self {
        Self { id, category: None }
    }

    /// Attach a category.
    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category = Some(Category { id: category_id });
        self
    }

    /// The category id, if there is a non-zero one.
    pub fn category_id(&self) -> Option<i64> {
        self.category.map(|c| c.id).filter(|id| *id != 0)
    }
}
