use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A user document. Owned by the auth side of the application; the alert
/// and digest jobs only read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub country: Option<String>,
}

impl User {
    /// The email address, if one is set and non-blank.
    pub fn contact_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: ObjectId,
    pub email: String,
    pub name: String,
}

impl From<User> for CurrentUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email.unwrap_or_default(),
            name: u.name.unwrap_or_default(),
        }
    }
}
