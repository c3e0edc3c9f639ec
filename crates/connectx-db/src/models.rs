//! Database row types. These are the stored documents; connectx-types holds
//! the expanded API views built from them.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_AVATAR: &str = "https://via.placeholder.com/150";
pub const DEFAULT_LOCATION: &str = "Remote";

/// Current time at the precision the store keeps, so a freshly built row
/// serializes the same as it will after a read.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
    pub avatar: String,
    pub headline: String,
    pub bio: String,
    pub skills: Vec<String>,
    pub college: String,
    pub location: String,
    pub year: String,
    pub connections: Vec<Uuid>,
    pub followers: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// A fresh account with every profile field at its default.
    pub fn new(name: &str, email: &str, password_hash: &str) -> Self {
        let created = now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password: password_hash.to_string(),
            avatar: DEFAULT_AVATAR.to_string(),
            headline: String::new(),
            bio: String::new(),
            skills: Vec::new(),
            college: String::new(),
            location: String::new(),
            year: String::new(),
            connections: Vec::new(),
            followers: Vec::new(),
            following: Vec::new(),
            created_at: created,
            updated_at: created,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionRow {
    pub id: Uuid,
    pub requester: Uuid,
    pub recipient: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comments are embedded in their post's `comments` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentDoc {
    pub id: Uuid,
    pub user: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: Uuid,
    pub author: Uuid,
    pub content: String,
    pub image: String,
    pub hashtags: Vec<String>,
    pub likes: Vec<Uuid>,
    pub comments: Vec<CommentDoc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: Uuid,
    pub sender: Uuid,
    pub recipient: Uuid,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OpportunityRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub kind: String,
    pub company: String,
    pub location: String,
    pub tags: Vec<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub applicants: Vec<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
