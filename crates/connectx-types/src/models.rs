use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Users --

/// Embedded view of another user inside a response. Which optional fields
/// are filled depends on the endpoint (author of a post carries a headline,
/// a comment author does not).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub college: Option<String>,
}

impl UserRef {
    /// Stand-in for a reference whose user has been deleted.
    pub fn unknown(id: Uuid) -> Self {
        Self {
            id,
            name: "Unknown user".to_string(),
            avatar: String::new(),
            headline: None,
            college: None,
        }
    }
}

/// A user record as returned by search, suggestions and profile updates:
/// relations stay as raw ids, the password hash is never present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
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

/// Full profile view with every relation expanded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub headline: String,
    pub bio: String,
    pub skills: Vec<String>,
    pub college: String,
    pub location: String,
    pub year: String,
    pub connections: Vec<UserRef>,
    pub followers: Vec<UserRef>,
    pub following: Vec<UserRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Connections --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Rejected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Pending => write!(f, "pending"),
            ConnectionStatus::Accepted => write!(f, "accepted"),
            ConnectionStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for ConnectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ConnectionStatus::Pending),
            "accepted" => Ok(ConnectionStatus::Accepted),
            "rejected" => Ok(ConnectionStatus::Rejected),
            _ => Err(format!("unknown connection status: {s}")),
        }
    }
}

/// A connection request. `R` is the requester representation: a bare id
/// for freshly created/accepted rows, a [`UserRef`] in the pending list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<R = Uuid> {
    pub id: Uuid,
    pub requester: R,
    pub recipient: Uuid,
    pub status: ConnectionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where the caller stands with another user. A rejected request reads as
/// `NotConnected` so either side may ask again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    NotConnected,
    Pending,
    Connected,
}

// -- Posts --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub user: UserRef,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub author: UserRef,
    pub content: String,
    pub image: String,
    pub hashtags: Vec<String>,
    pub likes: Vec<Uuid>,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Messages --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub sender: UserRef,
    pub recipient: UserRef,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Latest message exchanged with one counterpart. `id` is the counterpart's
/// user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub last_message: Message,
}

// -- Matching --

/// A candidate ranked against the caller's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub user_id: Uuid,
    pub name: String,
    pub avatar: String,
    pub college: String,
    pub year: String,
    pub skills: Vec<String>,
    pub bio: String,
    pub location: String,
    pub match_percentage: u8,
}

// -- Opportunities --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpportunityKind {
    Hackathon,
    Project,
    Job,
    Internship,
    Other,
}

impl fmt::Display for OpportunityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OpportunityKind::Hackathon => "hackathon",
            OpportunityKind::Project => "project",
            OpportunityKind::Job => "job",
            OpportunityKind::Internship => "internship",
            OpportunityKind::Other => "other",
        };
        f.write_str(s)
    }
}

impl FromStr for OpportunityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hackathon" => Ok(OpportunityKind::Hackathon),
            "project" => Ok(OpportunityKind::Project),
            "job" => Ok(OpportunityKind::Job),
            "internship" => Ok(OpportunityKind::Internship),
            "other" => Ok(OpportunityKind::Other),
            _ => Err(format!(
                "'{s}' is not a valid opportunity type (hackathon, project, job, internship, other)"
            )),
        }
    }
}

/// An opportunity listing. `A` is the applicant representation: ids in the
/// list view, expanded users in the detail view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity<A = Uuid> {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: OpportunityKind,
    pub company: String,
    pub location: String,
    pub tags: Vec<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub applicants: Vec<A>,
    pub created_by: UserRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
