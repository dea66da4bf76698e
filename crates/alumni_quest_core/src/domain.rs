//! crates/alumni_quest_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};

/// Photo used when a user completes their profile without uploading one.
pub const DEFAULT_PROFILE_PHOTO: &str =
    "https://images.pexels.com/photos/220453/pexels-photo-220453.jpeg";

/// Another alumnus in the directory, targetable for a connection quest.
/// Read-only from the flow's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub id: String,
    pub name: String,
    pub photo: String,
    pub title: String,
    pub company: String,
    pub batch: String,
    pub industry: String,
    pub looking: Option<String>,
    pub offering: Option<String>,
}

/// A question offered to the user to ask their peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub id: String,
    pub text: String,
    pub point_value: u32,
}

impl Prompt {
    pub fn new(id: impl Into<String>, text: impl Into<String>, point_value: u32) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            point_value,
        }
    }
}

// The `users` row. Created blank at bootstrap, filled in by profile completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: String,
    pub title: String,
    pub company: String,
    pub batch: String,
    pub industry: String,
    pub photo: String,
    pub looking_for: Option<String>,
    pub offering: Option<String>,
    pub points: i64,
}

impl UserProfile {
    /// The row inserted the first time a signed-in user is seen.
    pub fn blank(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            phone: None,
            name: String::new(),
            title: String::new(),
            company: String::new(),
            batch: String::new(),
            industry: String::new(),
            photo: String::new(),
            looking_for: None,
            offering: None,
            points: 0,
        }
    }

    /// A profile counts as complete once the user has given a name.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// One row of the leaderboard projection, as read from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub name: String,
    pub photo: String,
    pub batch: String,
    pub industry: String,
    pub points: i64,
}

/// A member of a group challenge team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeMember {
    pub id: String,
    pub name: String,
    pub photo: String,
}

/// A timed team challenge, e.g. a group photo at a venue.
#[derive(Debug, Clone)]
pub struct GroupChallenge {
    pub id: String,
    pub team_name: String,
    pub challenge: String,
    pub description: String,
    pub points: u32,
    pub members: Vec<ChallengeMember>,
    pub expires_at: DateTime<Utc>,
}
