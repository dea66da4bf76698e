//! crates/alumni_quest_core/src/challenge.rs
//!
//! Group challenge flow: a team completes a task together (e.g. a group photo)
//! and every member confirms before points are awarded.

use crate::domain::GroupChallenge;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeStage {
    Details,
    Upload,
    Verification,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChallengeError {
    #[error("This action is not available at the {0:?} stage")]
    WrongStage(ChallengeStage),
    #[error("{0} is not a member of this team")]
    UnknownMember(String),
    #[error("A photo is required")]
    MissingPhoto,
    #[error("The challenge has expired")]
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Pending { verified: usize, total: usize },
    /// Emitted once, by the verification that completes the team.
    Completed { points: u32 },
    AlreadyVerified,
}

#[derive(Debug, Clone)]
pub struct ChallengeSession {
    challenge: GroupChallenge,
    stage: ChallengeStage,
    photo_url: Option<String>,
    verified: BTreeSet<String>,
}

impl ChallengeSession {
    /// The current user counts as verified from the start.
    pub fn new(challenge: GroupChallenge, current_user_id: &str) -> Self {
        let mut verified = BTreeSet::new();
        if challenge.members.iter().any(|m| m.id == current_user_id) {
            verified.insert(current_user_id.to_string());
        }
        Self {
            challenge,
            stage: ChallengeStage::Details,
            photo_url: None,
            verified,
        }
    }

    pub fn stage(&self) -> ChallengeStage {
        self.stage
    }

    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }

    pub fn is_verified(&self, member_id: &str) -> bool {
        self.verified.contains(member_id)
    }

    pub fn upload_photo(&mut self, url: impl Into<String>, now: DateTime<Utc>) -> Result<(), ChallengeError> {
        self.require(ChallengeStage::Details)?;
        if now >= self.challenge.expires_at {
            return Err(ChallengeError::Expired);
        }
        let url = url.into();
        if url.trim().is_empty() {
            return Err(ChallengeError::MissingPhoto);
        }
        self.photo_url = Some(url);
        self.stage = ChallengeStage::Upload;
        Ok(())
    }

    /// Moves to verification. A team whose members are all verified already
    /// (the current user alone) completes here.
    pub fn begin_verification(&mut self) -> Result<VerifyOutcome, ChallengeError> {
        self.require(ChallengeStage::Upload)?;
        self.stage = ChallengeStage::Verification;
        Ok(self.progress())
    }

    pub fn verify_member(&mut self, member_id: &str) -> Result<VerifyOutcome, ChallengeError> {
        self.require(ChallengeStage::Verification)?;
        if !self.challenge.members.iter().any(|m| m.id == member_id) {
            return Err(ChallengeError::UnknownMember(member_id.to_string()));
        }
        if !self.verified.insert(member_id.to_string()) {
            return Ok(VerifyOutcome::AlreadyVerified);
        }
        Ok(self.progress())
    }

    fn progress(&mut self) -> VerifyOutcome {
        let total = self.challenge.members.len();
        if self.verified.len() == total {
            self.stage = ChallengeStage::Completed;
            VerifyOutcome::Completed {
                points: self.challenge.points,
            }
        } else {
            VerifyOutcome::Pending {
                verified: self.verified.len(),
                total,
            }
        }
    }

    pub fn time_remaining(&self, now: DateTime<Utc>) -> String {
        format_time_remaining(self.challenge.expires_at, now)
    }

    fn require(&self, stage: ChallengeStage) -> Result<(), ChallengeError> {
        if self.stage == stage {
            Ok(())
        } else {
            Err(ChallengeError::WrongStage(self.stage))
        }
    }
}

/// `"{h}h {m}m"` with at least an hour left, `"{m}m"` otherwise.
pub fn format_time_remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (expires_at - now).num_minutes().max(0);
    let hours = minutes / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}
