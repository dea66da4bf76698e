//! crates/alumni_quest_core/src/routing.rs
//!
//! Which screen a user may see, decided from their profile alone.

use crate::domain::UserProfile;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppRoute {
    SignIn,
    AuthCallback,
    CompleteProfile,
    Home,
    Directory,
    Quests,
    Leaderboard,
    Profile,
    ConnectionQuest,
    GroupChallenge,
    QuestMode,
}

impl AppRoute {
    pub fn path(self) -> &'static str {
        match self {
            AppRoute::SignIn => "/auth",
            AppRoute::AuthCallback => "/auth/callback",
            AppRoute::CompleteProfile => "/auth/complete-profile",
            AppRoute::Home => "/(tabs)",
            AppRoute::Directory => "/(tabs)/directory",
            AppRoute::Quests => "/(tabs)/quests",
            AppRoute::Leaderboard => "/(tabs)/leaderboard",
            AppRoute::Profile => "/(tabs)/profile",
            AppRoute::ConnectionQuest => "/(modals)/connection-quest",
            AppRoute::GroupChallenge => "/(modals)/group-challenge",
            AppRoute::QuestMode => "/(modals)/quest-mode",
        }
    }

    /// Routes under `/auth`, reachable without a complete profile.
    pub fn is_auth_group(self) -> bool {
        matches!(
            self,
            AppRoute::SignIn | AppRoute::AuthCallback | AppRoute::CompleteProfile
        )
    }
}

impl FromStr for AppRoute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            AppRoute::SignIn,
            AppRoute::AuthCallback,
            AppRoute::CompleteProfile,
            AppRoute::Home,
            AppRoute::Directory,
            AppRoute::Quests,
            AppRoute::Leaderboard,
            AppRoute::Profile,
            AppRoute::ConnectionQuest,
            AppRoute::GroupChallenge,
            AppRoute::QuestMode,
        ]
        .into_iter()
        .find(|r| r.path() == s)
        .ok_or_else(|| format!("unknown route '{}'", s))
    }
}

/// The route to show when `user` asks for `requested`.
///
/// Signed-out users are sent to sign-in, users without a name to profile
/// completion, and signed-in complete users are kept out of the auth screens.
pub fn allowed_route(user: Option<&UserProfile>, requested: AppRoute) -> AppRoute {
    match user {
        None if requested.is_auth_group() => requested,
        None => AppRoute::SignIn,
        Some(u) if !u.is_complete() => AppRoute::CompleteProfile,
        Some(_) if requested.is_auth_group() => AppRoute::Home,
        Some(_) => requested,
    }
}
