#![allow(dead_code)]

use alumni_quest_core::domain::{LeaderboardEntry, Peer, Prompt, UserProfile};
use alumni_quest_core::ports::{DatabaseService, PortError, PortResult, PromptGenerationService};
use alumni_quest_core::profile::ValidProfile;
use api_lib::config::{Config, PromptSourceConfig};
use api_lib::web::state::AppState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SECRET: &str = "test-proof-secret";

pub fn peer(id: &str, name: &str, company: &str, industry: &str) -> Peer {
    Peer {
        id: id.to_string(),
        name: name.to_string(),
        photo: format!("https://photos.example/{}.jpg", id),
        title: "Product Manager".to_string(),
        company: company.to_string(),
        batch: "2020".to_string(),
        industry: industry.to_string(),
        looking: Some("Co-founders".to_string()),
        offering: None,
    }
}

pub fn user(id: &str, name: &str, batch: &str, industry: &str, points: i64) -> UserProfile {
    UserProfile {
        name: name.to_string(),
        title: "Analyst".to_string(),
        company: "Acme".to_string(),
        batch: batch.to_string(),
        industry: industry.to_string(),
        photo: format!("https://photos.example/{}.jpg", id),
        points,
        ..UserProfile::blank(id)
    }
}

/// An in-memory stand-in for the Postgres adapter.
#[derive(Default)]
pub struct InMemoryDb {
    pub peers: Mutex<Vec<Peer>>,
    pub users: Mutex<HashMap<String, UserProfile>>,
    pub sessions: Mutex<HashMap<String, String>>,
    pub users_unavailable: bool,
}

impl InMemoryDb {
    pub fn with_session(self, token: &str, user_id: &str) -> Self {
        self.sessions
            .lock()
            .unwrap()
            .insert(token.to_string(), user_id.to_string());
        self
    }

    pub fn with_peer(self, peer: Peer) -> Self {
        self.peers.lock().unwrap().push(peer);
        self
    }

    pub fn with_user(self, user: UserProfile) -> Self {
        self.users.lock().unwrap().insert(user.id.clone(), user);
        self
    }

    /// Makes every user lookup fail as if the database were down.
    pub fn with_users_unavailable(mut self) -> Self {
        self.users_unavailable = true;
        self
    }
}

#[async_trait]
impl DatabaseService for InMemoryDb {
    async fn get_peer_by_id(&self, peer_id: &str) -> PortResult<Peer> {
        self.peers
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == peer_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(peer_id.to_string()))
    }

    async fn list_peers(&self) -> PortResult<Vec<Peer>> {
        Ok(self.peers.lock().unwrap().clone())
    }

    async fn find_user(&self, user_id: &str) -> PortResult<Option<UserProfile>> {
        if self.users_unavailable {
            return Err(PortError::Unexpected("connection refused".to_string()));
        }
        Ok(self.users.lock().unwrap().get(user_id).cloned())
    }

    async fn insert_user(&self, user: &UserProfile) -> PortResult<UserProfile> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.id) {
            return Err(PortError::Conflict(user.id.clone()));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user.clone())
    }

    async fn update_profile(&self, user_id: &str, profile: &ValidProfile) -> PortResult<UserProfile> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| PortError::NotFound(user_id.to_string()))?;
        user.name = profile.name.clone();
        user.title = profile.title.clone();
        user.company = profile.company.clone();
        user.batch = profile.batch.clone();
        user.industry = profile.industry.clone();
        user.photo = profile.photo.clone();
        user.looking_for = profile.looking_for.clone();
        user.offering = profile.offering.clone();
        if profile.phone.is_some() {
            user.phone = profile.phone.clone();
        }
        Ok(user.clone())
    }

    async fn validate_auth_session(&self, token: &str) -> PortResult<String> {
        self.sessions
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or(PortError::Unauthorized)
    }

    async fn list_leaderboard(&self) -> PortResult<Vec<LeaderboardEntry>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.is_complete())
            .map(|u| LeaderboardEntry {
                user_id: u.id.clone(),
                name: u.name.clone(),
                photo: u.photo.clone(),
                batch: u.batch.clone(),
                industry: u.industry.clone(),
                points: u.points,
            })
            .collect())
    }
}

pub enum StubGenerator {
    Succeed(Vec<Prompt>),
    Fail,
    Hang,
}

#[async_trait]
impl PromptGenerationService for StubGenerator {
    async fn generate_prompts(&self, _peer: &Peer) -> PortResult<Vec<Prompt>> {
        match self {
            StubGenerator::Succeed(prompts) => Ok(prompts.clone()),
            StubGenerator::Fail => Err(PortError::Unexpected("HTTP 500".to_string())),
            StubGenerator::Hang => std::future::pending().await,
        }
    }
}

pub fn config(proof_secret: Option<&str>) -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        log_level: tracing::Level::INFO,
        cors_origin: "http://localhost:8081".to_string(),
        prompt_source: PromptSourceConfig::EdgeFunction {
            backend_url: "http://backend.invalid".to_string(),
            anon_key: "anon".to_string(),
        },
        prompt_timeout: Duration::from_secs(8),
        settlement_delay: Duration::from_millis(1500),
        proof_secret: proof_secret.map(str::to_string),
        proof_ttl: Duration::from_secs(600),
        bootstrap_max_attempts: 3,
        bootstrap_backoff: Duration::from_millis(10),
    }
}

pub fn app_state(db: InMemoryDb, generator: StubGenerator, proof_secret: Option<&str>) -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(db),
        Arc::new(generator),
        Arc::new(config(proof_secret)),
    ))
}
