//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use alumni_quest_core::domain::{LeaderboardEntry, Peer, UserProfile};
use alumni_quest_core::ports::{DatabaseService, PortError, PortResult};
use alumni_quest_core::profile::ValidProfile;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

const USER_COLUMNS: &str = "id, email, phone, name, title, company, batch, industry, photo, looking_for, offering, points";

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct PeerRecord {
    id: String,
    name: String,
    photo: String,
    title: String,
    company: String,
    batch: String,
    industry: String,
    looking: Option<String>,
    offering: Option<String>,
}
impl PeerRecord {
    fn to_domain(self) -> Peer {
        Peer {
            id: self.id,
            name: self.name,
            photo: self.photo,
            title: self.title,
            company: self.company,
            batch: self.batch,
            industry: self.industry,
            looking: self.looking,
            offering: self.offering,
        }
    }
}

#[derive(FromRow)]
struct UserRecord {
    id: String,
    email: Option<String>,
    phone: Option<String>,
    name: String,
    title: String,
    company: String,
    batch: String,
    industry: String,
    photo: String,
    looking_for: Option<String>,
    offering: Option<String>,
    points: i64,
}
impl UserRecord {
    fn to_domain(self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email,
            phone: self.phone,
            name: self.name,
            title: self.title,
            company: self.company,
            batch: self.batch,
            industry: self.industry,
            photo: self.photo,
            looking_for: self.looking_for,
            offering: self.offering,
            points: self.points,
        }
    }
}

#[derive(FromRow)]
struct LeaderboardRecord {
    id: String,
    name: String,
    photo: String,
    batch: String,
    industry: String,
    points: i64,
}
impl LeaderboardRecord {
    fn to_domain(self) -> LeaderboardEntry {
        LeaderboardEntry {
            user_id: self.id,
            name: self.name,
            photo: self.photo,
            batch: self.batch,
            industry: self.industry,
            points: self.points,
        }
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn get_peer_by_id(&self, peer_id: &str) -> PortResult<Peer> {
        let record = sqlx::query_as::<_, PeerRecord>(
            "SELECT id, name, photo, title, company, batch, industry, looking, offering FROM all_connections WHERE id = $1",
        )
        .bind(peer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Connection {} not found", peer_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn list_peers(&self) -> PortResult<Vec<Peer>> {
        let records = sqlx::query_as::<_, PeerRecord>(
            "SELECT id, name, photo, title, company, batch, industry, looking, offering FROM all_connections ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn find_user(&self, user_id: &str) -> PortResult<Option<UserProfile>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn insert_user(&self, user: &UserProfile) -> PortResult<UserProfile> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (id, email, phone, name, title, company, batch, industry, photo, points) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.name)
        .bind(&user.title)
        .bind(&user.company)
        .bind(&user.batch)
        .bind(&user.industry)
        .bind(&user.photo)
        .bind(user.points)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                PortError::Conflict(format!("User {} already exists", user.id))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn update_profile(&self, user_id: &str, profile: &ValidProfile) -> PortResult<UserProfile> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET name = $2, title = $3, company = $4, batch = $5, industry = $6, \
             photo = $7, looking_for = $8, offering = $9, phone = COALESCE($10, phone) \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(&profile.name)
        .bind(&profile.title)
        .bind(&profile.company)
        .bind(&profile.batch)
        .bind(&profile.industry)
        .bind(&profile.photo)
        .bind(&profile.looking_for)
        .bind(&profile.offering)
        .bind(&profile.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn validate_auth_session(&self, token: &str) -> PortResult<String> {
        let user_id: Option<String> = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        user_id.ok_or(PortError::Unauthorized)
    }

    async fn list_leaderboard(&self) -> PortResult<Vec<LeaderboardEntry>> {
        let records = sqlx::query_as::<_, LeaderboardRecord>(
            "SELECT id, name, photo, batch, industry, points FROM users WHERE name <> '' ORDER BY points DESC, name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
