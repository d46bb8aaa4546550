//! Authentication Service
//!
//! Handles registration, password login and JWT access tokens.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtSettings;
use crate::domain::{User, UserRepository};
use crate::infrastructure::database::UnitOfWork;
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Authentication service trait for dependency injection
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new user
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, AuthTokens), AuthError>;

    /// Authenticate user with credentials
    async fn authenticate(&self, username: &str, password: &str) -> Result<AuthTokens, AuthError>;

    /// Validate access token and extract user ID
    fn validate_token(&self, access_token: &str) -> Result<i64, AuthError>;
}

/// Authentication tokens response
#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    /// JWT ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Email already exists")]
    EmailExists,

    #[error("Username already exists")]
    UsernameExists,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => {
                AppError::Unauthorized("Invalid username or password".into())
            }
            AuthError::TokenExpired => AppError::Unauthorized("Token expired".into()),
            AuthError::InvalidToken => AppError::Unauthorized("Invalid token".into()),
            AuthError::EmailExists => AppError::Conflict("Email already exists".into()),
            AuthError::UsernameExists => AppError::Conflict("Username already exists".into()),
            AuthError::Internal(msg) => AppError::Internal(msg),
            AuthError::Repository(e) => e,
        }
    }
}

/// Decode and validate an access token signed with `secret`.
pub fn decode_access_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// AuthService implementation
pub struct AuthServiceImpl<U, W>
where
    U: UserRepository,
    W: UnitOfWork,
{
    user_repo: Arc<U>,
    uow: Arc<W>,
    id_generator: Arc<SnowflakeGenerator>,
    jwt_settings: JwtSettings,
}

impl<U, W> AuthServiceImpl<U, W>
where
    U: UserRepository,
    W: UnitOfWork,
{
    /// Create a new AuthServiceImpl
    pub fn new(
        user_repo: Arc<U>,
        uow: Arc<W>,
        id_generator: Arc<SnowflakeGenerator>,
        jwt_settings: JwtSettings,
    ) -> Self {
        Self {
            user_repo,
            uow,
            id_generator,
            jwt_settings,
        }
    }

    /// Generate a signed access token
    fn generate_tokens(&self, user_id: i64) -> Result<AuthTokens, AuthError> {
        let now = Utc::now();
        let expiry = now + Duration::minutes(self.jwt_settings.access_token_expiry_minutes);

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiry.timestamp(),
            iat: now.timestamp(),
            jti: Some(uuid::Uuid::new_v4().to_string()),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_settings.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(AuthTokens {
            access_token,
            expires_in: self.jwt_settings.access_token_expiry_minutes * 60,
            token_type: "Bearer".to_string(),
        })
    }
}

#[async_trait]
impl<U, W> AuthService for AuthServiceImpl<U, W>
where
    U: UserRepository + 'static,
    W: UnitOfWork + 'static,
{
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, AuthTokens), AuthError> {
        if self.user_repo.username_exists(username).await? {
            return Err(AuthError::UsernameExists);
        }
        if self.user_repo.email_exists(email).await? {
            return Err(AuthError::EmailExists);
        }

        let user = User {
            id: self.id_generator.generate(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            ..User::default()
        };

        let mut tx = self.uow.begin().await?;
        let created = self.user_repo.create(&mut tx, &user).await?;
        self.uow.commit(tx).await?;

        tracing::info!(user_id = created.id, username = %created.username, "User registered");

        let tokens = self.generate_tokens(created.id)?;
        Ok((created, tokens))
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<AuthTokens, AuthError> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            tracing::debug!(user_id = user.id, "Password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        self.generate_tokens(user.id)
    }

    fn validate_token(&self, access_token: &str) -> Result<i64, AuthError> {
        decode_access_token(access_token, &self.jwt_settings.secret)?.user_id()
    }
}
