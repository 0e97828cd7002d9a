//! Password hashing and bearer-token issuance.
//!
//! Passwords are stored as salted argon2 PHC strings. Sessions are stateless
//! JWTs (HS256) signed with a per-install secret that is generated on first
//! boot and persisted in the `settings` table, so tokens survive restarts.

use anyhow::{Context as _, Result};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::storage::Storage;

const SECRET_SETTING_KEY: &str = "jwt_secret";

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash a password into a PHC string (random salt, argon2id defaults).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC string.
pub fn verify_password(password: &str, phc: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

/// JWT claims carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// `"student"` or `"counselor"` — checked by role-gated routes.
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Outcome of token verification, separating "expired" from "garbage" so the
/// REST layer can return distinct error codes.
#[derive(Debug)]
pub enum TokenError {
    Expired,
    Invalid,
}

/// Signs and verifies bearer tokens with the per-install HS256 secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_hours: u64,
}

impl TokenSigner {
    /// Load the signing secret from the `settings` table, generating and
    /// persisting one on first boot (UUID v4 hex — 128 bits of entropy).
    pub async fn get_or_create(storage: &Storage, ttl_hours: u64) -> Result<Self> {
        let secret = match storage.get_setting(SECRET_SETTING_KEY).await? {
            Some(s) if !s.is_empty() => s,
            _ => {
                let s = format!(
                    "{}{}",
                    uuid::Uuid::new_v4().simple(),
                    uuid::Uuid::new_v4().simple()
                );
                storage
                    .set_setting(SECRET_SETTING_KEY, &s)
                    .await
                    .context("failed to persist signing secret")?;
                s
            }
        };
        Ok(Self::from_secret(&secret, ttl_hours))
    }

    pub fn from_secret(secret: &str, ttl_hours: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_hours,
        }
    }

    /// Issue a token for the given user, expiring `ttl_hours` from now.
    pub fn issue(&self, user_id: &str, role: &str) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            iat: now,
            exp: now + (self.ttl_hours as i64) * 3600,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("failed to sign token")
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> std::result::Result<Claims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Invalid),
            },
        }
    }
}
