use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared_types::{AppError, UserRole};
use uuid::Uuid;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Account id; doubles as the profile id.
    pub sub: Uuid,
    #[serde(default)]
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn user_role(&self) -> UserRole {
        UserRole::from_str_or_default(&self.role)
    }

    pub fn can_moderate(&self) -> bool {
        self.user_role().can_moderate()
    }
}

/// Signing secret shared with the identity provider.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Keys from `JWT_SECRET`.
    pub fn from_env() -> Result<Self, AppError> {
        let secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::internal("JWT_SECRET must be set"))?;
        Ok(Self::new(secret.as_bytes()))
    }
}

/// Issue an access token. Production tokens come from the identity
/// provider; this is used by tooling and tests.
pub fn create_access_token(
    keys: &JwtKeys,
    user_id: Uuid,
    role: UserRole,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        role: role.as_str().to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    encode(&Header::default(), &claims, &keys.encoding)
}

/// Validate signature and expiry.
pub fn validate_access_token(
    keys: &JwtKeys,
    token: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(token, &keys.decoding, &Validation::default()).map(|data| data.claims)
}
