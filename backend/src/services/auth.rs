//! Authentication service for login and token management

use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared::UserRole;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub email: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
}

/// Authenticated user summary returned with tokens
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserSummary,
}

/// User info from database
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    role: String,
    is_active: bool,
}

impl UserRow {
    fn summary(&self) -> AppResult<UserSummary> {
        let role = self
            .role
            .parse::<UserRole>()
            .map_err(|_| AppError::Internal(format!("Unknown role '{}'", self.role)))?;
        Ok(UserSummary {
            id: self.id,
            email: self.email.clone(),
            role,
        })
    }
}

/// Issues and validates signed access tokens
#[derive(Clone)]
pub struct TokenService {
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            jwt_secret: config.secret.clone(),
            access_token_expiry: config.access_token_expiry,
            refresh_token_expiry: config.refresh_token_expiry,
        }
    }

    /// Validate access token and return claims
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })
    }

    /// Generate access and refresh tokens
    fn generate_tokens(&self, user: UserSummary) -> AppResult<AuthTokens> {
        let now = Utc::now();
        let access_exp = now + Duration::seconds(self.access_token_expiry);

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            exp: access_exp.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(AuthTokens {
            access_token,
            refresh_token: Uuid::new_v4().to_string(),
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
            user,
        })
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    tokens: TokenService,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, tokens: TokenService) -> Self {
        Self { db, tokens }
    }

    /// Authenticate user with email and password
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthTokens> {
        let email = input.email.trim().to_lowercase();

        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, role, is_active
            FROM users
            WHERE LOWER(email) = $1
            "#,
        )
        .bind(&email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AppError::Unauthorized {
                message: "Account is disabled".to_string(),
                message_es: "La cuenta está desactivada".to_string(),
            });
        }

        let valid = verify(&input.password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let tokens = self.tokens.generate_tokens(user.summary()?)?;
        self.store_refresh_token(user.id, &tokens.refresh_token).await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(tokens)
    }

    /// Exchange a refresh token for a new pair; the old one is revoked.
    /// Revocation and lookup are one statement, so a token redeems once.
    pub async fn refresh_token(&self, input: RefreshInput) -> AppResult<AuthTokens> {
        let invalid = || AppError::Unauthorized {
            message: "Invalid or expired refresh token".to_string(),
            message_es: "Token de actualización inválido o expirado".to_string(),
        };

        let user_id = sqlx::query_scalar::<_, Uuid>(REDEEM_REFRESH_TOKEN)
            .bind(hash_token(&input.refresh_token))
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(invalid)?;

        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, role, is_active
            FROM users
            WHERE id = $1 AND is_active = true
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(invalid)?;

        let tokens = self.tokens.generate_tokens(user.summary()?)?;
        self.store_refresh_token(user.id, &tokens.refresh_token).await?;

        Ok(tokens)
    }

    /// Store refresh token in database
    async fn store_refresh_token(&self, user_id: Uuid, token: &str) -> AppResult<()> {
        let expires_at = Utc::now() + Duration::seconds(self.tokens.refresh_token_expiry);

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(hash_token(token))
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

const REDEEM_REFRESH_TOKEN: &str = r#"
    UPDATE refresh_tokens
    SET revoked_at = NOW()
    WHERE token_hash = $1
      AND revoked_at IS NULL
      AND expires_at > NOW()
    RETURNING user_id
"#;

/// Hex SHA-256 of a refresh token; only the hash is stored
fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_service(access_expiry: i64) -> TokenService {
        TokenService::new(&JwtConfig {
            secret: "test-secret".to_string(),
            access_token_expiry: access_expiry,
            refresh_token_expiry: 3600,
        })
    }

    fn admin() -> UserSummary {
        UserSummary {
            id: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
            role: UserRole::Administrator,
        }
    }

    #[test]
    fn issued_token_validates() {
        let service = token_service(900);
        let user = admin();
        let tokens = service.generate_tokens(user.clone()).unwrap();

        let claims = service.validate_token(&tokens.access_token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.role, UserRole::Administrator);
        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.expires_in, 900);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        // beyond the default 60 s leeway
        let service = token_service(-120);
        let tokens = service.generate_tokens(admin()).unwrap();
        assert!(matches!(
            service.validate_token(&tokens.access_token),
            Err(AppError::TokenExpired)
        ));
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let tokens = token_service(900).generate_tokens(admin()).unwrap();
        let other = TokenService::new(&JwtConfig {
            secret: "another-secret".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 3600,
        });
        assert!(matches!(
            other.validate_token(&tokens.access_token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn refresh_tokens_are_hashed() {
        let hash = hash_token("abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn refresh_token_is_revoked_conditionally() {
        assert!(REDEEM_REFRESH_TOKEN.contains("AND revoked_at IS NULL"));
        assert!(REDEEM_REFRESH_TOKEN.contains("RETURNING user_id"));
    }
}
