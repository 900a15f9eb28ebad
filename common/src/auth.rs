// Authentication and JWT token handling

use crate::db::repositories::user::UserRepository;
use crate::errors::{AuthError, DatabaseError};
use crate::models::{User, UserClaims};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use tracing::{error, instrument, warn};

/// JWT token service for encoding and decoding tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    expiration_hours: i64,
}

impl JwtService {
    /// Create a new JWT service with the given secret and expiration
    #[instrument(skip(secret))]
    pub fn new(secret: &str, expiration_hours: u64) -> Self {
        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            expiration_hours: expiration_hours as i64,
        }
    }

    /// Encode a login session into a signed HS256 token
    #[instrument(skip(self))]
    pub fn encode_token(&self, user_id: &str, email: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = UserClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: (now + Duration::hours(self.expiration_hours)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "Failed to encode JWT token");
            AuthError::AuthenticationFailed(format!("Failed to encode token: {}", e))
        })
    }

    /// Decode and validate a JWT token
    #[instrument(skip(self, token))]
    pub fn decode_token(&self, token: &str) -> Result<UserClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let token_data =
            decode::<UserClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                warn!(error = %e, "Rejected JWT token");
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken(format!("Token validation failed: {}", e)),
                }
            })?;

        Ok(token_data.claims)
    }
}

/// Hash a plaintext password with bcrypt
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        AuthError::AuthenticationFailed(format!("Password hashing failed: {}", e))
    })
}

/// Check a plaintext password against a stored bcrypt hash
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, password_hash).map_err(|e| {
        error!(error = %e, "Failed to verify password");
        AuthError::AuthenticationFailed(format!("Password verification failed: {}", e))
    })
}

/// Successful login: the issued token plus the account it belongs to
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub token: String,
    pub user: User,
}

/// Email/password authentication backed by the users table
#[derive(Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    user_repository: Arc<UserRepository>,
}

impl AuthService {
    pub fn new(jwt_service: JwtService, user_repository: UserRepository) -> Self {
        Self {
            jwt_service,
            user_repository: Arc::new(user_repository),
        }
    }

    /// Register a new account. Emails are compared case-insensitively.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, AuthError> {
        let existing = self
            .user_repository
            .find_by_email(email)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error during registration");
                AuthError::AuthenticationFailed(format!("Database error: {}", e))
            })?;
        if existing.is_some() {
            return Err(AuthError::EmailTaken(email.to_string()));
        }

        let password_hash = hash_password(password)?;
        let user = User::new(email.to_string(), name.to_string(), password_hash);

        // A concurrent registration can still win the race to the unique index
        self.user_repository.create(&user).await.map_err(|e| match e {
            DatabaseError::DuplicateKey(_) => AuthError::EmailTaken(email.to_string()),
            other => {
                error!(error = %other, "Failed to create user");
                AuthError::AuthenticationFailed(format!("Failed to create user: {}", other))
            }
        })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Verify credentials and issue a token
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSession, AuthError> {
        let user = self
            .user_repository
            .find_by_email(email)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error during login");
                AuthError::AuthenticationFailed(format!("Database error: {}", e))
            })?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "Invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .jwt_service
            .encode_token(&user.id.to_string(), &user.email)?;

        tracing::info!(user_id = %user.id, "User logged in successfully");
        Ok(LoginSession { token, user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_service_encode_decode() {
        let service = JwtService::new("test-secret", 24);

        let token = service
            .encode_token("0b6d6a4e-3c6f-4b77-9d67-1f2b0c3e9a10", "budi@example.com")
            .expect("Failed to encode token");

        let claims = service
            .decode_token(&token)
            .expect("Failed to decode token");

        assert_eq!(claims.sub, "0b6d6a4e-3c6f-4b77-9d67-1f2b0c3e9a10");
        assert_eq!(claims.email, "budi@example.com");
        assert!(claims.user_id().is_some());
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_jwt_service_expired_token() {
        let service = JwtService::new("test-secret", 1);

        let now = Utc::now();
        let claims = UserClaims {
            sub: "user-123".to_string(),
            email: "budi@example.com".to_string(),
            exp: (now - Duration::hours(1)).timestamp(),
            iat: (now - Duration::hours(2)).timestamp(),
        };

        let encoding_key = EncodingKey::from_secret("test-secret".as_bytes());
        let token = encode(&Header::default(), &claims, &encoding_key)
            .expect("Failed to encode token");

        let result = service.decode_token(&token);
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_jwt_service_invalid_token() {
        let service = JwtService::new("test-secret", 24);
        let result = service.decode_token("invalid.token.here");
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_jwt_service_rejects_foreign_secret() {
        let issuer = JwtService::new("secret-a", 24);
        let verifier = JwtService::new("secret-b", 24);

        let token = issuer
            .encode_token("user-123", "budi@example.com")
            .expect("Failed to encode token");

        assert!(matches!(
            verifier.decode_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_verify_password() {
        let hash = bcrypt::hash("rahasia123", 4).expect("Failed to hash");

        assert!(verify_password("rahasia123", &hash).unwrap());
        assert!(!verify_password("salah", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_malformed_hash() {
        let result = verify_password("rahasia123", "not-a-bcrypt-hash");
        assert!(matches!(result, Err(AuthError::AuthenticationFailed(_))));
    }

    #[test]
    fn test_hash_password_produces_verifiable_hash() {
        let hash = hash_password("rahasia123").expect("Failed to hash");

        assert_ne!(hash, "rahasia123");
        assert!(verify_password("rahasia123", &hash).unwrap());
    }
}
