use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};

use crate::{
    auth::claims::Claims,
    errors::{AppError, AppResult},
};

pub const SESSION_AUDIENCE: &str = "authenticated";

/// Verifies session tokens minted by the managed auth service (HS256 with
/// the project's JWT secret).
#[derive(Clone)]
pub struct JwtService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(secret: &SecretString) -> Self {
        let secret_bytes = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[SESSION_AUDIENCE]);

        Self {
            decoding_key: DecodingKey::from_secret(secret_bytes),
            validation,
        }
    }

    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Session has expired".to_string())
                }
                ErrorKind::InvalidSignature => {
                    AppError::Unauthorized("Session signature is invalid".to_string())
                }
                ErrorKind::InvalidAudience => {
                    AppError::Unauthorized("Session audience is invalid".to_string())
                }
                _ => AppError::Unauthorized(format!("Invalid session: {}", e)),
            })
    }
}

#[cfg(test)]
pub(crate) fn sign_test_token(secret: &SecretString, claims: &serde_json::Value) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .expect("test token should encode")
}
