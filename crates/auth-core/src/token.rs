//! 会话令牌服务
//!
//! 把 `SessionClaims` 签名为 HS256 令牌交给客户端。令牌只证明声明集未被篡改，
//! 会话是否仍然有效（登出、空闲超时）由服务端会话存储决定。

use chrono::Duration;
use grc_errors::{AppError, AppResult};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::claims::SessionClaims;

/// 会话令牌服务
#[derive(Clone)]
pub struct SessionTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    max_lifetime: Duration,
    issuer: String,
}

impl SessionTokenService {
    /// 令牌绝对有效期，超过后必须重新登录
    pub const DEFAULT_MAX_LIFETIME_HOURS: i64 = 12;

    pub fn new(secret: &str, issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            max_lifetime: Duration::hours(Self::DEFAULT_MAX_LIFETIME_HOURS),
            issuer: issuer.into(),
        }
    }

    pub fn with_max_lifetime(mut self, max_lifetime: Duration) -> Self {
        self.max_lifetime = max_lifetime;
        self
    }

    pub fn max_lifetime(&self) -> Duration {
        self.max_lifetime
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// 签发令牌
    pub fn issue(&self, claims: &SessionClaims) -> AppResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign session token: {}", e)))
    }

    /// 校验签名、签发者与绝对过期时间
    pub fn verify(&self, token: &str) -> AppResult<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Session token rejected");
                AppError::unauthenticated("Invalid or expired session token")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use chrono::Utc;
    use grc_common::UserId;

    fn claims(service: &SessionTokenService) -> SessionClaims {
        SessionClaims::new(
            UserId(9),
            "auditor1",
            vec![Role::Auditor],
            Utc::now(),
            service.max_lifetime(),
            service.issuer(),
        )
    }

    #[test]
    fn test_issue_and_verify() {
        let service = SessionTokenService::new("test_secret", "grc-platform");
        let claims = claims(&service);
        let token = service.issue(&claims).unwrap();

        let verified = service.verify(&token).unwrap();
        assert_eq!(verified, claims);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = SessionTokenService::new("correct_secret", "grc-platform");
        let verifier = SessionTokenService::new("other_secret", "grc-platform");
        let token = signer.issue(&claims(&signer)).unwrap();

        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = SessionTokenService::new("test_secret", "grc-platform")
            .with_max_lifetime(Duration::hours(-1));
        let token = service.issue(&claims(&service)).unwrap();

        assert!(service.verify(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let signer = SessionTokenService::new("test_secret", "someone-else");
        let verifier = SessionTokenService::new("test_secret", "grc-platform");
        let token = signer.issue(&claims(&signer)).unwrap();

        assert!(verifier.verify(&token).is_err());
    }
}
