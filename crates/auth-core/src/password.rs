//! 密码哈希

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString, rand_core::OsRng},
};
use grc_errors::{AppError, AppResult};

/// 口令哈希与校验
///
/// 使用 Argon2id 默认参数（单次校验在几十毫秒量级）。明文只在调用栈内出现，
/// 从不写日志、不出现在错误信息中。
#[derive(Clone)]
pub struct PasswordHasher {
    /// 用户不存在时用于校验的占位哈希，使两条失败路径耗时一致
    dummy_hash: String,
}

impl PasswordHasher {
    pub fn new() -> AppResult<Self> {
        let dummy_hash = Self::hash_with_fresh_salt("grc-timing-equaliser")?;
        Ok(Self { dummy_hash })
    }

    /// 哈希密码
    pub fn hash(&self, plaintext: &str) -> AppResult<String> {
        Self::hash_with_fresh_salt(plaintext)
    }

    /// 校验密码；哈希格式损坏视为不匹配
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => Argon2::default()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                false
            }
        }
    }

    /// 对占位哈希做一次校验，结果总是 false
    pub fn verify_dummy(&self, plaintext: &str) -> bool {
        let _ = self.verify(plaintext, &self.dummy_hash);
        false
    }

    fn hash_with_fresh_salt(plaintext: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new().unwrap();
        let digest = hasher.hash("Correct-Horse-7").unwrap();

        assert!(digest.starts_with("$argon2"));
        assert!(!digest.contains("Correct-Horse-7"));
        assert!(hasher.verify("Correct-Horse-7", &digest));
        assert!(!hasher.verify("correct-horse-7", &digest));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let hasher = PasswordHasher::new().unwrap();
        assert_ne!(hasher.hash("pw").unwrap(), hasher.hash("pw").unwrap());
    }

    #[test]
    fn test_malformed_digest_is_mismatch() {
        let hasher = PasswordHasher::new().unwrap();
        assert!(!hasher.verify("anything", "not-a-phc-string"));
        assert!(!hasher.verify_dummy("anything"));
    }
}
