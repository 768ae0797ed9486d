//! 登录失败类型

use grc_errors::AppError;
use thiserror::Error;

/// 登录失败
///
/// 用户不存在与口令错误对调用方完全一致
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("Account is deactivated. Contact administrator.")]
    AccountDisabled,

    #[error("User has no assigned roles. Contact administrator.")]
    NoRolesAssigned,

    #[error(transparent)]
    Infrastructure(#[from] AppError),
}

impl AuthError {
    /// 指标标签
    pub fn outcome(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::AccountDisabled => "account_disabled",
            AuthError::NoRolesAssigned => "no_roles",
            AuthError::Infrastructure(AppError::Validation(_)) => "invalid_input",
            AuthError::Infrastructure(_) => "error",
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => AppError::unauthenticated(e.to_string()),
            AuthError::AccountDisabled | AuthError::NoRolesAssigned => {
                AppError::forbidden(e.to_string())
            }
            AuthError::Infrastructure(inner) => inner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_app_error() {
        assert_eq!(AppError::from(AuthError::InvalidCredentials).status_code(), 401);
        assert_eq!(AppError::from(AuthError::AccountDisabled).status_code(), 403);
        assert_eq!(AppError::from(AuthError::NoRolesAssigned).status_code(), 403);

        let inner = AppError::store_unavailable("pool timed out");
        assert_eq!(AppError::from(AuthError::Infrastructure(inner.clone())), inner);
    }

    #[test]
    fn test_forbidden_login_failures_carry_no_fallback() {
        assert_eq!(AppError::from(AuthError::AccountDisabled).fallback(), None);
    }
}
