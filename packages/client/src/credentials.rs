//! Credential access for the realtime connection.
//!
//! The connection manager never reads a global store; whoever owns the
//! session injects a [`CredentialProvider`], which keeps the connection
//! testable in isolation.

use crate::protocol::UserRef;

/// Source of the bearer token and user identity.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialProvider: Send + Sync {
    /// The bearer token, if a session exists
    fn token(&self) -> Option<String>;

    /// The authenticated user, if a session exists
    fn identity(&self) -> Option<UserRef>;
}

/// Credential provider backed by values known up front (CLI flags,
/// already-loaded session data).
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    token: String,
    user: UserRef,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>, user_id: i64) -> Self {
        Self {
            token: token.into(),
            user: UserRef { id: user_id },
        }
    }
}

impl CredentialProvider for StaticCredentials {
    fn token(&self) -> Option<String> {
        Some(self.token.clone())
    }

    fn identity(&self) -> Option<UserRef> {
        Some(self.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_credentials_return_both_halves() {
        // テスト項目: StaticCredentials がトークンとユーザーの両方を返す
        // given (前提条件):
        let credentials = StaticCredentials::new("bearer-token", 7);

        // when (操作):
        let token = credentials.token();
        let identity = credentials.identity();

        // then (期待する結果):
        assert_eq!(token.as_deref(), Some("bearer-token"));
        assert_eq!(identity, Some(UserRef { id: 7 }));
    }
}
