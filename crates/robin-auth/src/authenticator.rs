/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

use robin_protocol::auth::Credentials;
use sha2::Digest;

/// Verifies SASL credentials against a source of truth and returns the
/// authenticated principal on success.
pub trait Authenticator: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AuthError`] if the credentials do not match a known user.
    fn authenticate(&self, credentials: &Credentials) -> Result<String, AuthError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no such user")]
    UnknownUser,
    #[error("password does not match")]
    WrongPassword,
}

/// Salted-hash of a password, computed with SHA-256.
#[derive(Clone, PartialEq, Eq)]
struct PasswordHash {
    salt: [u8; 16],
    digest: [u8; 32],
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHash").finish_non_exhaustive()
    }
}

impl PasswordHash {
    fn digest_of(salt: &[u8; 16], password: &str) -> [u8; 32] {
        let mut hasher = sha2::Sha256::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        hasher.finalize().into()
    }

    fn new(password: &str) -> Self {
        let mut salt = [0_u8; 16];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut salt);
        let digest = Self::digest_of(&salt, password);
        Self { salt, digest }
    }

    fn verify(&self, password: &str) -> bool {
        let candidate = Self::digest_of(&self.salt, password);
        ring_compat::ring::constant_time::verify_slices_are_equal(&candidate, &self.digest).is_ok()
    }
}

/// A local, in-memory user table: the only `Authenticator` Robin ships with.
/// Pluggable SASL backends (Dovecot, an external proxy) implement the same
/// trait but live outside this crate.
#[derive(Debug, Default)]
pub struct UserTable {
    users: std::collections::HashMap<String, PasswordHash>,
}

impl UserTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, username: impl Into<String>, password: &str) {
        self.users.insert(username.into(), PasswordHash::new(password));
    }

    #[must_use]
    pub fn with_user(mut self, username: impl Into<String>, password: &str) -> Self {
        self.insert(username, password);
        self
    }
}

impl Authenticator for UserTable {
    fn authenticate(&self, credentials: &Credentials) -> Result<String, AuthError> {
        let Credentials::Verify { authid, authpass } = credentials;
        let hash = self.users.get(authid).ok_or(AuthError::UnknownUser)?;
        if hash.verify(authpass) {
            Ok(authid.clone())
        } else {
            Err(AuthError::WrongPassword)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Authenticator, UserTable};
    use pretty_assertions::assert_eq;
    use robin_protocol::auth::Credentials;

    #[test]
    fn accepts_matching_password() {
        let table = UserTable::new().with_user("alice", "hunter2");
        let creds = Credentials::Verify {
            authid: "alice".to_string(),
            authpass: "hunter2".to_string(),
        };
        assert_eq!(table.authenticate(&creds).unwrap(), "alice");
    }

    #[test]
    fn rejects_wrong_password() {
        let table = UserTable::new().with_user("alice", "hunter2");
        let creds = Credentials::Verify {
            authid: "alice".to_string(),
            authpass: "wrong".to_string(),
        };
        assert!(table.authenticate(&creds).is_err());
    }

    #[test]
    fn rejects_unknown_user() {
        let table = UserTable::new();
        let creds = Credentials::Verify {
            authid: "bob".to_string(),
            authpass: "anything".to_string(),
        };
        assert!(matches!(
            table.authenticate(&creds),
            Err(super::AuthError::UnknownUser)
        ));
    }
}
