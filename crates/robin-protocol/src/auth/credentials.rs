use super::Mechanism;

/// Credentials presented by the client, not yet verified against the local
/// user table.
#[derive(Clone, PartialEq, Eq, strum::Display, serde::Deserialize)]
#[strum(serialize_all = "PascalCase")]
#[cfg_attr(debug_assertions, derive(Debug, serde::Serialize))]
pub enum Credentials {
    /// username/password pair, decoded from a PLAIN or LOGIN exchange.
    Verify { authid: String, authpass: String },
}

#[cfg(not(debug_assertions))]
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Verify { authid, .. } => f
                .debug_struct("Credentials::Verify")
                .field("authid", authid)
                .field("authpass", &"***")
                .finish(),
        }
    }
}

#[cfg(not(debug_assertions))]
impl serde::Serialize for Credentials {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStructVariant;
        match self {
            Self::Verify { .. } => {
                let mut s = serializer.serialize_struct_variant("Credentials", 0, "Verify", 2)?;
                s.serialize_field("authid", "***")?;
                s.serialize_field("authpass", "***")?;
                s.end()
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("field is missing")]
    MissingField,
    #[error("cannot decode base64 payload")]
    Base64(#[from] base64::DecodeError),
    #[error("cannot parse utf8")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("mechanism not implemented: {0}")]
    Unimplemented(Mechanism),
}

impl Credentials {
    /// Decode a SASL PLAIN initial response: `[authzid] \0 authcid \0 passwd`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError`] if the payload is not valid base64 or
    /// does not contain the three NUL-separated fields.
    pub fn from_plain(base64_payload: &str) -> Result<Self, CredentialsError> {
        use base64::Engine;
        let raw = base64::engine::general_purpose::STANDARD.decode(base64_payload)?;
        let raw = std::str::from_utf8(&raw)?;
        let mut parts = raw.split('\0');
        let _authzid = parts.next().ok_or(CredentialsError::MissingField)?;
        let authid = parts
            .next()
            .ok_or(CredentialsError::MissingField)?
            .to_owned();
        let authpass = parts
            .next()
            .ok_or(CredentialsError::MissingField)?
            .to_owned();
        Ok(Self::Verify { authid, authpass })
    }

    /// Decode a single base64-encoded LOGIN continuation field (username or
    /// password, sent across two `334` round-trips).
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError`] if the payload is not valid base64/utf8.
    pub fn decode_login_field(base64_payload: &str) -> Result<String, CredentialsError> {
        use base64::Engine;
        let raw = base64::engine::general_purpose::STANDARD.decode(base64_payload)?;
        Ok(std::str::from_utf8(&raw)?.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain() {
        use base64::Engine;
        let payload = base64::engine::general_purpose::STANDARD.encode(b"\0user\0pass");
        let creds = Credentials::from_plain(&payload).unwrap();
        assert_eq!(
            creds,
            Credentials::Verify {
                authid: "user".to_owned(),
                authpass: "pass".to_owned()
            }
        );
    }

    #[test]
    fn decodes_login_field() {
        use base64::Engine;
        let payload = base64::engine::general_purpose::STANDARD.encode(b"user");
        assert_eq!(Credentials::decode_login_field(&payload).unwrap(), "user");
    }
}
