/// SASL mechanisms accepted on AUTH.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::AsRefStr, serde::Serialize, serde::Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Mechanism {
    Plain,
    Login,
}

impl Mechanism {
    /// Whether the client is expected to send its whole exchange as the
    /// initial response (`true` for PLAIN), or through further `334`
    /// continuation challenges (`false` for LOGIN).
    #[must_use]
    pub const fn is_single_step(self) -> bool {
        matches!(self, Self::Plain)
    }
}
