/// Stage of the step-by-step SMTP/ESMTP/LMTP transaction.
///
/// Ordering matters: a session can only move forward, and `RSET`/`MAIL`
/// rewinds to `Greeted` or `Helloed` respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// The client has just connected, no command received yet.
    Connect,
    /// The client has sent HELO/EHLO/LHLO.
    Helloed,
    /// The client has sent MAIL FROM.
    MailSet,
    /// The client has sent at least one RCPT TO.
    RcptSet,
    /// The client is streaming a DATA payload.
    DataActive,
    /// The client is streaming BDAT chunks (CHUNKING extension).
    BdatActive,
    /// The message has been fully received and handed off.
    Complete,
}

impl Stage {
    /// Whether a MAIL FROM command is acceptable from this stage.
    #[must_use]
    pub const fn accepts_mail_from(self) -> bool {
        matches!(self, Self::Helloed | Self::Complete)
    }

    /// Whether a RCPT TO command is acceptable from this stage.
    #[must_use]
    pub const fn accepts_rcpt_to(self) -> bool {
        matches!(self, Self::MailSet | Self::RcptSet)
    }

    /// Whether a DATA/BDAT command is acceptable from this stage.
    #[must_use]
    pub const fn accepts_content(self) -> bool {
        matches!(self, Self::RcptSet | Self::BdatActive)
    }
}
