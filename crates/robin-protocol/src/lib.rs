//! Wire-level SMTP/ESMTP/LMTP types: verbs, replies, addresses and stages.
//!
//! This crate has no knowledge of sessions or storage; it only knows how to
//! parse a command line into a [`Verb`] and how to render a [`Reply`].

mod connection_kind;
mod stage;
mod verb;

pub mod tls {
    mod protocol_version;

    pub use protocol_version::{ProtocolVersion, ProtocolVersionFromStrError};
}

pub mod auth {
    mod credentials;
    mod mechanism;

    pub use credentials::Credentials;
    pub use mechanism::Mechanism;
}

mod types {
    pub mod address;
    pub mod client_name;
    pub mod domain;
    pub mod reply;
    pub mod reply_code;
}

pub use tokio_rustls;
pub use tokio_rustls::rustls;

pub use connection_kind::ConnectionKind;
pub use stage::Stage;
pub use types::{
    address::{Address, AddressFromStrError},
    client_name::ClientName,
    domain::Domain,
    reply::Reply,
    reply_code::ReplyCode,
};
pub use verb::{
    AuthArgs, DsnReturn, EhloArgs, MailFromArgs, NotifyOn, OriginalRecipient, ParseVerbError,
    RcptToArgs, Verb,
};
