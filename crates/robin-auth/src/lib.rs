/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

//! Robin authentication library: TLS key/certificate material and SASL
//! authentication.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc(html_no_source)]
#![forbid(unsafe_code)]

mod authenticator;
pub use authenticator::{AuthError, Authenticator, UserTable};

mod private_key;
pub use private_key::{PrivateKey, TlsPrivateKey, TlsPrivateKeyError};

mod certificate;
pub use certificate::{TlsCertificate, TlsCertificateError};
