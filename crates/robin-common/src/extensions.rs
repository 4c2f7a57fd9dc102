/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    strum::AsRefStr,
    strum::Display,
    strum::EnumString,
    strum::EnumVariantNames,
    serde_with::DeserializeFromStr,
    serde_with::SerializeDisplay,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Extension {
    StartTls,
    Auth,
    Pipelining,
    #[strum(serialize = "8BITMIME")]
    BitMime8,
    EnhancedStatusCodes,
    #[strum(serialize = "DSN")]
    DeliveryStatusNotification,
    Unknown,
}

/// Match the longest-known extension keyword at the start of `input`,
/// returning the remainder (typically its advertised parameter).
#[allow(clippy::string_slice, clippy::indexing_slicing)]
#[must_use]
pub fn from_str(input: &str) -> (Extension, &str) {
    <Extension as strum::VariantNames>::VARIANTS
        .iter()
        .find(|i| input.len() >= i.len() && input[..i.len()].eq_ignore_ascii_case(i))
        .map_or_else(
            || (Extension::Unknown, input),
            |verb| (verb.parse().unwrap_or(Extension::Unknown), &input[verb.len()..]),
        )
}
