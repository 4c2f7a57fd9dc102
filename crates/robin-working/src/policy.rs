/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

/// What to do with a message a content scanner flagged, per §4.3's
/// AV/Spam processor description ("on infection, if policy is `reject` ...
/// if `discard` ...").
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPolicy {
    Reject,
    Discard,
}
