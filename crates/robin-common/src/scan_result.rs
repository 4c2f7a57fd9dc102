/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

/// Outcome of a single content scanner run against an envelope's payload.
/// Append-only on [`crate::envelope::Envelope::scan_results`]; a tagged
/// variant over the known scanners rather than a heterogeneous map.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "scanner", rename_all = "snake_case")]
pub enum ScanResult {
    Rspamd {
        score: f64,
        spam: bool,
        symbols: Vec<String>,
    },
    ClamAv {
        infected: bool,
        viruses: Vec<String>,
        part: Option<String>,
    },
    Other {
        scanner: String,
        fields: std::collections::BTreeMap<String, String>,
    },
}

impl ScanResult {
    #[must_use]
    pub fn is_blocking(&self, spam_threshold: f64) -> bool {
        match self {
            Self::Rspamd { score, .. } => *score > spam_threshold,
            Self::ClamAv { infected, .. } => *infected,
            Self::Other { .. } => false,
        }
    }
}
