/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

use robin_common::ScanResult;

/// Outcome of a single [`Antivirus::scan`] call.
#[derive(Debug, Clone)]
pub struct AntivirusResult {
    pub infected: bool,
    pub viruses: Vec<String>,
}

impl AntivirusResult {
    #[must_use]
    pub fn into_scan_result(self, part: Option<String>) -> ScanResult {
        ScanResult::ClamAv {
            infected: self.infected,
            viruses: self.viruses,
            part,
        }
    }
}

/// A content scanner plugged into the storage-processor chain.
pub trait Antivirus: Send + Sync {
    /// Scan a message part for malware.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the scan could not be completed (connector
    /// unreachable, stream aborted).
    fn scan(&self, bytes: &[u8]) -> Result<AntivirusResult, std::io::Error>;
}
