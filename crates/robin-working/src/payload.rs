/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

use robin_common::envelope::{Envelope, Payload};

/// Read an envelope's payload into memory, whichever of the two exclusive
/// `Payload` variants it currently holds.
pub fn read(envelope: &Envelope) -> std::io::Result<Vec<u8>> {
    match &envelope.payload {
        Some(Payload::Path(path)) => std::fs::read(path),
        Some(Payload::Memory(bytes)) => Ok(bytes.as_ref().clone()),
        None => Ok(Vec::new()),
    }
}
