/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

//! Ensures every envelope entering the storage chain carries a Message-ID,
//! stamping one on before AV/Spam/Webhook see it if the client didn't send
//! one. Run once per envelope, ahead of the chain proper.

use robin_mail_parser::Mail;

/// Returns `bytes` unchanged if it already has a Message-ID header,
/// otherwise returns a copy with one prepended.
#[must_use]
pub fn ensure(hostname: &str, bytes: &[u8]) -> Vec<u8> {
    let Ok(text) = std::str::from_utf8(bytes) else {
        return bytes.to_vec();
    };

    let Ok(mail) = Mail::try_from(text) else {
        return bytes.to_vec();
    };

    if mail.get_header("Message-ID").is_some() {
        return bytes.to_vec();
    }

    let stamped = format!("Message-ID: <{}@{hostname}>\r\n", uuid::Uuid::new_v4());
    [stamped.into_bytes(), bytes.to_vec()].concat()
}

#[cfg(test)]
mod tests {
    use super::ensure;

    #[test]
    fn leaves_an_existing_message_id_untouched() {
        let mail = b"Message-ID: <abc@example.com>\r\nSubject: hi\r\n\r\nbody\r\n".to_vec();
        assert_eq!(ensure("mx.example.org", &mail), mail);
    }

    #[test]
    fn stamps_a_message_id_when_missing() {
        let mail = b"Subject: hi\r\n\r\nbody\r\n".to_vec();
        let stamped = ensure("mx.example.org", &mail);
        assert!(stamped.starts_with(b"Message-ID: <"));
        assert!(stamped.ends_with(mail.as_slice()));
    }
}
