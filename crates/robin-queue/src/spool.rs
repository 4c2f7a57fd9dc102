/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

//! Persistent envelope-payload file layout, shared by the queue backends
//! and the retry cron.

use robin_common::envelope::Payload;

/// `<storage>/queue/<base>.<session-uid>.<index>[-n].<ext>`, per the
/// persistent-envelope-file layout.
#[must_use]
pub fn queue_payload_path(
    queue_dir: &std::path::Path,
    base: &str,
    session_uid: uuid::Uuid,
    index: usize,
    retry_count: u32,
    ext: &str,
) -> std::path::PathBuf {
    let name = if retry_count == 0 {
        format!("{base}.{session_uid}.{index}.{ext}")
    } else {
        format!("{base}.{session_uid}.{index}-{retry_count}.{ext}")
    };
    queue_dir.join(name)
}

/// Ensure `payload` lives under `queue_dir`, moving it there if it doesn't.
/// Idempotent: a payload already under `queue_dir` is left untouched.
/// Attempts a plain rename first (atomic on the same filesystem); falls
/// back to copy-then-delete when the rename fails, e.g. across devices.
///
/// # Errors
///
/// Returns the underlying I/O error if neither the rename nor the
/// copy-then-delete fallback succeeds.
pub fn persist_payload(
    queue_dir: &std::path::Path,
    destination: &std::path::Path,
    payload: &mut Payload,
) -> std::io::Result<()> {
    let Payload::Path(current) = payload else {
        return Ok(());
    };
    if current.parent() == Some(queue_dir) {
        return Ok(());
    }

    match std::fs::rename(&current, destination) {
        Ok(()) => {}
        Err(_) => {
            std::fs::copy(&current, destination)?;
            std::fs::remove_file(&current)?;
        }
    }
    *current = destination.to_path_buf();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{persist_payload, queue_payload_path};
    use robin_common::envelope::Payload;

    #[test]
    fn path_layout_includes_retry_suffix_only_when_nonzero() {
        let queue_dir = std::path::Path::new("/var/spool/robin/queue");
        let uid = uuid::Uuid::nil();
        assert_eq!(
            queue_payload_path(queue_dir, "mail", uid, 0, 0, "eml"),
            queue_dir.join(format!("mail.{uid}.0.eml"))
        );
        assert_eq!(
            queue_payload_path(queue_dir, "mail", uid, 0, 2, "eml"),
            queue_dir.join(format!("mail.{uid}.0-2.eml"))
        );
    }

    #[test]
    fn persist_payload_moves_file_into_queue_dir() {
        let tmp = tempdir();
        let queue_dir = tmp.join("queue");
        std::fs::create_dir_all(&queue_dir).unwrap();
        let src = tmp.join("incoming.eml");
        std::fs::write(&src, b"hello").unwrap();

        let mut payload = Payload::Path(src.clone());
        let dest = queue_dir.join("mail.0.eml");
        persist_payload(&queue_dir, &dest, &mut payload).unwrap();

        assert!(!src.exists());
        assert!(dest.exists());
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello");
        let Payload::Path(new_path) = payload else {
            unreachable!()
        };
        assert_eq!(new_path, dest);

        std::fs::remove_dir_all(&tmp).ok();
    }

    #[test]
    fn persist_payload_is_idempotent_once_under_queue_dir() {
        let tmp = tempdir();
        std::fs::create_dir_all(&tmp).unwrap();
        let already_there = tmp.join("mail.0.eml");
        std::fs::write(&already_there, b"hi").unwrap();

        let mut payload = Payload::Path(already_there.clone());
        persist_payload(&tmp, &already_there, &mut payload).unwrap();

        let Payload::Path(new_path) = payload else {
            unreachable!()
        };
        assert_eq!(new_path, already_there);

        std::fs::remove_dir_all(&tmp).ok();
    }

    fn tempdir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("robin-queue-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
