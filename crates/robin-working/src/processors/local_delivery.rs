/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

use crate::chain::{StorageOutcome, StorageProcessor};
use crate::payload;
use robin_common::relay_job::Protocol;
use robin_common::{Envelope, RelayJob, Session};
use robin_protocol::Address;
use robin_queue::{BounceBuilder, QueueBackend};
use std::io::Write;

/// How a local mailbox wants its mail delivered.
#[derive(Debug, Clone)]
pub enum LocalDelivery {
    /// Drop a file under `<maildir>/new/`, per the Maildir spec.
    Maildir(std::path::PathBuf),
    /// Run the LDA binary as a subprocess, feeding the message on stdin.
    Lda {
        binary: String,
        args: Vec<String>,
        timeout: std::time::Duration,
    },
}

enum Outcome {
    Delivered,
    Temporary,
    Permanent(String),
}

/// Resolves whether a recipient is local and how to deliver to it; `None`
/// means the recipient isn't local (goes to Queue-or-RelayDecision).
pub trait LocalUserResolver: Send + Sync {
    fn resolve(&self, mailbox: &Address) -> Option<LocalDelivery>;
}

/// §4.3's combined LocalStorage/LDA stage. Recipients resolved as local are
/// delivered here and removed from the list; everything else falls through
/// to `Queue-or-RelayDecision`. LDA non-zero exit codes in
/// `temporary_exit_codes` requeue the recipient; any other non-zero code
/// bounces it immediately rather than entering the retry loop.
pub struct LocalDeliveryProcessor<R, B> {
    resolver: R,
    queue: std::sync::Arc<B>,
    bounce_builder: BounceBuilder,
    temporary_exit_codes: std::collections::HashSet<i32>,
}

impl<R: LocalUserResolver, B: QueueBackend> LocalDeliveryProcessor<R, B> {
    #[must_use]
    pub fn new(
        resolver: R,
        queue: std::sync::Arc<B>,
        bounce_builder: BounceBuilder,
        temporary_exit_codes: std::collections::HashSet<i32>,
    ) -> Self {
        Self {
            resolver,
            queue,
            bounce_builder,
            temporary_exit_codes,
        }
    }

    fn deliver_maildir(maildir: &std::path::Path, bytes: &[u8]) -> Outcome {
        let new_dir = maildir.join("new");
        let write = (|| -> std::io::Result<()> {
            std::fs::create_dir_all(&new_dir)?;
            let filename = format!(
                "{}.{}.robin",
                time::OffsetDateTime::now_utc().unix_timestamp(),
                uuid::Uuid::new_v4()
            );
            std::fs::File::create(new_dir.join(filename))?.write_all(bytes)
        })();

        match write {
            Ok(()) => Outcome::Delivered,
            Err(error) => Outcome::Temporary.log_then(&error.to_string()),
        }
    }

    fn deliver_lda(
        binary: &str,
        args: &[String],
        timeout: std::time::Duration,
        bytes: &[u8],
        temporary_exit_codes: &std::collections::HashSet<i32>,
    ) -> Outcome {
        use std::process::{Command, Stdio};

        let mut child = match Command::new(binary)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(error) => return Outcome::Temporary.log_then(&error.to_string()),
        };

        if let Some(stdin) = child.stdin.as_mut() {
            if let Err(error) = stdin.write_all(bytes) {
                return Outcome::Temporary.log_then(&error.to_string());
            }
        }

        let start = std::time::Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break Ok(status),
                Ok(None) => {}
                Err(error) => break Err(error),
            }
            if start.elapsed() > timeout {
                let _ = child.kill();
                break Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "LDA subprocess timed out"));
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
        };

        match status {
            Ok(status) if status.success() => Outcome::Delivered,
            Ok(status) => match status.code() {
                Some(code) if temporary_exit_codes.contains(&code) => Outcome::Temporary,
                Some(code) => Outcome::Permanent(format!("LDA exited with code {code}")),
                None => Outcome::Permanent("LDA terminated by signal".to_owned()),
            },
            Err(error) => Outcome::Temporary.log_then(&error.to_string()),
        }
    }

    fn requeue_one(&self, envelope: &Envelope, recipient: robin_common::envelope::Recipient) {
        let mut solo = envelope.clone();
        solo.recipients = vec![recipient];
        let job = RelayJob::new(vec![solo], Protocol::Lda { target_mailbox: None });
        if let Err(error) = self.queue.enqueue(&job) {
            tracing::error!(%error, "failed to requeue LDA recipient after temporary failure");
        }
    }

    fn bounce_one(&self, envelope: &Envelope, recipient: robin_common::envelope::Recipient, diagnostic: String) {
        let mut solo = envelope.clone();
        solo.recipients = vec![recipient.clone()];
        let failure = robin_queue::FailedRecipient {
            recipient,
            status: "5.3.0".to_owned(),
            diagnostic_code: Some(diagnostic),
            remote_mta: None,
        };
        let bounce = self.bounce_builder.build(&solo, &[failure], time::OffsetDateTime::now_utc());
        if let Err(error) = self.queue.enqueue_front(&bounce) {
            tracing::error!(%error, "failed to enqueue bounce for permanent local delivery failure");
        }
    }
}

trait LogThen {
    fn log_then(self, message: &str) -> Outcome;
}

impl LogThen for Outcome {
    fn log_then(self, message: &str) -> Outcome {
        tracing::warn!(error = message, "local delivery attempt failed");
        self
    }
}

#[async_trait::async_trait]
impl<R: LocalUserResolver, B: QueueBackend> StorageProcessor for LocalDeliveryProcessor<R, B> {
    fn name(&self) -> &'static str {
        "local-delivery"
    }

    async fn run(&self, _session: &Session, envelope: &mut Envelope) -> StorageOutcome {
        if envelope.matched_proxy_rule.is_some() {
            return StorageOutcome::Continue;
        }

        let bytes = match payload::read(envelope) {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(%error, "failed to read payload for local delivery");
                return StorageOutcome::Continue;
            }
        };
        let full_message = [envelope.render_header_prefix().into_bytes(), bytes].concat();

        let mut remaining = Vec::with_capacity(envelope.recipients.len());
        for recipient in envelope.recipients.drain(..) {
            let Some(delivery) = self.resolver.resolve(&recipient.forward_path) else {
                remaining.push(recipient);
                continue;
            };

            let outcome = match &delivery {
                LocalDelivery::Maildir(path) => Self::deliver_maildir(path, &full_message),
                LocalDelivery::Lda { binary, args, timeout } => {
                    Self::deliver_lda(binary, args, *timeout, &full_message, &self.temporary_exit_codes)
                }
            };

            match outcome {
                Outcome::Delivered => {}
                Outcome::Temporary => self.requeue_one(envelope, recipient),
                Outcome::Permanent(diagnostic) => self.bounce_one(envelope, recipient, diagnostic),
            }
        }
        envelope.recipients = remaining;

        StorageOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::{LocalDelivery, LocalDeliveryProcessor, LocalUserResolver};
    use crate::chain::{StorageOutcome, StorageProcessor};
    use robin_common::envelope::Recipient;
    use robin_common::session::Direction;
    use robin_common::{Envelope, Session};
    use robin_protocol::{Address, ConnectionKind};
    use robin_queue::{BounceBuilder, MemoryBackend, QueueBackend};
    use std::str::FromStr;

    fn session() -> Session {
        Session::new(
            Direction::Inbound,
            ConnectionKind::Smtp,
            "127.0.0.1:25".parse().unwrap(),
            "127.0.0.1:25000".parse().unwrap(),
        )
    }

    fn envelope_to(address: &str) -> Envelope {
        let mut envelope = Envelope::new(Some(Address::from_str("sender@example.com").unwrap()));
        envelope.recipients.push(Recipient::new(Address::from_str(address).unwrap()));
        envelope
    }

    struct MaildirResolver(std::path::PathBuf);
    impl LocalUserResolver for MaildirResolver {
        fn resolve(&self, _mailbox: &Address) -> Option<LocalDelivery> {
            Some(LocalDelivery::Maildir(self.0.clone()))
        }
    }

    struct LdaResolver {
        binary: String,
        args: Vec<String>,
    }
    impl LocalUserResolver for LdaResolver {
        fn resolve(&self, _mailbox: &Address) -> Option<LocalDelivery> {
            Some(LocalDelivery::Lda {
                binary: self.binary.clone(),
                args: self.args.clone(),
                timeout: std::time::Duration::from_secs(5),
            })
        }
    }

    fn processor<R: LocalUserResolver>(
        resolver: R,
        queue: std::sync::Arc<MemoryBackend>,
        temporary_exit_codes: std::collections::HashSet<i32>,
    ) -> LocalDeliveryProcessor<R, MemoryBackend> {
        LocalDeliveryProcessor::new(resolver, queue, BounceBuilder::new("mx.example.org".to_owned()), temporary_exit_codes)
    }

    #[tokio::test]
    async fn maildir_delivery_drops_a_file_under_new() {
        let dir = std::env::temp_dir().join(format!("robin-working-test-{}", uuid::Uuid::new_v4()));
        let queue = std::sync::Arc::new(MemoryBackend::default());
        let proc = processor(MaildirResolver(dir.clone()), queue, std::collections::HashSet::new());

        let mut envelope = envelope_to("local@example.com");
        let outcome = proc.run(&session(), &mut envelope).await;

        assert_eq!(outcome, StorageOutcome::Continue);
        assert!(envelope.recipients.is_empty());
        let delivered = std::fs::read_dir(dir.join("new")).unwrap().count();
        assert_eq!(delivered, 1);
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn lda_success_consumes_the_recipient() {
        let queue = std::sync::Arc::new(MemoryBackend::default());
        let proc = processor(
            LdaResolver {
                binary: "/bin/cat".to_owned(),
                args: Vec::new(),
            },
            queue.clone(),
            std::collections::HashSet::new(),
        );

        let mut envelope = envelope_to("local@example.com");
        let outcome = proc.run(&session(), &mut envelope).await;

        assert_eq!(outcome, StorageOutcome::Continue);
        assert!(envelope.recipients.is_empty());
        assert_eq!(queue.len().unwrap(), 0);
    }

    #[tokio::test]
    async fn lda_temporary_exit_code_requeues_the_recipient() {
        let queue = std::sync::Arc::new(MemoryBackend::default());
        let mut temporary = std::collections::HashSet::new();
        temporary.insert(75);
        let proc = processor(
            LdaResolver {
                binary: "/bin/sh".to_owned(),
                args: vec!["-c".to_owned(), "exit 75".to_owned()],
            },
            queue.clone(),
            temporary,
        );

        let mut envelope = envelope_to("local@example.com");
        proc.run(&session(), &mut envelope).await;

        assert_eq!(queue.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn lda_permanent_exit_code_bounces_immediately() {
        let queue = std::sync::Arc::new(MemoryBackend::default());
        let proc = processor(
            LdaResolver {
                binary: "/bin/sh".to_owned(),
                args: vec!["-c".to_owned(), "exit 1".to_owned()],
            },
            queue.clone(),
            std::collections::HashSet::new(),
        );

        let mut envelope = envelope_to("local@example.com");
        proc.run(&session(), &mut envelope).await;

        assert_eq!(queue.len().unwrap(), 1);
    }
}
