use super::reply_code::ReplyCode;

/// A complete SMTP reply: a code shared by every line, plus the text lines
/// that follow it. Rendering joins them with `<code>-` for every line but
/// the last, which uses `<code> ` per RFC 5321 §4.2.1.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, fake::Dummy)]
pub struct Reply {
    code: ReplyCode,
    #[dummy(faker = "(fake::faker::lorem::en::Sentence(1..3), 1..3)")]
    lines: Vec<String>,
}

impl Reply {
    #[must_use]
    pub fn new(code: ReplyCode, lines: impl IntoIterator<Item = String>) -> Self {
        let lines = lines.into_iter().collect::<Vec<_>>();
        Self {
            code,
            lines: if lines.is_empty() {
                vec![String::new()]
            } else {
                lines
            },
        }
    }

    #[must_use]
    pub const fn code(&self) -> &ReplyCode {
        &self.code
    }

    pub fn lines(&self) -> impl Iterator<Item = &String> {
        self.lines.iter()
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.code.is_error()
    }

    /// Render the reply as it is sent on the wire, CRLF-terminated.
    #[must_use]
    pub fn as_crlf_string(&self) -> String {
        let code = self.code.value();
        let details = self.code.details();
        let last = self.lines.len().saturating_sub(1);
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let sep = if i == last { ' ' } else { '-' };
                match &details {
                    Some(enhanced) => format!("{code}{sep}{enhanced} {line}\r\n"),
                    None => format!("{code}{sep}{line}\r\n"),
                }
            })
            .collect()
    }
}

impl std::fmt::Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_crlf_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        let reply = Reply::new(ReplyCode::Code { code: 250 }, vec!["Ok".to_string()]);
        assert_eq!(reply.as_crlf_string(), "250 Ok\r\n");
    }

    #[test]
    fn multi_line() {
        let reply = Reply::new(
            ReplyCode::Code { code: 250 },
            vec!["robin.example.com".to_string(), "PIPELINING".to_string()],
        );
        assert_eq!(
            reply.as_crlf_string(),
            "250-robin.example.com\r\n250 PIPELINING\r\n"
        );
    }

    #[test]
    fn enhanced_code() {
        let reply = Reply::new(
            ReplyCode::Enhanced {
                code: 550,
                enhanced: "5.1.1".to_string(),
            },
            vec!["Mailbox unavailable".to_string()],
        );
        assert_eq!(reply.as_crlf_string(), "550 5.1.1 Mailbox unavailable\r\n");
    }
}
