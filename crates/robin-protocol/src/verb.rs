use crate::Address;

/// RFC 3461 DSN `RET=` parameter on MAIL FROM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DsnReturn {
    Full,
    Hdrs,
}

/// RFC 3461 DSN `NOTIFY=` parameter on RCPT TO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NotifyOn {
    pub on_success: bool,
    pub on_failure: bool,
    pub on_delay: bool,
}

impl NotifyOn {
    #[must_use]
    pub const fn never() -> Self {
        Self {
            on_success: false,
            on_failure: false,
            on_delay: false,
        }
    }

    #[must_use]
    pub const fn default_value() -> Self {
        Self {
            on_success: true,
            on_failure: true,
            on_delay: true,
        }
    }
}

/// RFC 3461 `ORCPT=` original recipient, carried verbatim for relays and bounces.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OriginalRecipient {
    pub addr_type: String,
    pub addr: String,
}

impl std::fmt::Display for OriginalRecipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{};{}", self.addr_type, self.addr)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EhloArgs {
    pub client_name: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MailFromArgs {
    pub reverse_path: Option<Address>,
    pub size: Option<usize>,
    pub body_8bitmime: bool,
    pub envelope_id: Option<String>,
    pub dsn_ret: Option<DsnReturn>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RcptToArgs {
    pub forward_path: Address,
    pub original_recipient: Option<OriginalRecipient>,
    pub notify_on: Option<NotifyOn>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthArgs {
    pub mechanism: crate::auth::Mechanism,
    pub initial_response: Option<String>,
}

/// A parsed SMTP/ESMTP/LMTP command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Helo(EhloArgs),
    Ehlo(EhloArgs),
    Lhlo(EhloArgs),
    StartTls,
    Auth(AuthArgs),
    MailFrom(MailFromArgs),
    RcptTo(RcptToArgs),
    Data,
    Bdat { chunk_size: usize, is_last: bool },
    Rset,
    Vrfy(String),
    Help,
    Noop,
    Quit,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseVerbError {
    #[error("unknown command")]
    UnknownCommand,
    #[error("missing or malformed parameter: {0}")]
    InvalidParameter(String),
    #[error("syntax error in command line")]
    Syntax,
}

fn parse_mail_from_param(buf: &mut MailFromArgs, param: &str) -> Result<(), ParseVerbError> {
    let (key, value) = param.split_once('=').unwrap_or((param, ""));
    match key.to_ascii_uppercase().as_str() {
        "SIZE" => {
            buf.size = Some(
                value
                    .parse()
                    .map_err(|_| ParseVerbError::InvalidParameter("SIZE".to_owned()))?,
            );
        }
        "BODY" if value.eq_ignore_ascii_case("8BITMIME") => buf.body_8bitmime = true,
        "BODY" => {}
        "ENVID" => buf.envelope_id = Some(value.to_owned()),
        "RET" if value.eq_ignore_ascii_case("FULL") => buf.dsn_ret = Some(DsnReturn::Full),
        "RET" if value.eq_ignore_ascii_case("HDRS") => buf.dsn_ret = Some(DsnReturn::Hdrs),
        _ => {}
    }
    Ok(())
}

fn parse_rcpt_to_param(buf: &mut RcptToArgs, param: &str) -> Result<(), ParseVerbError> {
    let (key, value) = param.split_once('=').unwrap_or((param, ""));
    match key.to_ascii_uppercase().as_str() {
        "ORCPT" => {
            let (addr_type, addr) = value
                .split_once(';')
                .ok_or_else(|| ParseVerbError::InvalidParameter("ORCPT".to_owned()))?;
            buf.original_recipient = Some(OriginalRecipient {
                addr_type: addr_type.to_owned(),
                addr: addr.to_owned(),
            });
        }
        "NOTIFY" => {
            let mut notify = NotifyOn::never();
            for v in value.split(',') {
                match v.to_ascii_uppercase().as_str() {
                    "NEVER" => notify = NotifyOn::never(),
                    "SUCCESS" => notify.on_success = true,
                    "FAILURE" => notify.on_failure = true,
                    "DELAY" => notify.on_delay = true,
                    _ => {}
                }
            }
            buf.notify_on = Some(notify);
        }
        _ => {}
    }
    Ok(())
}

impl Verb {
    /// Parse a single command line (without the trailing CRLF).
    ///
    /// # Errors
    ///
    /// Returns [`ParseVerbError`] if the verb is unknown or its parameters
    /// are malformed.
    pub fn parse(line: &str) -> Result<Self, ParseVerbError> {
        let line = line.trim_end();
        let (verb, rest) = line
            .split_once(|c: char| c.is_whitespace())
            .unwrap_or((line, ""));
        let rest = rest.trim_start();

        match verb.to_ascii_uppercase().as_str() {
            "HELO" => Ok(Self::Helo(EhloArgs {
                client_name: rest.to_owned(),
            })),
            "EHLO" => Ok(Self::Ehlo(EhloArgs {
                client_name: rest.to_owned(),
            })),
            "LHLO" => Ok(Self::Lhlo(EhloArgs {
                client_name: rest.to_owned(),
            })),
            "STARTTLS" => Ok(Self::StartTls),
            "AUTH" => {
                let mut parts = rest.splitn(2, ' ');
                let mechanism = parts
                    .next()
                    .filter(|s| !s.is_empty())
                    .ok_or(ParseVerbError::Syntax)?
                    .parse::<crate::auth::Mechanism>()
                    .map_err(|_| ParseVerbError::InvalidParameter("mechanism".to_owned()))?;
                let initial_response = parts.next().map(str::to_owned);
                Ok(Self::Auth(AuthArgs {
                    mechanism,
                    initial_response,
                }))
            }
            "MAIL" => {
                let rest = rest
                    .strip_prefix("FROM:")
                    .or_else(|| rest.strip_prefix("From:"))
                    .ok_or(ParseVerbError::Syntax)?
                    .trim_start();
                let mut tokens = rest.split_whitespace();
                let path = tokens.next().unwrap_or("<>");
                let mut args = MailFromArgs {
                    reverse_path: path
                        .trim_matches(|c| c == '<' || c == '>')
                        .parse::<Address>()
                        .ok(),
                    ..MailFromArgs::default()
                };
                for param in tokens {
                    parse_mail_from_param(&mut args, param)?;
                }
                Ok(Self::MailFrom(args))
            }
            "RCPT" => {
                let rest = rest
                    .strip_prefix("TO:")
                    .or_else(|| rest.strip_prefix("To:"))
                    .ok_or(ParseVerbError::Syntax)?
                    .trim_start();
                let mut tokens = rest.split_whitespace();
                let path = tokens.next().ok_or(ParseVerbError::Syntax)?;
                let forward_path = path
                    .trim_matches(|c| c == '<' || c == '>')
                    .parse::<Address>()
                    .map_err(|_| ParseVerbError::InvalidParameter("forward-path".to_owned()))?;
                let mut args = RcptToArgs {
                    forward_path,
                    original_recipient: None,
                    notify_on: None,
                };
                for param in tokens {
                    parse_rcpt_to_param(&mut args, param)?;
                }
                Ok(Self::RcptTo(args))
            }
            "DATA" => Ok(Self::Data),
            "BDAT" => {
                let mut tokens = rest.split_whitespace();
                let chunk_size = tokens
                    .next()
                    .ok_or(ParseVerbError::Syntax)?
                    .parse::<usize>()
                    .map_err(|_| ParseVerbError::InvalidParameter("chunk-size".to_owned()))?;
                let is_last = tokens.next().is_some_and(|t| t.eq_ignore_ascii_case("LAST"));
                Ok(Self::Bdat {
                    chunk_size,
                    is_last,
                })
            }
            "RSET" => Ok(Self::Rset),
            "VRFY" => Ok(Self::Vrfy(rest.to_owned())),
            "HELP" => Ok(Self::Help),
            "NOOP" => Ok(Self::Noop),
            "QUIT" => Ok(Self::Quit),
            _ => Err(ParseVerbError::UnknownCommand),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ehlo() {
        assert_eq!(
            Verb::parse("EHLO mail.example.com").unwrap(),
            Verb::Ehlo(EhloArgs {
                client_name: "mail.example.com".to_owned()
            })
        );
    }

    #[test]
    fn parses_mail_from_with_params() {
        let Verb::MailFrom(args) = Verb::parse("MAIL FROM:<a@b.com> SIZE=1024 BODY=8BITMIME ENVID=abc RET=HDRS").unwrap()
        else {
            panic!("expected MailFrom");
        };
        assert_eq!(args.reverse_path.unwrap().full(), "a@b.com");
        assert_eq!(args.size, Some(1024));
        assert!(args.body_8bitmime);
        assert_eq!(args.envelope_id.as_deref(), Some("abc"));
        assert_eq!(args.dsn_ret, Some(DsnReturn::Hdrs));
    }

    #[test]
    fn parses_rcpt_to_with_notify() {
        let Verb::RcptTo(args) =
            Verb::parse("RCPT TO:<c@d.com> NOTIFY=SUCCESS,FAILURE").unwrap()
        else {
            panic!("expected RcptTo");
        };
        assert_eq!(args.forward_path.full(), "c@d.com");
        let notify = args.notify_on.unwrap();
        assert!(notify.on_success);
        assert!(notify.on_failure);
        assert!(!notify.on_delay);
    }

    #[test]
    fn parses_bdat_last() {
        assert_eq!(
            Verb::parse("BDAT 128 LAST").unwrap(),
            Verb::Bdat {
                chunk_size: 128,
                is_last: true
            }
        );
    }

    #[test]
    fn rejects_unknown_verb() {
        assert!(matches!(
            Verb::parse("FOOBAR"),
            Err(ParseVerbError::UnknownCommand)
        ));
    }
}
