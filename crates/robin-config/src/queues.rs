/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

/// Names of the on-disk spool directories a [`crate::Config`] exposes to the
/// queue backend. Relative to the configured storage root unless the value
/// is an absolute path.
#[derive(Debug, serde::Deserialize, serde::Serialize, PartialEq, Eq)]
pub struct Queues {
    /// Directory holding messages held for quarantine review.
    #[serde(default = "Queues::default_quarantine")]
    pub quarantine: String,
    /// Directory holding messages with no deliverable recipient.
    #[serde(default = "Queues::default_no_route")]
    pub no_route: String,
    /// Directory holding messages that exhausted their retry budget.
    #[serde(default = "Queues::default_dead")]
    pub dead: String,
    /// Directory of messages awaiting pickup by the delivery stage.
    #[serde(default = "Queues::default_working")]
    pub working: String,
}

impl Queues {
    fn default_quarantine() -> String {
        "quarantine".to_string()
    }

    fn default_no_route() -> String {
        "no-route".to_string()
    }

    fn default_dead() -> String {
        "dead".to_string()
    }

    fn default_working() -> String {
        "working".to_string()
    }
}

impl Default for Queues {
    fn default() -> Self {
        Self {
            quarantine: Self::default_quarantine(),
            no_route: Self::default_no_route(),
            dead: Self::default_dead(),
            working: Self::default_working(),
        }
    }
}
