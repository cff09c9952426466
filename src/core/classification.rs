//! Classification verdicts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which output stream a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Diagnostic log output (also the verdict for noise and empty lines).
    Log,
    /// Interactive shell response.
    CommandResponse,
}

impl Classification {
    /// Short stream label used in terminal output.
    #[must_use]
    pub const fn stream(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::CommandResponse => "command",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stream())
    }
}
