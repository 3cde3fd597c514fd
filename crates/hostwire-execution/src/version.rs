use crate::error::ExecutionError;
use std::fmt;
use std::str::FromStr;

/// Revision of the execution protocol, ordered oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InterfaceVersion {
    V010,
    V011,
}

impl InterfaceVersion {
    pub const OLDEST: InterfaceVersion = InterfaceVersion::V010;
    pub const LATEST: InterfaceVersion = InterfaceVersion::V011;
    pub const SUPPORTED: [InterfaceVersion; 2] = [InterfaceVersion::V010, InterfaceVersion::V011];

    pub fn as_str(&self) -> &'static str {
        match self {
            InterfaceVersion::V010 => "v0.1.0",
            InterfaceVersion::V011 => "v0.1.1",
        }
    }

    /// Picks the protocol revision for a raw `HOSTWIRE_INTERFACE_VERSION`.
    ///
    /// Controllers that predate the variable leave it unset, so an empty
    /// value selects the oldest revision.
    pub fn negotiate(raw: &str) -> Result<Self, ExecutionError> {
        if raw.trim().is_empty() {
            return Ok(Self::OLDEST);
        }
        raw.parse()
    }
}

impl FromStr for InterfaceVersion {
    type Err = ExecutionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
        match bare {
            "0.1.0" => Ok(InterfaceVersion::V010),
            "0.1.1" => Ok(InterfaceVersion::V011),
            _ => Err(ExecutionError::UnsupportedInterfaceVersion(raw.to_string())),
        }
    }
}

impl fmt::Display for InterfaceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
