use std::fmt;

/// Operation requested by the controller through `HOSTWIRE_COMMAND`.
///
/// Values outside the vocabulary are kept verbatim in `Other` so that the
/// rejection happens during validation with the offending value in hand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    CreateInstance,
    DeleteInstance,
    GetInstance,
    ListInstances,
    StartInstance,
    StopInstance,
    RemoveAllInstances,
    GetVersion,
    Other(String),
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::CreateInstance,
        Command::DeleteInstance,
        Command::GetInstance,
        Command::ListInstances,
        Command::StartInstance,
        Command::StopInstance,
        Command::RemoveAllInstances,
        Command::GetVersion,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Command::CreateInstance => "CreateInstance",
            Command::DeleteInstance => "DeleteInstance",
            Command::GetInstance => "GetInstance",
            Command::ListInstances => "ListInstances",
            Command::StartInstance => "StartInstance",
            Command::StopInstance => "StopInstance",
            Command::RemoveAllInstances => "RemoveAllInstances",
            Command::GetVersion => "GetVersion",
            Command::Other(raw) => raw,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Command::Other(raw) if raw.is_empty())
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Command::Other(_))
    }
}

impl Default for Command {
    fn default() -> Self {
        Command::Other(String::new())
    }
}

impl From<&str> for Command {
    fn from(raw: &str) -> Self {
        Command::ALL
            .iter()
            .find(|known| known.as_str() == raw)
            .cloned()
            .unwrap_or_else(|| Command::Other(raw.to_string()))
    }
}

impl From<String> for Command {
    fn from(raw: String) -> Self {
        Command::from(raw.as_str())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
