use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Administrative actions a locking rule can allow or deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Config,
    Remove,
    Hide,
    /// Move a widget into the region from elsewhere.
    MoveIn,
    /// Move a widget within or out of its position.
    Move,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Config,
        Action::Remove,
        Action::Hide,
        Action::MoveIn,
        Action::Move,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Config => "config",
            Action::Remove => "remove",
            Action::Hide => "hide",
            Action::MoveIn => "movein",
            Action::Move => "move",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| Error::UnknownAction(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_action() {
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn unknown_action_is_an_error() {
        let err = "delete".parse::<Action>().unwrap_err();
        assert!(matches!(err, Error::UnknownAction(name) if name == "delete"));
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Action::MoveIn).unwrap(), "\"movein\"");
    }
}
