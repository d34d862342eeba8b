//! Screen types a form layout can target.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ConfigError;

/// The role-facing view context a layout is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenType {
    /// Record submission (the submitter's view).
    #[serde(alias = "submitter")]
    Submission,
    /// Review and approval of a submitted record.
    #[serde(alias = "reviewer", alias = "approver")]
    Approval,
    /// Tenant administration.
    #[serde(alias = "administrator")]
    Administration,
    /// Read-only end-user view.
    #[serde(alias = "readonly", alias = "end_user_readonly")]
    ReadOnly,
}

impl ScreenType {
    /// All screen types, in declaration order.
    pub const ALL: [ScreenType; 4] = [
        ScreenType::Submission,
        ScreenType::Approval,
        ScreenType::Administration,
        ScreenType::ReadOnly,
    ];

    /// Wire name of the screen type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenType::Submission => "submission",
            ScreenType::Approval => "approval",
            ScreenType::Administration => "administration",
            ScreenType::ReadOnly => "read_only",
        }
    }
}

impl fmt::Display for ScreenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScreenType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "submission" | "submitter" => Ok(ScreenType::Submission),
            "approval" | "reviewer" | "approver" => Ok(ScreenType::Approval),
            "administration" | "administrator" => Ok(ScreenType::Administration),
            "read_only" | "readonly" | "end_user_readonly" => Ok(ScreenType::ReadOnly),
            other => Err(ConfigError::Config(format!("Unknown screen type: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("approver".parse::<ScreenType>().unwrap(), ScreenType::Approval);
        assert_eq!("read-only".parse::<ScreenType>().unwrap(), ScreenType::ReadOnly);
        assert_eq!("Submission".parse::<ScreenType>().unwrap(), ScreenType::Submission);
        assert!("dashboard".parse::<ScreenType>().is_err());
    }

    #[test]
    fn test_serde_aliases_and_wire_names() {
        let parsed: ScreenType = serde_yaml::from_str("administrator").unwrap();
        assert_eq!(parsed, ScreenType::Administration);
        assert_eq!(
            serde_json::to_string(&ScreenType::ReadOnly).unwrap(),
            "\"read_only\""
        );
    }
}
