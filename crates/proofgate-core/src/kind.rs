//! Proof request kinds.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Which proof template a verification request uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofKind {
    /// Foundational ID: full name and citizen ID number.
    #[default]
    Normal,
    /// Agent credential: organization license, organization name and the
    /// employee's citizen ID.
    Agent,
}

impl ProofKind {
    /// The wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Agent => "agent",
        }
    }
}

impl std::fmt::Display for ProofKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProofKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "agent" => Ok(Self::Agent),
            other => Err(ValidationError::UnknownProofKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_kinds() {
        assert_eq!("normal".parse::<ProofKind>().unwrap(), ProofKind::Normal);
        assert_eq!("agent".parse::<ProofKind>().unwrap(), ProofKind::Agent);
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = "Agent".parse::<ProofKind>().unwrap_err();
        assert_eq!(err, ValidationError::UnknownProofKind("Agent".into()));
    }

    #[test]
    fn default_is_normal() {
        assert_eq!(ProofKind::default(), ProofKind::Normal);
        assert_eq!(serde_json::to_string(&ProofKind::Agent).unwrap(), "\"agent\"");
    }
}
