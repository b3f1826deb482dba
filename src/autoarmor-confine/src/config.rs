//! Confinement configuration snapshot.
//!
//! The host's configuration store owns persistence; this module only
//! deserializes a snapshot of the three settable values. The snapshot
//! is captured once per job setup and never mutated afterwards, so the
//! decision logic is pure given (mode, ignore-absence, mask-commands,
//! probe results).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfineError, Result};

/// Process-wide confinement mode.
///
/// Any persisted value outside these three is a configuration
/// corruption error, surfaced at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfinementMode {
    /// Confinement is off; commands pass through unmodified and no
    /// probes run. The fast path for hosts not using the feature.
    #[default]
    Disabled,

    /// Confinement violations are logged, not blocked.
    Complain,

    /// Confinement violations are blocked.
    Enforce,
}

impl ConfinementMode {
    /// True iff violations are blocked rather than only logged.
    pub fn is_enforce(&self) -> bool {
        matches!(self, ConfinementMode::Enforce)
    }

    /// The mode argument expected by the profile tool.
    pub fn profile_arg(&self) -> &'static str {
        if self.is_enforce() { "enforce" } else { "complain" }
    }
}

impl std::fmt::Display for ConfinementMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfinementMode::Disabled => write!(f, "disabled"),
            ConfinementMode::Complain => write!(f, "complain"),
            ConfinementMode::Enforce => write!(f, "enforce"),
        }
    }
}

impl std::str::FromStr for ConfinementMode {
    type Err = ConfineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "disabled" => Ok(ConfinementMode::Disabled),
            "complain" => Ok(ConfinementMode::Complain),
            "enforce" => Ok(ConfinementMode::Enforce),
            other => Err(ConfineError::ConfigCorrupt(format!(
                "unknown mode `{other}`, expected disabled, complain, or enforce"
            ))),
        }
    }
}

/// Immutable configuration snapshot for one job setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfineConfig {
    /// Confinement mode.
    #[serde(default)]
    pub mode: ConfinementMode,

    /// When host confinement is inactive, run the build unconfined
    /// (with a warning) instead of failing it.
    #[serde(default = "default_true")]
    pub ignore_absence: bool,

    /// Hide the wrapper prefix (and probe command lines) from the
    /// build console.
    #[serde(default = "default_true")]
    pub mask_commands: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ConfineConfig {
    fn default() -> Self {
        Self {
            mode: ConfinementMode::Disabled,
            ignore_absence: true,
            mask_commands: true,
        }
    }
}

impl ConfineConfig {
    /// Parse a snapshot from TOML. Unknown fields and unrecognized
    /// mode values are configuration corruption.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|err| ConfineError::ConfigCorrupt(err.to_string()))
    }

    /// Load a snapshot from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            ConfineError::ConfigCorrupt(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!(
            ConfinementMode::from_str("disabled").unwrap(),
            ConfinementMode::Disabled
        );
        assert_eq!(
            ConfinementMode::from_str("complain").unwrap(),
            ConfinementMode::Complain
        );
        assert_eq!(
            ConfinementMode::from_str("enforce").unwrap(),
            ConfinementMode::Enforce
        );
    }

    #[test]
    fn test_mode_parse_rejects_unknown_values() {
        let err = ConfinementMode::from_str("audit").unwrap_err();
        assert!(matches!(err, ConfineError::ConfigCorrupt(_)));
    }

    #[test]
    fn test_mode_display_round_trip() {
        for mode in [
            ConfinementMode::Disabled,
            ConfinementMode::Complain,
            ConfinementMode::Enforce,
        ] {
            assert_eq!(
                ConfinementMode::from_str(&mode.to_string()).unwrap(),
                mode
            );
        }
    }

    #[test]
    fn test_profile_arg() {
        assert_eq!(ConfinementMode::Enforce.profile_arg(), "enforce");
        assert_eq!(ConfinementMode::Complain.profile_arg(), "complain");
    }

    #[test]
    fn test_config_defaults() {
        let config = ConfineConfig::from_toml_str("").unwrap();
        assert_eq!(config.mode, ConfinementMode::Disabled);
        assert!(config.ignore_absence);
        assert!(config.mask_commands);
        assert_eq!(config, ConfineConfig::default());
    }

    #[test]
    fn test_config_parse() {
        let config = ConfineConfig::from_toml_str(
            "mode = \"enforce\"\nignore-absence = false\nmask-commands = false\n",
        )
        .unwrap();
        assert_eq!(config.mode, ConfinementMode::Enforce);
        assert!(!config.ignore_absence);
        assert!(!config.mask_commands);
    }

    #[test]
    fn test_config_rejects_corrupt_mode() {
        let err = ConfineConfig::from_toml_str("mode = \"paranoid\"\n").unwrap_err();
        assert!(matches!(err, ConfineError::ConfigCorrupt(_)));
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        let err = ConfineConfig::from_toml_str("modes = \"enforce\"\n").unwrap_err();
        assert!(matches!(err, ConfineError::ConfigCorrupt(_)));
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autoarmor.toml");
        std::fs::write(&path, "mode = \"complain\"\n").unwrap();

        let config = ConfineConfig::load(&path).unwrap();
        assert_eq!(config.mode, ConfinementMode::Complain);
    }
}
