//! Persistent State
//!
//! Saves and restores the full parameter set to disk as JSON.
//!
//! # Storage Locations
//! - Linux: `~/.config/auric/state.json`
//! - Windows: `%APPDATA%\auric\state.json`
//! - macOS: `~/Library/Application Support/auric/state.json`

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{EngineError, EngineResult};
use crate::params::{EqParams, ParamState};

/// Persisted snapshot of the full parameter set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    pub params: ParamState,
    pub saved_at: DateTime<Utc>,
}

impl PersistedState {
    /// Capture the current parameter values
    pub fn capture(params: &EqParams) -> Self {
        Self {
            params: params.snapshot(),
            saved_at: Utc::now(),
        }
    }

    /// Write the captured values back into the registry. A restored
    /// snapshot raises the dirty flag, so the next resolver pass fully
    /// reconstructs the coefficients.
    pub fn apply(&self, params: &EqParams) {
        params.restore(&self.params);
    }

    /// Load state from disk; `None` if missing or unreadable
    pub fn load() -> Option<Self> {
        let path = Self::state_path()?;
        if !path.exists() {
            return None;
        }
        match fs::File::open(&path) {
            Ok(file) => match serde_json::from_reader(file) {
                Ok(state) => {
                    info!("State loaded from {:?}", path);
                    Some(state)
                }
                Err(e) => {
                    error!("Failed to parse state file: {}", e);
                    None
                }
            },
            Err(e) => {
                error!("Failed to open state file: {}", e);
                None
            }
        }
    }

    /// Save state to disk
    pub fn save(&self) -> EngineResult<()> {
        let path = Self::state_path()
            .ok_or_else(|| EngineError::State("could not determine config path".into()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| EngineError::State(e.to_string()))?;
        }

        let file = fs::File::create(&path).map_err(|e| EngineError::State(e.to_string()))?;
        serde_json::to_writer_pretty(file, self).map_err(|e| EngineError::State(e.to_string()))?;

        info!("State saved to {:?}", path);
        Ok(())
    }

    /// The platform-specific state file path
    fn state_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "auric", "auric")
            .map(|proj| proj.config_dir().join("state.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamId;

    #[test]
    fn test_capture_apply_round_trip() {
        let params = EqParams::new();
        params.set(ParamId::Peak1Freq, 440.0);
        params.set(ParamId::LowCutSlope, 3.0);
        params.set(ParamId::HighCutBypass, 1.0);

        let state = PersistedState::capture(&params);

        let restored = EqParams::new();
        restored.take_changed();
        state.apply(&restored);

        assert_eq!(restored.get(ParamId::Peak1Freq), 440.0);
        assert_eq!(restored.get(ParamId::LowCutSlope), 3.0);
        assert!(restored.is_enabled(ParamId::HighCutBypass));
        // Restoring must trigger a resolver pass on the next tick
        assert!(restored.take_changed());
    }

    #[test]
    fn test_persisted_form_is_stable_json() {
        let params = EqParams::new();
        let state = PersistedState::capture(&params);
        let json = serde_json::to_string_pretty(&state).unwrap();
        let parsed: PersistedState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.params, state.params);
    }
}
