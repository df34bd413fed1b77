//! Message Types for Thread Communication
//!
//! Commands flow from the host/UI thread to the visualization engine;
//! events flow back. Parameter values themselves travel through the atomic
//! registry, not through these channels.

use serde::{Deserialize, Serialize};

use auric_dsp::Rect;

use crate::analyzer::AnalyzerFrame;

/// Commands sent to the visualization engine
#[derive(Debug, Clone)]
pub enum Command {
    /// Set a parameter by its registered name
    SetParam { name: String, value: f32 },

    /// Enable or disable the spectrum analyzer pipeline
    SetAnalyzerEnabled(bool),

    /// Tell the analyzer where the response display lives
    SetDisplayBounds(Rect),

    /// Request current state (triggers StateUpdate event)
    RequestState,

    /// Shut down the visualization thread
    Shutdown,
}

/// Events sent from the visualization engine to the UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    /// New visualization frame (~60 Hz while running)
    Frame(AnalyzerFrame),

    /// Current state snapshot
    StateUpdate {
        analyzer_enabled: bool,
        params: Vec<(String, f32)>,
    },

    /// Error occurred
    Error { message: String },

    /// The visualization thread has stopped
    Stopped,
}

impl Event {
    /// Create an error event from any error type
    pub fn error<E: std::fmt::Display>(err: E) -> Self {
        Event::Error {
            message: err.to_string(),
        }
    }
}
