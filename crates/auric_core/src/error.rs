//! Engine Error Types

use thiserror::Error;

/// Errors that can occur in the engine layer
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unsupported channel layout: {0} channels (mono or stereo only)")]
    UnsupportedLayout(u16),

    #[error("Stream configuration error: {0}")]
    ConfigError(String),

    #[error("No audio input device found")]
    NoInputDevice,

    #[error("No audio output device found")]
    NoOutputDevice,

    #[error("Failed to build audio stream: {0}")]
    StreamBuildError(String),

    #[error("Failed to play audio stream: {0}")]
    StreamPlayError(String),

    #[error("Unknown parameter: {0}")]
    UnknownParam(String),

    #[error("Failed to spawn thread: {0}")]
    ThreadSpawn(String),

    #[error("Channel send error - receiver dropped")]
    ChannelSendError,

    #[error("State persistence error: {0}")]
    State(String),

    #[error("DSP error: {0}")]
    Dsp(#[from] auric_dsp::DspError),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
