//! Auric Core - EQ Engine
//!
//! This crate provides the engine layer of Auric EQ, including:
//! - The 19-entry atomic parameter registry shared by every thread
//! - The stereo processor: per-block settings resolution and the
//!   real-time processing entry points
//! - The visualization engine: a ~60 Hz thread that drains the sample
//!   queues, runs spectrum analysis and publishes render-ready frames
//! - Stream plumbing (CPAL) for running the EQ standalone
//! - Persisted parameter state
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Host / UI Thread                        │
//! │   set_param ──▶ atomic registry      AudioEngine ◀──events  │
//! └─────────────────────────────────────────────────────────────┘
//!              │ (atomics + dirty flag)        ▲ crossbeam-channel
//!              ▼                               │
//! ┌──────────────────────────┐   ┌─────────────────────────────┐
//! │       Audio Thread       │   │    Visualization Thread     │
//! │  resolve ─▶ EqProcessor ─┼──▶│  FIFOs ─▶ FFT ─▶ paths      │
//! │  (zero allocation path)  │   │  response chain (own copy)  │
//! └──────────────────────────┘   └─────────────────────────────┘
//!            sample queues (lock-free SPSC)
//! ```

mod analyzer;
mod config;
mod engine;
mod error;
mod message;
mod params;
mod processor;
mod state;
mod stream;

pub use analyzer::{Analyzer, AnalyzerFrame};
pub use config::{EngineConfig, StreamConfig};
pub use engine::AudioEngine;
pub use error::{EngineError, EngineResult};
pub use message::{Command, Event};
pub use params::{EqParams, ParamId, ParamRange, ParamState, Skew, PARAM_COUNT};
pub use processor::{AnalyzerTaps, EqProcessor};
pub use state::PersistedState;
pub use stream::{default_devices, AudioStream};

// Re-export DSP types for convenience
pub use auric_dsp::{ChainPosition, ChainSettings, MonoChain, PeakBand, PlotPath, Rect, Slope};
