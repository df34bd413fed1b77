//! Auric DSP - Digital Signal Processing Module
//!
//! This crate provides the signal-processing core of Auric EQ, including:
//! - Fixed 5-position filter chain per channel: low cut, three parametric
//!   peaks, high cut (BiQuad sections, RBJ designs)
//! - Pure coefficient calculator with Butterworth cascades for the cut
//!   slopes (12/24/36/48 dB per octave)
//! - Lock-free SPSC sample-block FIFO for audio -> visualization handoff
//! - Windowed-FFT spectrum analysis pipeline producing renderable paths
//! - Analytic frequency-response evaluation for the response curve
//!
//! # Architecture
//!
//! The processing chain follows a strict "no allocation in the audio
//! callback" rule. Coefficients are recomputed from an immutable settings
//! snapshot at block boundaries; the visualization side works exclusively
//! on its own chain instance and on blocks copied through the FIFO.

mod coefficients;
mod error;
mod fifo;
mod filter;
mod response;
mod settings;
mod spectrum;

pub use coefficients::{
    make_high_cut_coefficients, make_low_cut_coefficients, make_peak_coefficients, resolve_chain,
    unity_coefficients, ChainUpdate, CutCoefficients, MAX_CUT_SECTIONS,
};
pub use error::DspError;
pub use fifo::{
    fifo, fifo_with_capacity, FifoConsumer, FifoProducer, SingleChannelSampleFifo, FIFO_CAPACITY,
};
pub use filter::{ChainPosition, CutFilter, FilterStage, MonoChain};
pub use response::{
    chain_magnitude, map_from_log10, map_to_log10, response_curve_path, response_magnitudes_db,
    section_magnitude, PlotPath, Rect, CURVE_MAX_DB, CURVE_MIN_DB,
};
pub use settings::{ChainSettings, PeakBand, Slope, MAX_FREQ, MIN_FREQ};
pub use spectrum::{
    gain_to_db, FftFrameGenerator, PathProducer, SpectrumPathBuilder, DEFAULT_FLOOR_DB, FFT_ORDER,
    FFT_SIZE, NUM_BINS,
};
