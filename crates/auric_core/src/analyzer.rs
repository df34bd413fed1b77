//! Visualization-Side Analysis
//!
//! Owns the response-curve chain (a separate instance from the audio
//! chains, so there is no shared mutable state between real-time
//! processing and rendering) plus one spectrum path producer per channel.
//! Driven by the engine's ~60 Hz tick.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use auric_dsp::{
    chain_magnitude, resolve_chain, response_curve_path, response_magnitudes_db, MonoChain,
    PathProducer, Rect,
};

use crate::params::{EqParams, ParamId};
use crate::processor::AnalyzerTaps;

/// One rendered visualization frame: the response curve plus both
/// channels' spectrum paths, all in display coordinates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzerFrame {
    pub response: Vec<(f32, f32)>,
    pub left_spectrum: Vec<(f32, f32)>,
    pub right_spectrum: Vec<(f32, f32)>,
}

/// The visualization pipeline driver
pub struct Analyzer {
    params: Arc<EqParams>,
    sample_rate: f32,
    response_chain: MonoChain,
    left: PathProducer,
    right: PathProducer,
}

impl Analyzer {
    pub fn new(params: Arc<EqParams>, taps: AnalyzerTaps, sample_rate: f32) -> Self {
        let mut analyzer = Self {
            params,
            sample_rate,
            response_chain: MonoChain::new(),
            left: PathProducer::new(taps.left, taps.block_size),
            right: PathProducer::new(taps.right, taps.block_size),
        };
        analyzer.update_chain();
        analyzer
    }

    /// Rebuild the response chain from the current parameters
    fn update_chain(&mut self) {
        let settings = self.params.chain_settings().clamped(self.sample_rate);
        if let Ok(update) = resolve_chain(&settings, self.sample_rate) {
            self.response_chain.apply(&update);
        }
    }

    pub fn enabled(&self) -> bool {
        self.params.is_enabled(ParamId::AnalyzerEnabled)
    }

    /// One visualization tick: consume the dirty flag, drive the spectrum
    /// pipelines (or just drain them while disabled) and emit a frame.
    pub fn tick(&mut self, bounds: Rect) -> AnalyzerFrame {
        if self.params.take_changed() {
            self.update_chain();
        }

        if self.enabled() {
            self.left.process(bounds, self.sample_rate);
            self.right.process(bounds, self.sample_rate);
        } else {
            self.left.drain();
            self.right.drain();
        }

        let magnitudes =
            response_magnitudes_db(&self.response_chain, self.sample_rate as f64, bounds.width as usize);
        let response = response_curve_path(&magnitudes, bounds);

        AnalyzerFrame {
            response: response.points,
            left_spectrum: self.left.path().points.clone(),
            right_spectrum: self.right.path().points.clone(),
        }
    }

    /// Resolved chain magnitude at one frequency (the response-curve read
    /// accessor for the GUI)
    pub fn magnitude_at(&self, freq: f64) -> f64 {
        chain_magnitude(&self.response_chain, freq, self.sample_rate as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::EqProcessor;

    fn make_analyzer() -> (Analyzer, EqProcessor, Arc<EqParams>) {
        let params = Arc::new(EqParams::new());
        let (processor, taps) = EqProcessor::new(Arc::clone(&params), 48_000.0, 512).unwrap();
        let analyzer = Analyzer::new(Arc::clone(&params), taps, 48_000.0);
        (analyzer, processor, params)
    }

    fn bounds() -> Rect {
        Rect::new(0.0, 0.0, 256.0, 128.0)
    }

    #[test]
    fn test_tick_produces_response_curve() {
        let (mut analyzer, _processor, _params) = make_analyzer();
        let frame = analyzer.tick(bounds());
        assert_eq!(frame.response.len(), 256);
        // No audio yet: spectra are empty, response is not
        assert!(frame.left_spectrum.is_empty());
    }

    #[test]
    fn test_parameter_change_moves_the_curve() {
        let (mut analyzer, _processor, params) = make_analyzer();
        let flat = analyzer.magnitude_at(1_000.0);
        assert!((flat - 1.0).abs() < 0.05);

        params.set(ParamId::Peak1Freq, 1_000.0);
        params.set(ParamId::Peak1Gain, 24.0);
        // The chain only updates on the next tick (dirty-flag poll)
        assert!((analyzer.magnitude_at(1_000.0) - flat).abs() < 1e-9);
        analyzer.tick(bounds());

        let boosted = analyzer.magnitude_at(1_000.0);
        assert!((boosted - 15.85).abs() < 0.5, "got {boosted}");
    }

    #[test]
    fn test_audio_flows_into_spectrum() {
        let (mut analyzer, mut processor, _params) = make_analyzer();

        let mut left: Vec<f32> = (0..512)
            .map(|i| (2.0 * std::f32::consts::PI * 1_000.0 * i as f32 / 48_000.0).sin())
            .collect();
        let mut right = left.clone();
        for _ in 0..8 {
            processor.process_stereo(&mut left, &mut right);
        }

        let frame = analyzer.tick(bounds());
        assert!(!frame.left_spectrum.is_empty());
        assert!(!frame.right_spectrum.is_empty());
    }

    #[test]
    fn test_disabled_analyzer_drains_without_paths() {
        let (mut analyzer, mut processor, params) = make_analyzer();

        // Audio arrives while enabled, gets queued...
        let mut left = vec![0.25f32; 512];
        let mut right = vec![0.25f32; 512];
        processor.process_stereo(&mut left, &mut right);

        // ...but the analyzer is switched off before the tick
        params.set(ParamId::AnalyzerEnabled, 0.0);
        let frame = analyzer.tick(bounds());
        assert!(frame.left_spectrum.is_empty());
        assert!(frame.right_spectrum.is_empty());
    }

    #[test]
    fn test_frame_serializes() {
        let (mut analyzer, _processor, _params) = make_analyzer();
        let frame = analyzer.tick(bounds());
        let json = serde_json::to_string(&frame).unwrap();
        let parsed: AnalyzerFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.response.len(), frame.response.len());
    }
}
