//! Stereo Processor
//!
//! Owns the two per-channel filter chains and the per-channel sample
//! queues feeding the spectrum analyzer. The settings resolver runs here:
//! once at `prepare` and once per block, translating the current parameter
//! snapshot into coefficients and bypass flags for both chains.
//!
//! # Real-time Safety
//!
//! The `process_*` entry points perform no allocations, no locks and no
//! syscalls. Everything size-dependent is allocated in `prepare`.

use std::sync::Arc;

use auric_dsp::{resolve_chain, FifoConsumer, MonoChain, SingleChannelSampleFifo};

use crate::error::{EngineError, EngineResult};
use crate::params::{EqParams, ParamId};

/// Consumer handles for the visualization side, produced by `prepare`
pub struct AnalyzerTaps {
    pub left: FifoConsumer<Vec<f32>>,
    pub right: FifoConsumer<Vec<f32>>,
    pub block_size: usize,
}

/// The stereo processing core: two identical mono chains driven by one
/// shared parameter registry.
pub struct EqProcessor {
    params: Arc<EqParams>,
    left: MonoChain,
    right: MonoChain,
    left_fifo: SingleChannelSampleFifo,
    right_fifo: SingleChannelSampleFifo,
    sample_rate: f32,
    max_block_size: usize,
}

impl EqProcessor {
    /// Create a prepared processor.
    ///
    /// Returns the processor together with the FIFO consumer handles the
    /// visualization thread will poll.
    pub fn new(
        params: Arc<EqParams>,
        sample_rate: f32,
        max_block_size: usize,
    ) -> EngineResult<(Self, AnalyzerTaps)> {
        Self::validate(sample_rate, max_block_size)?;

        let (left_fifo, left_rx) = SingleChannelSampleFifo::new(max_block_size);
        let (right_fifo, right_rx) = SingleChannelSampleFifo::new(max_block_size);

        let mut processor = Self {
            params,
            left: MonoChain::new(),
            right: MonoChain::new(),
            left_fifo,
            right_fifo,
            sample_rate,
            max_block_size,
        };
        processor.update_filters();

        Ok((
            processor,
            AnalyzerTaps {
                left: left_rx,
                right: right_rx,
                block_size: max_block_size,
            },
        ))
    }

    /// Re-initialize for a new session (sample-rate changes land here, not
    /// in the per-block path). Old consumer handles go stale; the returned
    /// taps replace them.
    pub fn prepare(
        &mut self,
        sample_rate: f32,
        max_block_size: usize,
    ) -> EngineResult<AnalyzerTaps> {
        Self::validate(sample_rate, max_block_size)?;

        let (left_fifo, left_rx) = SingleChannelSampleFifo::new(max_block_size);
        let (right_fifo, right_rx) = SingleChannelSampleFifo::new(max_block_size);
        self.left_fifo = left_fifo;
        self.right_fifo = right_fifo;
        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.left.reset();
        self.right.reset();
        self.update_filters();

        Ok(AnalyzerTaps {
            left: left_rx,
            right: right_rx,
            block_size: max_block_size,
        })
    }

    fn validate(sample_rate: f32, max_block_size: usize) -> EngineResult<()> {
        if !(sample_rate > 0.0) {
            return Err(EngineError::Dsp(auric_dsp::DspError::InvalidSampleRate(
                sample_rate,
            )));
        }
        if max_block_size == 0 {
            return Err(EngineError::Dsp(auric_dsp::DspError::InvalidBlockSize));
        }
        Ok(())
    }

    /// Whether a channel layout can be processed at all. Anything else
    /// must be rejected at configuration time.
    pub fn supports_layout(channels: usize) -> bool {
        matches!(channels, 1 | 2)
    }

    /// Settings Resolver: one snapshot, one resolved update, applied to
    /// both chains so they never diverge.
    fn update_filters(&mut self) {
        let settings = self.params.chain_settings().clamped(self.sample_rate);
        match resolve_chain(&settings, self.sample_rate) {
            Ok(update) => {
                self.left.apply(&update);
                self.right.apply(&update);
            }
            Err(_) => {
                // Clamped settings cannot fail the design; keep the
                // previous coefficients rather than glitch
                debug_assert!(false, "filter design failed for clamped settings");
            }
        }
    }

    /// Process one stereo block in place (planar)
    pub fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len(), "channel buffers must match");
        debug_assert!(left.len() <= self.max_block_size);

        self.update_filters();
        self.left.process_buffer(left);
        self.right.process_buffer(right);

        if self.analyzer_enabled() {
            self.left_fifo.push_block(left);
            self.right_fifo.push_block(right);
        }
    }

    /// Process one mono block in place
    pub fn process_mono(&mut self, samples: &mut [f32]) {
        debug_assert!(samples.len() <= self.max_block_size);

        self.update_filters();
        self.left.process_buffer(samples);

        if self.analyzer_enabled() {
            self.left_fifo.push_block(samples);
            self.right_fifo.push_block(samples);
        }
    }

    /// Process an interleaved block in place.
    ///
    /// Buffer format for stereo: [L0, R0, L1, R1, ...]
    pub fn process_interleaved(&mut self, buffer: &mut [f32], channels: usize) {
        debug_assert!(Self::supports_layout(channels), "layout must be validated at prepare");
        match channels {
            1 => self.process_mono(buffer),
            _ => {
                debug_assert!(buffer.len() / 2 <= self.max_block_size);
                self.update_filters();
                let analyzer = self.analyzer_enabled();
                for frame in buffer.chunks_exact_mut(2) {
                    frame[0] = self.left.process_sample(frame[0]);
                    frame[1] = self.right.process_sample(frame[1]);
                    if analyzer {
                        self.left_fifo.push_sample(frame[0]);
                        self.right_fifo.push_sample(frame[1]);
                    }
                }
            }
        }
    }

    fn analyzer_enabled(&self) -> bool {
        self.params.is_enabled(ParamId::AnalyzerEnabled)
    }

    /// Clear every delay line (call when switching sources)
    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn params(&self) -> &Arc<EqParams> {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_processor() -> (EqProcessor, AnalyzerTaps, Arc<EqParams>) {
        let params = Arc::new(EqParams::new());
        let (processor, taps) = EqProcessor::new(Arc::clone(&params), 48_000.0, 512).unwrap();
        (processor, taps, params)
    }

    fn test_signal(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i as f32 * 0.09).sin() * 0.5).collect()
    }

    #[test]
    fn test_identical_channels_stay_identical() {
        let (mut processor, _taps, params) = make_processor();
        params.set(ParamId::Peak1Gain, 9.0);
        params.set(ParamId::LowCutFreq, 200.0);

        let mut left = test_signal(512);
        let mut right = left.clone();
        processor.process_stereo(&mut left, &mut right);
        assert_eq!(left, right);
    }

    #[test]
    fn test_fully_bypassed_chain_passes_through() {
        let (mut processor, _taps, params) = make_processor();
        for id in [
            ParamId::LowCutBypass,
            ParamId::HighCutBypass,
            ParamId::Peak1Bypass,
            ParamId::Peak2Bypass,
            ParamId::Peak3Bypass,
        ] {
            params.set(id, 1.0);
        }

        let mut left = test_signal(256);
        let mut right = test_signal(256);
        let (expected_l, expected_r) = (left.clone(), right.clone());
        processor.process_stereo(&mut left, &mut right);
        assert_eq!(left, expected_l);
        assert_eq!(right, expected_r);
    }

    #[test]
    fn test_processed_blocks_reach_analyzer_taps() {
        let (mut processor, mut taps, _params) = make_processor();

        let mut left = test_signal(512);
        let mut right = test_signal(512);
        processor.process_stereo(&mut left, &mut right);

        let mut block = vec![0.0f32; 512];
        assert!(taps.left.pop(&mut block));
        // The queue carries the post-EQ signal
        assert_eq!(block, left);
        assert!(taps.right.pop(&mut block));
        assert_eq!(block, right);
    }

    #[test]
    fn test_disabled_analyzer_pushes_nothing() {
        let (mut processor, mut taps, params) = make_processor();
        params.set(ParamId::AnalyzerEnabled, 0.0);

        let mut left = test_signal(512);
        let mut right = test_signal(512);
        processor.process_stereo(&mut left, &mut right);

        let mut block = vec![0.0f32; 512];
        assert!(!taps.left.pop(&mut block));
        assert!(!taps.right.pop(&mut block));
    }

    #[test]
    fn test_mono_block_feeds_both_taps() {
        let (mut processor, mut taps, _params) = make_processor();
        let mut samples = test_signal(512);
        processor.process_mono(&mut samples);

        let mut block = vec![0.0f32; 512];
        assert!(taps.left.pop(&mut block));
        assert!(taps.right.pop(&mut block));
    }

    #[test]
    fn test_interleaved_matches_planar() {
        let (mut planar, _t1, params_a) = make_processor();
        let (mut interleaved, _t2, params_b) = make_processor();
        params_a.set(ParamId::Peak2Gain, -6.0);
        params_b.set(ParamId::Peak2Gain, -6.0);

        let mut left = test_signal(128);
        let mut right: Vec<f32> = test_signal(128).iter().map(|s| -s).collect();
        let mut inter: Vec<f32> = left
            .iter()
            .zip(&right)
            .flat_map(|(&l, &r)| [l, r])
            .collect();

        planar.process_stereo(&mut left, &mut right);
        interleaved.process_interleaved(&mut inter, 2);

        for (i, frame) in inter.chunks_exact(2).enumerate() {
            assert_eq!(frame[0], left[i]);
            assert_eq!(frame[1], right[i]);
        }
    }

    #[test]
    fn test_resolver_is_idempotent() {
        let (mut processor, _taps, params) = make_processor();
        params.set(ParamId::Peak1Gain, 12.0);

        // Re-resolving the same snapshot between runs must not disturb
        // the output
        let mut b1 = test_signal(64);
        let mut b2 = test_signal(64);
        processor.process_stereo(&mut b1, &mut b2);

        processor.reset();
        let mut c1 = test_signal(64);
        let mut c2 = test_signal(64);
        processor.process_stereo(&mut c1, &mut c2);
        assert_eq!(b1, c1);
    }

    #[test]
    fn test_prepare_rejects_invalid_config() {
        let params = Arc::new(EqParams::new());
        assert!(EqProcessor::new(Arc::clone(&params), 0.0, 512).is_err());
        assert!(EqProcessor::new(Arc::clone(&params), 48_000.0, 0).is_err());
    }

    #[test]
    fn test_prepare_reinitializes() {
        let (mut processor, _taps, _params) = make_processor();
        let taps = processor.prepare(96_000.0, 1024).unwrap();
        assert_eq!(processor.sample_rate(), 96_000.0);
        assert_eq!(processor.max_block_size(), 1024);
        assert_eq!(taps.block_size, 1024);
    }

    #[test]
    fn test_layout_support() {
        assert!(EqProcessor::supports_layout(1));
        assert!(EqProcessor::supports_layout(2));
        assert!(!EqProcessor::supports_layout(0));
        assert!(!EqProcessor::supports_layout(6));
    }
}
