//! Filter Stages and the Mono Processing Chain
//!
//! The chain topology is fixed: LowCut -> Peak1 -> Peak2 -> Peak3 ->
//! HighCut, five positions per channel, each independently bypassable.
//! Cut positions are cascades of up to four 2nd-order sections; peak
//! positions are single sections.
//!
//! # Real-time Safety
//!
//! `process_*` performs no allocations and no syscalls. Coefficient swaps
//! happen only between `process` calls, at block granularity.

use biquad::{Biquad, Coefficients, DirectForm2Transposed};

use crate::coefficients::{unity_coefficients, ChainUpdate, CutCoefficients, MAX_CUT_SECTIONS};

/// The five fixed roles of the mono chain, in processing order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPosition {
    LowCut,
    Peak1,
    Peak2,
    Peak3,
    HighCut,
}

/// A single 2nd-order IIR section with an independent bypass flag.
///
/// Bypass is an identity pass-through: the delay line is neither advanced
/// nor flushed, so re-enabling continues from the state the stage had when
/// it was disabled and avoids discontinuity clicks.
pub struct FilterStage {
    // DirectForm2Transposed: better numerical stability than DF1
    filter: DirectForm2Transposed<f32>,
    coefficients: Coefficients<f32>,
    bypassed: bool,
}

impl FilterStage {
    pub fn new(coefficients: Coefficients<f32>) -> Self {
        Self {
            filter: DirectForm2Transposed::<f32>::new(coefficients),
            coefficients,
            bypassed: false,
        }
    }

    /// A pass-through stage (identity coefficients)
    pub fn unity() -> Self {
        Self::new(unity_coefficients())
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        if self.bypassed {
            sample
        } else {
            self.filter.run(sample)
        }
    }

    /// Swap in a new immutable coefficient snapshot. The delay-line state
    /// carries over; call between blocks, not mid-block.
    pub fn set_coefficients(&mut self, coefficients: Coefficients<f32>) {
        self.coefficients = coefficients;
        self.filter.update_coefficients(coefficients);
    }

    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// Current coefficient snapshot (for response-curve evaluation)
    pub fn coefficients(&self) -> &Coefficients<f32> {
        &self.coefficients
    }

    /// Clear the delay line
    pub fn reset(&mut self) {
        self.filter.reset_state();
    }
}

/// Ordered cascade of up to four sections realizing one higher-order
/// Butterworth cut filter.
///
/// The whole-position bypass is distinct from the per-section flags:
/// sections beyond the active slope count stay permanently bypassed until
/// a steeper slope re-activates them.
pub struct CutFilter {
    stages: [FilterStage; MAX_CUT_SECTIONS],
    bypassed: bool,
}

impl CutFilter {
    pub fn new() -> Self {
        let mut stages: [FilterStage; MAX_CUT_SECTIONS] =
            core::array::from_fn(|_| FilterStage::unity());
        for stage in stages.iter_mut() {
            stage.set_bypassed(true);
        }
        Self {
            stages,
            bypassed: false,
        }
    }

    /// Install new section coefficients.
    ///
    /// All four sections are first forced into bypass, then exactly the
    /// sections present in `coefficients` are re-coefficiented and
    /// activated. A slope decrease therefore leaves the excess sections
    /// allocated but bypassed.
    pub fn update(&mut self, coefficients: &CutCoefficients) {
        for stage in &mut self.stages {
            stage.set_bypassed(true);
        }
        for (stage, section) in self.stages.iter_mut().zip(coefficients.sections()) {
            stage.set_coefficients(*section);
            stage.set_bypassed(false);
        }
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        if self.bypassed {
            return sample;
        }
        let mut s = sample;
        for stage in &mut self.stages {
            s = stage.process(s);
        }
        s
    }

    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// Number of sections currently processing
    pub fn active_sections(&self) -> usize {
        self.stages.iter().filter(|s| !s.is_bypassed()).count()
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }
}

impl Default for CutFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// One channel's fixed 5-position filter chain.
pub struct MonoChain {
    low_cut: CutFilter,
    peaks: [FilterStage; 3],
    high_cut: CutFilter,
}

impl MonoChain {
    pub fn new() -> Self {
        Self {
            low_cut: CutFilter::new(),
            peaks: core::array::from_fn(|_| FilterStage::unity()),
            high_cut: CutFilter::new(),
        }
    }

    /// Apply one resolved update to every position.
    ///
    /// Each peak bypass flag is fully independent; the low/high cut flags
    /// bypass the whole cascade without touching per-section state.
    pub fn apply(&mut self, update: &ChainUpdate) {
        self.low_cut.update(&update.low_cut);
        self.low_cut.set_bypassed(update.low_cut_bypassed);

        for (i, stage) in self.peaks.iter_mut().enumerate() {
            stage.set_coefficients(update.peaks[i]);
            stage.set_bypassed(update.peak_bypassed[i]);
        }

        self.high_cut.update(&update.high_cut);
        self.high_cut.set_bypassed(update.high_cut_bypassed);
    }

    #[inline]
    pub fn process_sample(&mut self, sample: f32) -> f32 {
        let mut s = self.low_cut.process(sample);
        for stage in &mut self.peaks {
            s = stage.process(s);
        }
        self.high_cut.process(s)
    }

    /// Process a channel's samples in place through all five positions
    #[inline]
    pub fn process_buffer(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    pub fn set_bypassed(&mut self, position: ChainPosition, bypassed: bool) {
        match position {
            ChainPosition::LowCut => self.low_cut.set_bypassed(bypassed),
            ChainPosition::Peak1 => self.peaks[0].set_bypassed(bypassed),
            ChainPosition::Peak2 => self.peaks[1].set_bypassed(bypassed),
            ChainPosition::Peak3 => self.peaks[2].set_bypassed(bypassed),
            ChainPosition::HighCut => self.high_cut.set_bypassed(bypassed),
        }
    }

    pub fn is_bypassed(&self, position: ChainPosition) -> bool {
        match position {
            ChainPosition::LowCut => self.low_cut.is_bypassed(),
            ChainPosition::Peak1 => self.peaks[0].is_bypassed(),
            ChainPosition::Peak2 => self.peaks[1].is_bypassed(),
            ChainPosition::Peak3 => self.peaks[2].is_bypassed(),
            ChainPosition::HighCut => self.high_cut.is_bypassed(),
        }
    }

    pub fn low_cut(&self) -> &CutFilter {
        &self.low_cut
    }

    pub fn peak(&self, index: usize) -> &FilterStage {
        &self.peaks[index]
    }

    pub fn high_cut(&self) -> &CutFilter {
        &self.high_cut
    }

    /// Clear every delay line (call when switching sources)
    pub fn reset(&mut self) {
        self.low_cut.reset();
        for stage in &mut self.peaks {
            stage.reset();
        }
        self.high_cut.reset();
    }
}

impl Default for MonoChain {
    fn default() -> Self {
        Self::new()
    }
}
