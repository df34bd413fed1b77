//! Parameter Registry
//!
//! The flat name -> value parameter set consumed by the processor and the
//! visualization engine. Values live in f32-as-bits atomics so the host
//! thread, the audio thread and the visualization thread can all read and
//! write without locking; every write raises a dirty flag that the
//! visualization loop checks-and-clears once per tick.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use auric_dsp::{ChainSettings, PeakBand, Slope, MAX_FREQ, MIN_FREQ};

/// Total number of registered parameters
pub const PARAM_COUNT: usize = 19;

/// Every parameter the EQ exposes to its host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum ParamId {
    LowCutFreq,
    HighCutFreq,
    Peak1Freq,
    Peak1Gain,
    Peak1Q,
    Peak2Freq,
    Peak2Gain,
    Peak2Q,
    Peak3Freq,
    Peak3Gain,
    Peak3Q,
    LowCutSlope,
    HighCutSlope,
    LowCutBypass,
    HighCutBypass,
    Peak1Bypass,
    Peak2Bypass,
    Peak3Bypass,
    AnalyzerEnabled,
}

impl ParamId {
    pub const ALL: [ParamId; PARAM_COUNT] = [
        ParamId::LowCutFreq,
        ParamId::HighCutFreq,
        ParamId::Peak1Freq,
        ParamId::Peak1Gain,
        ParamId::Peak1Q,
        ParamId::Peak2Freq,
        ParamId::Peak2Gain,
        ParamId::Peak2Q,
        ParamId::Peak3Freq,
        ParamId::Peak3Gain,
        ParamId::Peak3Q,
        ParamId::LowCutSlope,
        ParamId::HighCutSlope,
        ParamId::LowCutBypass,
        ParamId::HighCutBypass,
        ParamId::Peak1Bypass,
        ParamId::Peak2Bypass,
        ParamId::Peak3Bypass,
        ParamId::AnalyzerEnabled,
    ];

    /// Stable external name, also used in the persisted form
    pub fn name(self) -> &'static str {
        match self {
            ParamId::LowCutFreq => "LowCut Freq",
            ParamId::HighCutFreq => "HighCut Freq",
            ParamId::Peak1Freq => "Peak 1 Freq",
            ParamId::Peak1Gain => "Peak 1 Gain",
            ParamId::Peak1Q => "Peak 1 Quality",
            ParamId::Peak2Freq => "Peak 2 Freq",
            ParamId::Peak2Gain => "Peak 2 Gain",
            ParamId::Peak2Q => "Peak 2 Quality",
            ParamId::Peak3Freq => "Peak 3 Freq",
            ParamId::Peak3Gain => "Peak 3 Gain",
            ParamId::Peak3Q => "Peak 3 Quality",
            ParamId::LowCutSlope => "LowCut Slope",
            ParamId::HighCutSlope => "HighCut Slope",
            ParamId::LowCutBypass => "LowCut Bypass",
            ParamId::HighCutBypass => "HighCut Bypass",
            ParamId::Peak1Bypass => "Peak 1 Bypass",
            ParamId::Peak2Bypass => "Peak 2 Bypass",
            ParamId::Peak3Bypass => "Peak 3 Bypass",
            ParamId::AnalyzerEnabled => "Analyzer Enabled",
        }
    }

    pub fn from_name(name: &str) -> Option<ParamId> {
        ParamId::ALL.iter().copied().find(|id| id.name() == name)
    }

    pub fn range(self) -> ParamRange {
        match self {
            ParamId::LowCutFreq
            | ParamId::HighCutFreq
            | ParamId::Peak1Freq
            | ParamId::Peak2Freq
            | ParamId::Peak3Freq => ParamRange::log(MIN_FREQ, MAX_FREQ),
            ParamId::Peak1Gain | ParamId::Peak2Gain | ParamId::Peak3Gain => {
                ParamRange::stepped(-24.0, 24.0, 0.5)
            }
            ParamId::Peak1Q | ParamId::Peak2Q | ParamId::Peak3Q => {
                ParamRange::stepped(0.1, 10.0, 0.05)
            }
            ParamId::LowCutSlope | ParamId::HighCutSlope => {
                ParamRange::choice(Slope::ALL.len())
            }
            ParamId::LowCutBypass
            | ParamId::HighCutBypass
            | ParamId::Peak1Bypass
            | ParamId::Peak2Bypass
            | ParamId::Peak3Bypass
            | ParamId::AnalyzerEnabled => ParamRange::toggle(),
        }
    }

    pub fn default_value(self) -> f32 {
        match self {
            ParamId::LowCutFreq => MIN_FREQ,
            ParamId::HighCutFreq => MAX_FREQ,
            ParamId::Peak1Freq | ParamId::Peak2Freq | ParamId::Peak3Freq => 750.0,
            ParamId::Peak1Gain | ParamId::Peak2Gain | ParamId::Peak3Gain => 0.0,
            ParamId::Peak1Q | ParamId::Peak2Q | ParamId::Peak3Q => 1.0,
            ParamId::LowCutSlope | ParamId::HighCutSlope => 0.0,
            ParamId::AnalyzerEnabled => 1.0,
            _ => 0.0, // bypass flags default to off
        }
    }
}

/// Skew applied when converting to/from the 0..1 control position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skew {
    Linear,
    Logarithmic,
}

/// Value range with optional step quantization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    /// Step grid; 0.0 means continuous
    pub step: f32,
    pub skew: Skew,
}

impl ParamRange {
    pub fn log(min: f32, max: f32) -> Self {
        Self {
            min,
            max,
            step: 0.0,
            skew: Skew::Logarithmic,
        }
    }

    pub fn stepped(min: f32, max: f32, step: f32) -> Self {
        Self {
            min,
            max,
            step,
            skew: Skew::Linear,
        }
    }

    pub fn choice(count: usize) -> Self {
        Self {
            min: 0.0,
            max: (count - 1) as f32,
            step: 1.0,
            skew: Skew::Linear,
        }
    }

    pub fn toggle() -> Self {
        Self {
            min: 0.0,
            max: 1.0,
            step: 1.0,
            skew: Skew::Linear,
        }
    }

    /// Clamp into range and snap onto the step grid
    pub fn constrain(&self, value: f32) -> f32 {
        let v = value.clamp(self.min, self.max);
        if self.step > 0.0 {
            let steps = ((v - self.min) / self.step).round();
            (self.min + steps * self.step).clamp(self.min, self.max)
        } else {
            v
        }
    }

    /// 0..1 control position for `value` (log skew for frequencies, so a
    /// slider travels octaves, not Hertz)
    pub fn normalize(&self, value: f32) -> f32 {
        match self.skew {
            Skew::Linear => (value - self.min) / (self.max - self.min),
            Skew::Logarithmic => (value / self.min).ln() / (self.max / self.min).ln(),
        }
    }

    /// Inverse of [`normalize`](Self::normalize), constrained to the range
    pub fn denormalize(&self, position: f32) -> f32 {
        let value = match self.skew {
            Skew::Linear => self.min + position * (self.max - self.min),
            Skew::Logarithmic => self.min * ((self.max / self.min).ln() * position).exp(),
        };
        self.constrain(value)
    }
}

/// Opaque serialized form of the full parameter set.
///
/// The core does not promise a particular layout beyond "restoring it
/// fully reconstructs the coefficients".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamState {
    values: Vec<(String, f32)>,
}

impl ParamState {
    pub fn get(&self, name: &str) -> Option<f32> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.values.iter().map(|(n, v)| (n.as_str(), *v))
    }
}

/// The live parameter registry
pub struct EqParams {
    values: [AtomicU32; PARAM_COUNT],
    changed: AtomicBool,
}

impl EqParams {
    pub fn new() -> Self {
        let values =
            core::array::from_fn(|i| AtomicU32::new(ParamId::ALL[i].default_value().to_bits()));
        Self {
            values,
            changed: AtomicBool::new(false),
        }
    }

    pub fn get(&self, id: ParamId) -> f32 {
        f32::from_bits(self.values[id as usize].load(Ordering::Relaxed))
    }

    /// Store a value (constrained to the parameter's range) and raise the
    /// dirty flag.
    pub fn set(&self, id: ParamId, value: f32) {
        let v = id.range().constrain(value);
        self.values[id as usize].store(v.to_bits(), Ordering::Relaxed);
        self.changed.store(true, Ordering::Release);
    }

    pub fn get_by_name(&self, name: &str) -> Option<f32> {
        ParamId::from_name(name).map(|id| self.get(id))
    }

    /// Returns `false` when `name` is not a registered parameter
    pub fn set_by_name(&self, name: &str, value: f32) -> bool {
        match ParamId::from_name(name) {
            Some(id) => {
                self.set(id, value);
                true
            }
            None => false,
        }
    }

    /// Boolean view of a toggle parameter
    pub fn is_enabled(&self, id: ParamId) -> bool {
        self.get(id) > 0.5
    }

    /// Check-and-clear the "anything changed since last look" flag
    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }

    /// Build a fresh settings snapshot for one resolver pass
    pub fn chain_settings(&self) -> ChainSettings {
        let peak = |freq, gain, q, bypass| PeakBand {
            freq: self.get(freq),
            gain_db: self.get(gain),
            q: self.get(q),
            bypassed: self.is_enabled(bypass),
        };
        ChainSettings {
            peaks: [
                peak(
                    ParamId::Peak1Freq,
                    ParamId::Peak1Gain,
                    ParamId::Peak1Q,
                    ParamId::Peak1Bypass,
                ),
                peak(
                    ParamId::Peak2Freq,
                    ParamId::Peak2Gain,
                    ParamId::Peak2Q,
                    ParamId::Peak2Bypass,
                ),
                peak(
                    ParamId::Peak3Freq,
                    ParamId::Peak3Gain,
                    ParamId::Peak3Q,
                    ParamId::Peak3Bypass,
                ),
            ],
            low_cut_freq: self.get(ParamId::LowCutFreq),
            high_cut_freq: self.get(ParamId::HighCutFreq),
            low_cut_slope: Slope::from_index(self.get(ParamId::LowCutSlope) as usize),
            high_cut_slope: Slope::from_index(self.get(ParamId::HighCutSlope) as usize),
            low_cut_bypassed: self.is_enabled(ParamId::LowCutBypass),
            high_cut_bypassed: self.is_enabled(ParamId::HighCutBypass),
        }
    }

    /// Capture the full parameter set for persistence
    pub fn snapshot(&self) -> ParamState {
        ParamState {
            values: ParamId::ALL
                .iter()
                .map(|&id| (id.name().to_string(), self.get(id)))
                .collect(),
        }
    }

    /// Restore a persisted snapshot. Unknown names are ignored so older
    /// state files keep loading.
    pub fn restore(&self, state: &ParamState) {
        for (name, value) in state.iter() {
            self.set_by_name(name, value);
        }
    }
}

impl Default for EqParams {
    fn default() -> Self {
        Self::new()
    }
}
