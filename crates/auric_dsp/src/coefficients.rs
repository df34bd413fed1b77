//! Coefficient Calculator
//!
//! Pure mapping from a settings snapshot plus sample rate to the biquad
//! coefficients of every stage in the chain, based on the RBJ
//! (Robert Bristow-Johnson) Audio EQ Cookbook designs from the `biquad`
//! crate. Peak stages use the peaking-EQ design; cut filters are
//! higher-order Butterworth responses split into cascaded 2nd-order
//! sections.
//!
//! Same inputs always produce bit-identical outputs. No validation happens
//! here: callers clamp frequency and Q first (`ChainSettings::clamped`).

use biquad::{Coefficients, ToHertz, Type};

use crate::error::DspError;
use crate::settings::{ChainSettings, PeakBand, Slope};

/// Maximum number of cascaded sections in one cut filter
pub const MAX_CUT_SECTIONS: usize = 4;

/// Identity section: b = [1, 0, 0], a = [1, 0, 0]
pub fn unity_coefficients() -> Coefficients<f32> {
    Coefficients {
        a1: 0.0,
        a2: 0.0,
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
    }
}

/// Ordered list of up to four 2nd-order sections realizing one Butterworth
/// cut filter. Inactive trailing slots hold identity coefficients.
#[derive(Debug, Clone, Copy)]
pub struct CutCoefficients {
    sections: [Coefficients<f32>; MAX_CUT_SECTIONS],
    active: usize,
}

impl CutCoefficients {
    /// The active sections, in cascade order
    pub fn sections(&self) -> &[Coefficients<f32>] {
        &self.sections[..self.active]
    }

    pub fn len(&self) -> usize {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active == 0
    }
}

/// Q of the k-th conjugate pole pair of an even-order Butterworth filter:
/// Q_k = 1 / (2 cos(pi (2k + 1) / (2 N)))
fn butterworth_q(order: usize, section: usize) -> f32 {
    let theta = std::f32::consts::PI * (2.0 * section as f32 + 1.0) / (2.0 * order as f32);
    1.0 / (2.0 * theta.cos())
}

/// Peaking-EQ coefficients for one band. The `biquad` crate takes the gain
/// in dB (0 dB is neutral).
pub fn make_peak_coefficients(
    band: &PeakBand,
    sample_rate: f32,
) -> Result<Coefficients<f32>, DspError> {
    Coefficients::<f32>::from_params(
        Type::PeakingEQ(band.gain_db),
        sample_rate.hz(),
        band.freq.hz(),
        band.q,
    )
    .map_err(|_| DspError::InvalidCoefficients {
        frequency: band.freq,
        sample_rate,
    })
}

fn make_cut_coefficients(
    highpass: bool,
    freq: f32,
    slope: Slope,
    sample_rate: f32,
) -> Result<CutCoefficients, DspError> {
    let order = 2 * slope.sections();
    let mut sections = [unity_coefficients(); MAX_CUT_SECTIONS];

    for (k, slot) in sections.iter_mut().take(slope.sections()).enumerate() {
        let kind = if highpass {
            Type::HighPass
        } else {
            Type::LowPass
        };
        *slot = Coefficients::<f32>::from_params(
            kind,
            sample_rate.hz(),
            freq.hz(),
            butterworth_q(order, k),
        )
        .map_err(|_| DspError::InvalidCoefficients {
            frequency: freq,
            sample_rate,
        })?;
    }

    Ok(CutCoefficients {
        sections,
        active: slope.sections(),
    })
}

/// Low-cut (highpass) Butterworth cascade of order `2 * slope.sections()`
pub fn make_low_cut_coefficients(
    freq: f32,
    slope: Slope,
    sample_rate: f32,
) -> Result<CutCoefficients, DspError> {
    make_cut_coefficients(true, freq, slope, sample_rate)
}

/// High-cut (lowpass) Butterworth cascade of order `2 * slope.sections()`
pub fn make_high_cut_coefficients(
    freq: f32,
    slope: Slope,
    sample_rate: f32,
) -> Result<CutCoefficients, DspError> {
    make_cut_coefficients(false, freq, slope, sample_rate)
}

/// Everything one resolver pass derives from a settings snapshot.
///
/// Computed once per pass and applied verbatim to both stereo chains, so
/// left and right always end up with identical coefficients and bypass
/// flags.
#[derive(Debug, Clone, Copy)]
pub struct ChainUpdate {
    pub low_cut: CutCoefficients,
    pub high_cut: CutCoefficients,
    pub peaks: [Coefficients<f32>; 3],
    pub low_cut_slope: Slope,
    pub high_cut_slope: Slope,
    pub peak_bypassed: [bool; 3],
    pub low_cut_bypassed: bool,
    pub high_cut_bypassed: bool,
}

/// Resolve a settings snapshot into concrete coefficients and bypass flags.
///
/// Deterministic: calling twice with the same snapshot yields bit-identical
/// coefficient values.
pub fn resolve_chain(settings: &ChainSettings, sample_rate: f32) -> Result<ChainUpdate, DspError> {
    if !(sample_rate > 0.0) {
        return Err(DspError::InvalidSampleRate(sample_rate));
    }

    let low_cut = make_low_cut_coefficients(settings.low_cut_freq, settings.low_cut_slope, sample_rate)?;
    let high_cut =
        make_high_cut_coefficients(settings.high_cut_freq, settings.high_cut_slope, sample_rate)?;

    let mut peaks = [unity_coefficients(); 3];
    let mut peak_bypassed = [false; 3];
    for (i, band) in settings.peaks.iter().enumerate() {
        peaks[i] = make_peak_coefficients(band, sample_rate)?;
        peak_bypassed[i] = band.bypassed;
    }

    Ok(ChainUpdate {
        low_cut,
        high_cut,
        peaks,
        low_cut_slope: settings.low_cut_slope,
        high_cut_slope: settings.high_cut_slope,
        peak_bypassed,
        low_cut_bypassed: settings.low_cut_bypassed,
        high_cut_bypassed: settings.high_cut_bypassed,
    })
}
