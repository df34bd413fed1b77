//! Frequency-Response Evaluation
//!
//! Analytic magnitude of the resolved chain, sampled across a
//! log-frequency axis to produce the renderable response curve. Works on
//! the visualization thread's own chain instance, never the audio chains.

use biquad::Coefficients;

use crate::filter::MonoChain;
use crate::settings::{MAX_FREQ, MIN_FREQ};

/// Vertical range of the response curve display, in dB
pub const CURVE_MIN_DB: f64 = -24.0;
pub const CURVE_MAX_DB: f64 = 24.0;

/// Axis-aligned display rectangle, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Renderable polyline: (x, y) vertices in display coordinates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotPath {
    pub points: Vec<(f32, f32)>,
}

impl PlotPath {
    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

/// Map 0..1 onto min..max along a log10 axis
pub fn map_to_log10(normalized: f64, min: f64, max: f64) -> f64 {
    min * 10f64.powf(normalized * (max / min).log10())
}

/// Inverse of [`map_to_log10`]
pub fn map_from_log10(value: f64, min: f64, max: f64) -> f64 {
    (value / min).log10() / (max / min).log10()
}

/// Linear remap of `value` from one range to another
pub(crate) fn remap(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    out_min + (out_max - out_min) * ((value - in_min) / (in_max - in_min))
}

/// Magnitude of one 2nd-order section at `freq` Hz.
///
/// Evaluates |H(z)| at z = e^{jw}, w = 2 pi freq / sample_rate, with
/// normalized coefficients (a0 = 1).
pub fn section_magnitude(c: &Coefficients<f32>, freq: f64, sample_rate: f64) -> f64 {
    let w = 2.0 * std::f64::consts::PI * freq / sample_rate;
    let (cos1, sin1) = (w.cos(), w.sin());
    let (cos2, sin2) = ((2.0 * w).cos(), (2.0 * w).sin());

    let (b0, b1, b2) = (c.b0 as f64, c.b1 as f64, c.b2 as f64);
    let (a1, a2) = (c.a1 as f64, c.a2 as f64);

    let num_re = b0 + b1 * cos1 + b2 * cos2;
    let num_im = -(b1 * sin1 + b2 * sin2);
    let den_re = 1.0 + a1 * cos1 + a2 * cos2;
    let den_im = -(a1 * sin1 + a2 * sin2);

    ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)).sqrt()
}

/// Magnitude of the whole chain at `freq` Hz, honoring both the position
/// bypass flags and the per-section bypass inside the cut cascades.
pub fn chain_magnitude(chain: &MonoChain, freq: f64, sample_rate: f64) -> f64 {
    let mut magnitude = 1.0;

    if !chain.low_cut().is_bypassed() {
        for stage in chain.low_cut().stages() {
            if !stage.is_bypassed() {
                magnitude *= section_magnitude(stage.coefficients(), freq, sample_rate);
            }
        }
    }

    for i in 0..3 {
        let stage = chain.peak(i);
        if !stage.is_bypassed() {
            magnitude *= section_magnitude(stage.coefficients(), freq, sample_rate);
        }
    }

    if !chain.high_cut().is_bypassed() {
        for stage in chain.high_cut().stages() {
            if !stage.is_bypassed() {
                magnitude *= section_magnitude(stage.coefficients(), freq, sample_rate);
            }
        }
    }

    magnitude
}

/// Chain magnitude in dB at `width` log-spaced frequencies across
/// 20 Hz - 20 kHz
pub fn response_magnitudes_db(chain: &MonoChain, sample_rate: f64, width: usize) -> Vec<f64> {
    (0..width)
        .map(|i| {
            let freq = map_to_log10(i as f64 / width as f64, MIN_FREQ as f64, MAX_FREQ as f64);
            let magnitude = chain_magnitude(chain, freq, sample_rate);
            20.0 * magnitude.max(1e-12).log10()
        })
        .collect()
}

/// Map dB magnitudes into a display-space polyline, one vertex per pixel
/// column, with -24..+24 dB spanning the vertical extent.
pub fn response_curve_path(magnitudes_db: &[f64], bounds: Rect) -> PlotPath {
    let mut path = PlotPath {
        points: Vec::with_capacity(magnitudes_db.len()),
    };
    for (i, &db) in magnitudes_db.iter().enumerate() {
        let y = remap(
            db as f32,
            CURVE_MIN_DB as f32,
            CURVE_MAX_DB as f32,
            bounds.bottom(),
            bounds.y,
        );
        path.points.push((bounds.x + i as f32, y));
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coefficients::resolve_chain;
    use crate::settings::{ChainSettings, Slope};

    const SR: f64 = 48_000.0;

    fn chain_for(settings: &ChainSettings) -> MonoChain {
        let mut chain = MonoChain::new();
        chain.apply(&resolve_chain(settings, SR as f32).unwrap());
        chain
    }

    fn db(mag: f64) -> f64 {
        20.0 * mag.log10()
    }

    #[test]
    fn test_default_chain_is_nearly_flat_midband() {
        // Default: cuts at the band edges, peaks at 0 dB
        let chain = chain_for(&ChainSettings::default());
        let magnitude = chain_magnitude(&chain, 1_000.0, SR);
        assert!((db(magnitude)).abs() < 0.5, "got {} dB", db(magnitude));
    }

    #[test]
    fn test_peak_boost_hits_target_at_center() {
        let mut settings = ChainSettings::default();
        settings.peaks[0].freq = 1_000.0;
        settings.peaks[0].gain_db = 24.0;
        settings.low_cut_bypassed = true;
        settings.high_cut_bypassed = true;
        settings.peaks[1].bypassed = true;
        settings.peaks[2].bypassed = true;

        let chain = chain_for(&settings);

        // 10^(24/20) ~= 15.85 at dead center
        let at_center = chain_magnitude(&chain, 1_000.0, SR);
        assert!((at_center - 15.85).abs() < 0.2, "got {at_center}");

        // Far outside the bell the response returns to unity
        let far_below = chain_magnitude(&chain, 20.0, SR);
        assert!((far_below - 1.0).abs() < 0.05, "got {far_below}");
    }

    #[test]
    fn test_low_cut_slope_is_48_db_per_octave() {
        let settings = ChainSettings {
            low_cut_freq: 1_000.0,
            low_cut_slope: Slope::Db48,
            ..Default::default()
        };
        let chain = chain_for(&settings);

        // Well below cutoff the roll-off settles at ~48 dB per octave
        let at_100 = db(chain_magnitude(&chain, 100.0, SR));
        let at_200 = db(chain_magnitude(&chain, 200.0, SR));
        let octave_drop = at_200 - at_100;
        assert!(
            (octave_drop - 48.0).abs() < 3.0,
            "expected ~48 dB/octave, got {octave_drop}"
        );

        // One decade below, an order-8 Butterworth is far past -90 dB
        assert!(at_100 < -90.0, "got {at_100} dB at 100 Hz");
    }

    #[test]
    fn test_bypassed_positions_do_not_shape_response() {
        let mut settings = ChainSettings::default();
        settings.peaks[0].gain_db = 24.0;
        settings.peaks[0].bypassed = true;
        settings.low_cut_freq = 500.0;
        settings.low_cut_bypassed = true;
        settings.high_cut_bypassed = true;
        settings.peaks[1].bypassed = true;
        settings.peaks[2].bypassed = true;

        let chain = chain_for(&settings);
        let magnitude = chain_magnitude(&chain, 750.0, SR);
        assert!((magnitude - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_log_axis_round_trip() {
        for freq in [20.0, 100.0, 1_000.0, 10_000.0, 20_000.0] {
            let norm = map_from_log10(freq, 20.0, 20_000.0);
            let back = map_to_log10(norm, 20.0, 20_000.0);
            assert!((back - freq).abs() / freq < 1e-9);
        }
        assert!((map_from_log10(20.0, 20.0, 20_000.0)).abs() < 1e-12);
        assert!((map_from_log10(20_000.0, 20.0, 20_000.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_response_curve_path_spans_bounds() {
        let chain = chain_for(&ChainSettings::default());
        let bounds = Rect::new(10.0, 5.0, 200.0, 100.0);
        let mags = response_magnitudes_db(&chain, SR, bounds.width as usize);
        let path = response_curve_path(&mags, bounds);

        assert_eq!(path.len(), 200);
        assert_eq!(path.points.first().unwrap().0, 10.0);
        assert_eq!(path.points.last().unwrap().0, 209.0);
        // A flat 0 dB chain sits at the vertical midpoint
        let (_, y) = path.points[100];
        assert!((y - 55.0).abs() < 5.0, "got y = {y}");
    }

    #[test]
    fn test_unity_section_magnitude() {
        let c = crate::coefficients::unity_coefficients();
        for freq in [20.0, 440.0, 10_000.0] {
            assert!((section_magnitude(&c, freq, SR) - 1.0).abs() < 1e-12);
        }
    }
}
