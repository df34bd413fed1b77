//! Spectrum Analyzer Pipeline
//!
//! Consumes queued audio blocks, computes windowed-FFT magnitude spectra
//! in dB and produces renderable paths for the response display. Runs
//! entirely on the visualization thread; the only contact with the audio
//! thread is the block FIFO it drains.
//!
//! Pending FFT frames and paths flow through the same SPSC FIFO type as
//! the audio blocks; the renderer always advances to the most recently
//! completed path and discards older ones (latest wins).

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::fifo::{fifo, FifoConsumer, FifoProducer};
use crate::response::{map_from_log10, remap, PlotPath, Rect};

/// FFT size as a power of two
pub const FFT_ORDER: usize = 11;

/// Analysis window length in samples (2048 at order 11: ~43ms at 48kHz,
/// ~23Hz bin resolution)
pub const FFT_SIZE: usize = 1 << FFT_ORDER;

/// Number of usable (positive-frequency) bins per frame
pub const NUM_BINS: usize = FFT_SIZE / 2;

/// Default analyzer floor in dB; anything quieter renders at the bottom
/// of the display
pub const DEFAULT_FLOOR_DB: f32 = -48.0;

/// Every other bin is plenty at display resolution
const PATH_RESOLUTION: usize = 2;

fn hann_window(n: usize, size: usize) -> f32 {
    0.5 * (1.0 - (2.0 * std::f32::consts::PI * n as f32 / (size - 1) as f32).cos())
}

/// 20*log10 with a lower bound
pub fn gain_to_db(gain: f32, floor_db: f32) -> f32 {
    if gain > 0.0 {
        (20.0 * gain.log10()).max(floor_db)
    } else {
        floor_db
    }
}

/// Windowed-FFT frame generator: mono analysis windows in, dB magnitude
/// frames out.
pub struct FftFrameGenerator {
    fft: Arc<dyn Fft<f32>>,
    /// Pre-computed Hann coefficients (reduces spectral leakage)
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    frame: Vec<f32>,
    frames_tx: FifoProducer<Vec<f32>>,
    frames_rx: FifoConsumer<Vec<f32>>,
}

impl FftFrameGenerator {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let template = vec![0.0f32; NUM_BINS];
        let (frames_tx, frames_rx) = fifo(&template);
        Self {
            fft,
            window: (0..FFT_SIZE).map(|n| hann_window(n, FFT_SIZE)).collect(),
            scratch: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            frame: template,
            frames_tx,
            frames_rx,
        }
    }

    /// Window and transform one analysis buffer, queueing the resulting dB
    /// frame for rendering.
    pub fn produce_frame(&mut self, samples: &[f32], floor_db: f32) {
        debug_assert_eq!(samples.len(), FFT_SIZE);
        for ((dst, &sample), &coeff) in self.scratch.iter_mut().zip(samples).zip(&self.window) {
            *dst = Complex::new(sample * coeff, 0.0);
        }
        self.fft.process(&mut self.scratch);

        for (bin, out) in self.frame.iter_mut().enumerate() {
            let magnitude = self.scratch[bin].norm() / NUM_BINS as f32;
            *out = gain_to_db(magnitude, floor_db);
        }
        self.frames_tx.push(&self.frame);
    }

    pub fn frames_available(&self) -> usize {
        self.frames_rx.available()
    }

    /// Pull the next pending dB frame into `out`
    pub fn next_frame(&mut self, out: &mut Vec<f32>) -> bool {
        self.frames_rx.pop(out)
    }
}

impl Default for FftFrameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts dB frames into display-space polylines: frequency -> x on a
/// log10 axis over 20 Hz - 20 kHz, magnitude -> y linearly over
/// [floor, 0] dB.
pub struct SpectrumPathBuilder {
    path: PlotPath,
    paths_tx: FifoProducer<PlotPath>,
    paths_rx: FifoConsumer<PlotPath>,
}

impl SpectrumPathBuilder {
    pub fn new() -> Self {
        let (paths_tx, paths_rx) = fifo(&PlotPath::default());
        Self {
            path: PlotPath::default(),
            paths_tx,
            paths_rx,
        }
    }

    pub fn generate_path(&mut self, frame: &[f32], bounds: Rect, bin_width: f32, floor_db: f32) {
        let top = bounds.y;
        let bottom = bounds.bottom();
        let width = bounds.width;

        self.path.clear();
        let map_y = |db: f32| remap(db, floor_db, 0.0, bottom, top);

        self.path.points.push((bounds.x, map_y(frame[0])));
        let mut bin = PATH_RESOLUTION;
        while bin < frame.len() {
            let y = map_y(frame[bin]);
            if y.is_finite() {
                let freq = bin as f32 * bin_width;
                let norm_x =
                    (map_from_log10(freq as f64, 20.0, 20_000.0) as f32).clamp(0.0, 1.0);
                self.path.points.push((bounds.x + (norm_x * width).floor(), y));
            }
            bin += PATH_RESOLUTION;
        }
        self.paths_tx.push(&self.path);
    }

    pub fn paths_available(&self) -> usize {
        self.paths_rx.available()
    }

    pub fn next_path(&mut self, out: &mut PlotPath) -> bool {
        self.paths_rx.pop(out)
    }
}

impl Default for SpectrumPathBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-channel analysis driver.
///
/// Drains the channel's block FIFO into a rolling mono window
/// (shift-left-by-block, append-at-tail), runs the FFT for each arriving
/// block, and keeps only the freshest completed path.
pub struct PathProducer {
    blocks: FifoConsumer<Vec<f32>>,
    incoming: Vec<f32>,
    mono_buffer: Vec<f32>,
    generator: FftFrameGenerator,
    frame: Vec<f32>,
    builder: SpectrumPathBuilder,
    path: PlotPath,
    floor_db: f32,
}

impl PathProducer {
    pub fn new(blocks: FifoConsumer<Vec<f32>>, block_size: usize) -> Self {
        Self {
            blocks,
            incoming: vec![0.0; block_size],
            mono_buffer: vec![0.0; FFT_SIZE],
            generator: FftFrameGenerator::new(),
            frame: vec![0.0; NUM_BINS],
            builder: SpectrumPathBuilder::new(),
            path: PlotPath::default(),
            floor_db: DEFAULT_FLOOR_DB,
        }
    }

    /// Drain pending audio, run analysis and advance to the most recent
    /// completed path.
    pub fn process(&mut self, bounds: Rect, sample_rate: f32) {
        while self.blocks.pop(&mut self.incoming) {
            let block = &self.incoming[..];
            if block.len() >= FFT_SIZE {
                self.mono_buffer
                    .copy_from_slice(&block[block.len() - FFT_SIZE..]);
            } else {
                // Shift the rolling window left by one block, append at
                // the tail
                self.mono_buffer.copy_within(block.len().., 0);
                let tail = FFT_SIZE - block.len();
                self.mono_buffer[tail..].copy_from_slice(block);
            }
            self.generator.produce_frame(&self.mono_buffer, self.floor_db);
        }

        let bin_width = sample_rate / FFT_SIZE as f32;
        while self.generator.next_frame(&mut self.frame) {
            self.builder
                .generate_path(&self.frame, bounds, bin_width, self.floor_db);
        }

        // Latest wins: freshness over completeness
        while self.builder.next_path(&mut self.path) {}
    }

    /// Discard queued blocks without analysis (analyzer disabled); keeps
    /// the queue from sitting full of stale data.
    pub fn drain(&mut self) {
        while self.blocks.pop(&mut self.incoming) {}
    }

    /// Most recent completed spectrum path
    pub fn path(&self) -> &PlotPath {
        &self.path
    }

    pub fn floor_db(&self) -> f32 {
        self.floor_db
    }

    pub fn set_floor_db(&mut self, floor_db: f32) {
        self.floor_db = floor_db;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fifo::SingleChannelSampleFifo;

    const SR: f32 = 48_000.0;

    fn sine_block(freq: f32, start: usize, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = (start + i) as f32 / SR;
                (2.0 * std::f32::consts::PI * freq * t).sin() * 0.5
            })
            .collect()
    }

    #[test]
    fn test_frame_generator_finds_sine_peak() {
        let mut generator = FftFrameGenerator::new();
        let window = sine_block(1_000.0, 0, FFT_SIZE);
        generator.produce_frame(&window, DEFAULT_FLOOR_DB);

        let mut frame = vec![0.0f32; NUM_BINS];
        assert!(generator.next_frame(&mut frame));

        let bin_width = SR / FFT_SIZE as f32;
        let expected_bin = (1_000.0 / bin_width).round() as usize;
        let peak_bin = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert!(
            peak_bin.abs_diff(expected_bin) <= 1,
            "peak at bin {peak_bin}, expected ~{expected_bin}"
        );

        // Away from the peak the frame sits at the floor
        assert_eq!(frame[NUM_BINS - 1], DEFAULT_FLOOR_DB);
    }

    #[test]
    fn test_silence_renders_at_floor() {
        let mut generator = FftFrameGenerator::new();
        generator.produce_frame(&vec![0.0; FFT_SIZE], DEFAULT_FLOOR_DB);

        let mut frame = vec![0.0f32; NUM_BINS];
        assert!(generator.next_frame(&mut frame));
        assert!(frame.iter().all(|&db| db == DEFAULT_FLOOR_DB));
    }

    #[test]
    fn test_path_points_stay_inside_bounds() {
        let mut builder = SpectrumPathBuilder::new();
        let frame: Vec<f32> = (0..NUM_BINS).map(|i| -(i as f32 % 48.0)).collect();
        let bounds = Rect::new(0.0, 0.0, 400.0, 200.0);
        builder.generate_path(&frame, bounds, SR / FFT_SIZE as f32, DEFAULT_FLOOR_DB);

        let mut path = PlotPath::default();
        assert!(builder.next_path(&mut path));
        assert!(!path.is_empty());
        for &(x, y) in &path.points {
            assert!(x >= bounds.x && x <= bounds.right());
            assert!(y >= bounds.y - 0.5 && y <= bounds.bottom() + 0.5);
        }
    }

    #[test]
    fn test_path_x_is_monotonic() {
        let mut builder = SpectrumPathBuilder::new();
        let frame = vec![-24.0f32; NUM_BINS];
        let bounds = Rect::new(0.0, 0.0, 400.0, 200.0);
        builder.generate_path(&frame, bounds, SR / FFT_SIZE as f32, DEFAULT_FLOOR_DB);

        let mut path = PlotPath::default();
        assert!(builder.next_path(&mut path));
        for pair in path.points.windows(2) {
            assert!(pair[1].0 >= pair[0].0);
        }
    }

    #[test]
    fn test_pipeline_end_to_end_latest_wins() {
        let block_size = 512;
        let (mut sample_fifo, consumer) = SingleChannelSampleFifo::new(block_size);
        let mut producer = PathProducer::new(consumer, block_size);
        let bounds = Rect::new(0.0, 0.0, 300.0, 150.0);

        // Feed several blocks of a 2kHz tone
        for i in 0..8 {
            sample_fifo.push_block(&sine_block(2_000.0, i * block_size, block_size));
        }
        producer.process(bounds, SR);

        let path = producer.path().clone();
        assert!(!path.is_empty());

        // All pending frames were consumed; only the freshest path remains
        assert_eq!(producer.generator.frames_available(), 0);
        assert_eq!(producer.builder.paths_available(), 0);

        // With no new audio the path is unchanged
        producer.process(bounds, SR);
        assert_eq!(*producer.path(), path);
    }

    #[test]
    fn test_drain_discards_without_analysis() {
        let block_size = 256;
        let (mut sample_fifo, consumer) = SingleChannelSampleFifo::new(block_size);
        let mut producer = PathProducer::new(consumer, block_size);

        for i in 0..4 {
            sample_fifo.push_block(&sine_block(500.0, i * block_size, block_size));
        }
        producer.drain();
        assert!(producer.path().is_empty());

        // Queue is empty again; a later enabled pass starts fresh
        producer.process(Rect::new(0.0, 0.0, 100.0, 50.0), SR);
        assert!(producer.path().is_empty());
    }

    #[test]
    fn test_gain_to_db_floor() {
        assert_eq!(gain_to_db(0.0, -48.0), -48.0);
        assert_eq!(gain_to_db(1e-9, -48.0), -48.0);
        assert!((gain_to_db(1.0, -48.0)).abs() < 1e-6);
        assert!((gain_to_db(10.0, -48.0) - 20.0).abs() < 1e-4);
    }
}
