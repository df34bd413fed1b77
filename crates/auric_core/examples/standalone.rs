//! Standalone Auric EQ: default input -> EQ -> default output.
//!
//! Run with: cargo run -p auric_core --example standalone

use std::sync::Arc;
use std::time::Duration;

use auric_core::{
    default_devices, AudioEngine, AudioStream, EngineConfig, EqParams, EqProcessor, Event,
    PersistedState, Rect,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = EngineConfig::default();
    let sample_rate = config.stream.sample_rate as f32;
    let params = Arc::new(EqParams::new());
    if let Some(saved) = PersistedState::load() {
        saved.apply(&params);
    }

    let (processor, taps) = EqProcessor::new(
        Arc::clone(&params),
        sample_rate,
        config.stream.buffer_size as usize,
    )?;
    let engine = AudioEngine::start(Arc::clone(&params), taps, sample_rate)?;
    engine.set_display_bounds(Rect::new(0.0, 0.0, 80.0, 20.0))?;

    // A gentle starting shape: rumble filter plus a small presence lift
    engine.set_param("LowCut Freq", 60.0)?;
    engine.set_param("Peak 3 Freq", 4_000.0)?;
    engine.set_param("Peak 3 Gain", 2.0)?;

    let (input, output) = default_devices()?;
    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let _stream = AudioStream::duplex(config, &input, &output, processor, event_tx)?;

    println!("Auric EQ running. Ctrl+C to quit.");
    loop {
        // Surface stream errors and sketch the left spectrum in the log
        while let Some(event) = engine.poll_event() {
            if let Event::Frame(frame) = event {
                if let Some(&(_, y)) = frame.left_spectrum.first() {
                    tracing::debug!("spectrum head y = {y:.1}");
                }
            }
        }
        if let Ok(event) = event_rx.try_recv() {
            if let Event::Error { message } = event {
                eprintln!("stream error: {message}");
            }
        }
        std::thread::sleep(Duration::from_millis(250));
    }
}
