//! Audio Engine - Visualization Loop and Control Surface
//!
//! The engine owns the non-real-time half of the system: it spawns the
//! visualization thread, which ticks at ~60 Hz, drains the sample queues,
//! runs the spectrum pipeline and publishes frames as events. The audio
//! half (the [`EqProcessor`](crate::processor::EqProcessor)) stays with
//! the host's audio callback; the two meet only through the lock-free
//! sample queues and the atomic parameter registry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use tracing::{info, warn};

use auric_dsp::Rect;

use crate::analyzer::Analyzer;
use crate::error::{EngineError, EngineResult};
use crate::message::{Command, Event};
use crate::params::{EqParams, ParamId};
use crate::processor::AnalyzerTaps;

/// ~60 fps tick for the visualization loop
const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// The engine controller. Lives on the host/UI thread and communicates
/// with the visualization thread via channels.
pub struct AudioEngine {
    command_sender: Sender<Command>,
    event_receiver: Receiver<Event>,
    params: Arc<EqParams>,
    viz_thread: Option<JoinHandle<()>>,
    shutdown_flag: Arc<AtomicBool>,
}

impl AudioEngine {
    /// Spawn the visualization thread over the processor's analyzer taps
    pub fn start(
        params: Arc<EqParams>,
        taps: AnalyzerTaps,
        sample_rate: f32,
    ) -> EngineResult<Self> {
        let (command_sender, command_receiver) = bounded::<Command>(32);
        let (event_sender, event_receiver) = unbounded::<Event>();
        let shutdown_flag = Arc::new(AtomicBool::new(false));

        let thread_params = Arc::clone(&params);
        let thread_shutdown = Arc::clone(&shutdown_flag);
        let viz_thread = thread::Builder::new()
            .name("auric-viz".into())
            .spawn(move || {
                viz_thread_main(
                    command_receiver,
                    event_sender,
                    thread_shutdown,
                    thread_params,
                    taps,
                    sample_rate,
                );
            })
            .map_err(|e| EngineError::ThreadSpawn(e.to_string()))?;

        Ok(Self {
            command_sender,
            event_receiver,
            params,
            viz_thread: Some(viz_thread),
            shutdown_flag,
        })
    }

    /// Set a parameter by name. The write lands in the atomic registry
    /// immediately; the visualization picks it up on its next tick.
    pub fn set_param(&self, name: &str, value: f32) -> EngineResult<()> {
        if self.params.set_by_name(name, value) {
            Ok(())
        } else {
            Err(EngineError::UnknownParam(name.to_string()))
        }
    }

    pub fn param(&self, name: &str) -> Option<f32> {
        self.params.get_by_name(name)
    }

    pub fn params(&self) -> &Arc<EqParams> {
        &self.params
    }

    /// Enable or disable the spectrum analyzer pipeline
    pub fn set_analyzer_enabled(&self, enabled: bool) -> EngineResult<()> {
        self.send_command(Command::SetAnalyzerEnabled(enabled))
    }

    /// Tell the analyzer where the response display lives
    pub fn set_display_bounds(&self, bounds: Rect) -> EngineResult<()> {
        self.send_command(Command::SetDisplayBounds(bounds))
    }

    /// Request a StateUpdate event
    pub fn request_state(&self) -> EngineResult<()> {
        self.send_command(Command::RequestState)
    }

    /// Get next event (non-blocking)
    pub fn poll_event(&self) -> Option<Event> {
        self.event_receiver.try_recv().ok()
    }

    /// Get next event (blocking)
    pub fn wait_event(&self) -> Option<Event> {
        self.event_receiver.recv().ok()
    }

    /// Stop the visualization thread and wait for it to exit
    pub fn shutdown(&mut self) {
        self.shutdown_flag.store(true, Ordering::SeqCst);
        let _ = self.command_sender.send(Command::Shutdown);
        if let Some(handle) = self.viz_thread.take() {
            let _ = handle.join();
        }
    }

    fn send_command(&self, command: Command) -> EngineResult<()> {
        self.command_sender
            .send(command)
            .map_err(|_| EngineError::ChannelSendError)
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Visualization thread main loop.
///
/// Uses a receive timeout as the frame clock: commands are handled as they
/// arrive, and each timeout produces one analyzer tick.
fn viz_thread_main(
    command_receiver: Receiver<Command>,
    event_sender: Sender<Event>,
    shutdown_flag: Arc<AtomicBool>,
    params: Arc<EqParams>,
    taps: AnalyzerTaps,
    sample_rate: f32,
) {
    info!("Visualization thread started");

    let mut analyzer = Analyzer::new(Arc::clone(&params), taps, sample_rate);
    // Placeholder until the UI reports its real display area
    let mut bounds = Rect::new(0.0, 0.0, 512.0, 256.0);

    while !shutdown_flag.load(Ordering::SeqCst) {
        match command_receiver.recv_timeout(TICK_INTERVAL) {
            Ok(Command::SetParam { name, value }) => {
                if !params.set_by_name(&name, value) {
                    warn!("Ignoring unknown parameter '{}'", name);
                    let _ = event_sender.send(Event::error(format!("unknown parameter: {name}")));
                }
            }
            Ok(Command::SetAnalyzerEnabled(enabled)) => {
                params.set(ParamId::AnalyzerEnabled, if enabled { 1.0 } else { 0.0 });
            }
            Ok(Command::SetDisplayBounds(new_bounds)) => {
                bounds = new_bounds;
            }
            Ok(Command::RequestState) => {
                let state = Event::StateUpdate {
                    analyzer_enabled: params.is_enabled(ParamId::AnalyzerEnabled),
                    params: params
                        .snapshot()
                        .iter()
                        .map(|(name, value)| (name.to_string(), value))
                        .collect(),
                };
                let _ = event_sender.send(state);
            }
            Ok(Command::Shutdown) => {
                info!("Shutdown command received");
                break;
            }
            Err(RecvTimeoutError::Timeout) => {
                let frame = analyzer.tick(bounds);
                let _ = event_sender.send(Event::Frame(frame));
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let _ = event_sender.send(Event::Stopped);
    info!("Visualization thread stopped");
}
