use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::capture;
use crate::config::MonitorConfig;
use crate::stream::alert::{AlertManager, AlertOutcome, AlertState, Notify};
use crate::stream::baseline::{window_mean, BaselineTracker};
use crate::stream::buffer::{BufferStore, ChannelSnapshot};
use crate::stream::window::render_window;
use crate::types::{ChannelPane, FrameView, GuiCommand, MonitorMessage};

/// Vertical distance between stacked traces in the plot.
const ROW_SPACING: f64 = 150.0;

/// Commands drained per frame before rendering resumes.
const COMMAND_DRAIN_LIMIT: usize = 16;

/// Frames-per-second over a sliding one second window.
struct FpsCounter {
    frames: VecDeque<Instant>,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            frames: VecDeque::new(),
        }
    }

    fn tick(&mut self, now: Instant) -> f64 {
        self.frames.push_back(now);
        while let Some(front) = self.frames.front() {
            if now.duration_since(*front) > Duration::from_secs(1) {
                self.frames.pop_front();
            } else {
                break;
            }
        }
        self.frames.len() as f64
    }
}

/// Runs the render/alert loop on its own thread at the configured frame
/// rate. The GUI stays a thin presenter on the other end of the channel.
pub fn spawn_thread(
    config: MonitorConfig,
    store: Arc<BufferStore>,
    notifier: Arc<dyn Notify + Send + Sync>,
    tx: Sender<MonitorMessage>,
    rx_cmd: Receiver<GuiCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || run_loop(config, store, notifier, tx, rx_cmd))
}

fn run_loop(
    config: MonitorConfig,
    store: Arc<BufferStore>,
    notifier: Arc<dyn Notify + Send + Sync>,
    tx: Sender<MonitorMessage>,
    rx_cmd: Receiver<GuiCommand>,
) {
    let alerts = AlertManager::new(config.alert_threshold, config.cooldown());
    let mut baselines = BaselineTracker::new();
    let mut state = AlertState::new();
    let mut fps = FpsCounter::new();
    let mut show_fps = false;
    loop {
        let frame_start = Instant::now();
        for _ in 0..COMMAND_DRAIN_LIMIT {
            match rx_cmd.try_recv() {
                Ok(GuiCommand::Quit) => {
                    log::info!("scheduler stopping on quit");
                    return;
                }
                Ok(GuiCommand::ToggleFps) => show_fps = !show_fps,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::info!("gui command channel closed, scheduler stopping");
                    return;
                }
            }
        }
        let snapshots = match store.snapshot() {
            Ok(snapshots) => snapshots,
            Err(err) => {
                log::error!("snapshot failed: {err}");
                return;
            }
        };
        let (panes, notices) = evaluate_frame(
            &config,
            &snapshots,
            &mut baselines,
            &alerts,
            &mut state,
            Instant::now(),
            notifier.as_ref(),
        );
        let rate = fps.tick(frame_start);
        let view = FrameView {
            panes,
            fps: show_fps.then_some(rate),
        };
        for notice in notices {
            let _ = tx.send(MonitorMessage::Log(notice));
        }
        if state.take_capture_request() {
            match capture::save_frame_png(&view) {
                Ok(name) => {
                    let _ = tx.send(MonitorMessage::Log(format!("capture saved: {name}")));
                }
                Err(err) => log::warn!("capture failed: {err}"),
            }
        }
        if tx.send(MonitorMessage::Frame(view)).is_err() {
            log::info!("gui disconnected, scheduler stopping");
            return;
        }
        // Fixed cadence without catch-up: a slow frame just starts the next
        // one immediately.
        if let Some(remaining) = config.frame_budget().checked_sub(frame_start.elapsed()) {
            thread::sleep(remaining);
        }
    }
}

/// One frame of the pipeline: window each channel, judge it against the
/// prior frame's baseline, then advance the baseline. Channels whose window
/// is still empty are left out of the view.
pub(crate) fn evaluate_frame(
    config: &MonitorConfig,
    snapshots: &[ChannelSnapshot],
    baselines: &mut BaselineTracker,
    alerts: &AlertManager,
    state: &mut AlertState,
    now: Instant,
    notifier: &dyn Notify,
) -> (Vec<ChannelPane>, Vec<String>) {
    let mut panes = Vec::with_capacity(snapshots.len());
    let mut notices = Vec::new();
    for snapshot in snapshots {
        let window = render_window(&snapshot.samples, config.divisor_for(&snapshot.channel));
        if window.is_empty() {
            continue;
        }
        let label = config.label_for(&snapshot.channel);
        let prior = baselines.get(&snapshot.channel);
        let outcome = alerts.evaluate(
            &snapshot.channel,
            label,
            &window,
            prior,
            state,
            now,
            notifier,
        );
        if outcome == AlertOutcome::Notified {
            notices.push(crate::stream::alert::breach_message(
                &snapshot.channel,
                label,
            ));
        }
        baselines.update(&snapshot.channel, window_mean(&window));
        panes.push(ChannelPane {
            channel: snapshot.channel.clone(),
            label: label.map(str::to_string),
            row_offset: panes.len() as f64 * ROW_SPACING,
            samples: window,
        });
    }
    (panes, notices)
}
