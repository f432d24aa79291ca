mod capture;
mod config;
mod error;
mod gui;
mod notify;
mod scheduler;
mod stream;
mod types;

use std::path::Path;
use std::sync::mpsc::channel;
use std::sync::Arc;

use anyhow::Context;
use eframe::egui;

use crate::config::MonitorConfig;
use crate::notify::{LogNotifier, PushoverNotifier};
use crate::stream::alert::Notify;
use crate::stream::buffer::BufferStore;
use crate::stream::sink::{spawn_ingest, IngestionSink};
use crate::stream::source::SyntheticSource;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => MonitorConfig::load(Path::new(&path))
            .with_context(|| format!("loading config {path}"))?,
        None => MonitorConfig::default(),
    };
    log::info!(
        "monitoring {} channels at {} fps",
        config.channels.len(),
        config.frame_rate
    );

    let store = Arc::new(BufferStore::new(config.retention_samples));
    let notifier: Arc<dyn Notify + Send + Sync> = match PushoverNotifier::from_env() {
        Some(pushover) => Arc::new(pushover),
        None => {
            log::warn!("APP_TOKEN/USER_TOKEN not set, alerts go to the log only");
            Arc::new(LogNotifier)
        }
    };

    let source = SyntheticSource::new(
        &config.channel_ids(),
        config.sample_rate_hz,
        config.backfill(),
    );
    spawn_ingest(source, IngestionSink::new(Arc::clone(&store)));

    let (tx, rx) = channel();
    let (tx_cmd, rx_cmd) = channel();
    scheduler::spawn_thread(config, store, notifier, tx, rx_cmd);

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([900.0, 700.0])
        .with_title("seiswatch");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "seiswatch",
        options,
        Box::new(move |_cc| Box::new(gui::MonitorApp::new(rx, tx_cmd))),
    )
    .map_err(|err| anyhow::anyhow!("gui failed: {err}"))
}
