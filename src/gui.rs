use eframe::egui;
use egui::Color32;
use egui_plot::{Line, Plot, PlotPoints};
use std::sync::mpsc::{Receiver, Sender};

use crate::types::{FrameView, GuiCommand, MonitorMessage};

const LOG_CAPACITY: usize = 8;
const MESSAGE_DRAIN_LIMIT: usize = 64;

const PALETTE: [Color32; 6] = [
    Color32::from_rgb(0, 255, 255),
    Color32::YELLOW,
    Color32::from_rgb(255, 0, 255),
    Color32::GREEN,
    Color32::RED,
    Color32::WHITE,
];

/// Thin presenter over the scheduler's frames. All pipeline state lives on
/// the scheduler thread; this side only draws the latest view and forwards
/// key presses as commands.
pub struct MonitorApp {
    frame: FrameView,
    log_messages: Vec<String>,
    rx: Receiver<MonitorMessage>,
    tx_cmd: Sender<GuiCommand>,
    quit_sent: bool,
}

impl MonitorApp {
    pub fn new(rx: Receiver<MonitorMessage>, tx_cmd: Sender<GuiCommand>) -> Self {
        Self {
            frame: FrameView::default(),
            log_messages: vec!["seiswatch ready".to_owned()],
            rx,
            tx_cmd,
            quit_sent: false,
        }
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {msg}"));
        if self.log_messages.len() > LOG_CAPACITY {
            self.log_messages.remove(0);
        }
    }

    fn send_quit(&mut self) {
        if !self.quit_sent {
            self.quit_sent = true;
            self.tx_cmd.send(GuiCommand::Quit).ok();
        }
    }
}

impl eframe::App for MonitorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.send_quit();
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::F3)) {
            self.tx_cmd.send(GuiCommand::ToggleFps).ok();
        }

        let mut msg_count = 0;
        while let Ok(msg) = self.rx.try_recv() {
            msg_count += 1;
            match msg {
                // Only the newest frame matters, older ones are stale.
                MonitorMessage::Frame(view) => self.frame = view,
                MonitorMessage::Log(s) => self.log(&s),
            }
            if msg_count >= MESSAGE_DRAIN_LIMIT {
                break;
            }
        }

        let mut visuals = egui::Visuals::dark();
        visuals.widgets.noninteractive.bg_fill = Color32::from_rgb(10, 10, 15);
        ctx.set_visuals(visuals);

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(fps) = self.frame.fps {
                ui.monospace(format!("{fps:.0} fps"));
            }
            Plot::new("traces")
                .view_aspect(2.0)
                .show(ui, |plot_ui| {
                    for (i, pane) in self.frame.panes.iter().enumerate() {
                        let points: Vec<[f64; 2]> = pane
                            .samples
                            .iter()
                            .enumerate()
                            .map(|(x, s)| [x as f64, s + pane.row_offset])
                            .collect();
                        let color = PALETTE[i % PALETTE.len()];
                        plot_ui.line(
                            Line::new(PlotPoints::new(points))
                                .name(pane.legend())
                                .color(color),
                        );
                    }
                });
            egui::ScrollArea::vertical().max_height(100.0).show(ui, |ui| {
                for m in &self.log_messages {
                    ui.monospace(m);
                }
            });
        });

        ctx.request_repaint();
    }
}

impl Drop for MonitorApp {
    fn drop(&mut self) {
        self.send_quit();
    }
}
