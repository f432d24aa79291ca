/// Commands the GUI sends to the scheduler thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuiCommand {
    Quit,
    ToggleFps,
}

/// Messages the scheduler thread sends to the GUI.
#[derive(Clone, Debug)]
pub enum MonitorMessage {
    Frame(FrameView),
    Log(String),
}

/// One rendered trace pane: the scaled window plus its fixed vertical offset
/// in the stacked plot.
#[derive(Clone, Debug)]
pub struct ChannelPane {
    pub channel: String,
    pub label: Option<String>,
    pub row_offset: f64,
    pub samples: Vec<f64>,
}

impl ChannelPane {
    pub fn legend(&self) -> String {
        match &self.label {
            Some(label) => format!("{} ({label})", self.channel),
            None => self.channel.clone(),
        }
    }
}

/// Complete per-frame display state, built once per scheduler tick.
#[derive(Clone, Debug, Default)]
pub struct FrameView {
    pub panes: Vec<ChannelPane>,
    pub fps: Option<f64>,
}
