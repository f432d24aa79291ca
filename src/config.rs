use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::MonitorError;

/// One subscribed channel. `scale_divisor` replaces the global display
/// divisor for stations whose instruments report hotter counts.
#[derive(Clone, Debug, Deserialize)]
pub struct ChannelSpec {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub scale_divisor: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub channels: Vec<ChannelSpec>,
    pub frame_rate: u32,
    pub display_divisor: f64,
    pub alert_threshold: f64,
    pub cooldown_secs: u64,
    pub retention_samples: usize,
    pub backfill_secs: u64,
    pub sample_rate_hz: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            channels: vec![
                ChannelSpec {
                    id: "G.PEL.00.BHZ".into(),
                    label: Some("Chile".into()),
                    scale_divisor: None,
                },
                ChannelSpec {
                    id: "G.HDC.00.BHZ".into(),
                    label: Some("Costa Rica".into()),
                    scale_divisor: None,
                },
                ChannelSpec {
                    id: "G.INU.00.BHZ".into(),
                    label: Some("Japan".into()),
                    scale_divisor: None,
                },
                ChannelSpec {
                    id: "G.KIP.00.BHZ".into(),
                    label: Some("Hawaii".into()),
                    scale_divisor: Some(50.0),
                },
            ],
            frame_rate: 30,
            display_divisor: 100.0,
            alert_threshold: 200.0,
            cooldown_secs: 300,
            retention_samples: 6_000,
            backfill_secs: 600,
            sample_rate_hz: 20.0,
        }
    }
}

impl MonitorConfig {
    pub fn load(path: &Path) -> Result<Self, MonitorError> {
        let text = fs::read_to_string(path).map_err(|source| MonitorError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| MonitorError::ConfigParse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn channel_ids(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.id.clone()).collect()
    }

    pub fn label_for(&self, channel: &str) -> Option<&str> {
        self.channels
            .iter()
            .find(|c| c.id == channel)
            .and_then(|c| c.label.as_deref())
    }

    pub fn divisor_for(&self, channel: &str) -> f64 {
        self.channels
            .iter()
            .find(|c| c.id == channel)
            .and_then(|c| c.scale_divisor)
            .unwrap_or(self.display_divisor)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn backfill(&self) -> Duration {
        Duration::from_secs(self.backfill_secs)
    }

    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate.max(1) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_geoscope_set() {
        let config = MonitorConfig::default();
        assert_eq!(config.channels.len(), 4);
        assert_eq!(config.label_for("G.INU.00.BHZ"), Some("Japan"));
        assert_eq!(config.divisor_for("G.PEL.00.BHZ"), 100.0);
        assert_eq!(config.divisor_for("G.KIP.00.BHZ"), 50.0);
        assert_eq!(config.frame_budget(), Duration::from_secs_f64(1.0 / 30.0));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: MonitorConfig = serde_json::from_str(
            r#"{"frame_rate": 10, "channels": [{"id": "G.PEL.00.BHZ"}]}"#,
        )
        .unwrap();
        assert_eq!(config.frame_rate, 10);
        assert_eq!(config.channels.len(), 1);
        assert_eq!(config.label_for("G.PEL.00.BHZ"), None);
        assert_eq!(config.divisor_for("G.PEL.00.BHZ"), 100.0);
        assert_eq!(config.cooldown(), Duration::from_secs(300));
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = MonitorConfig::load(Path::new("/nonexistent/seiswatch.json"))
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert!(err.contains("/nonexistent/seiswatch.json"));
    }
}
