use std::collections::HashMap;

/// Mean of the rendered window, the per-frame summary the alert check
/// compares against.
pub fn window_mean(window: &[f64]) -> Option<f64> {
    if window.is_empty() {
        return None;
    }
    Some(window.iter().sum::<f64>() / window.len() as f64)
}

/// Per-channel mean of the previous frame's window. The scheduler reads the
/// prior value before evaluating alerts and writes the new one after, so a
/// breach is always judged against the frame before it.
#[derive(Default)]
pub struct BaselineTracker {
    baselines: HashMap<String, f64>,
}

impl BaselineTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, channel: &str) -> Option<f64> {
        self.baselines.get(channel).copied()
    }

    pub fn update(&mut self, channel: &str, mean: Option<f64>) {
        if let Some(mean) = mean {
            self.baselines.insert(channel.to_string(), mean);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_scaled_window() {
        let window = vec![1.0, 1.0, 1.0, 1.0];
        assert_eq!(window_mean(&window), Some(1.0));
        assert_eq!(window_mean(&[]), None);
    }

    #[test]
    fn tracker_reports_prior_until_updated() {
        let mut tracker = BaselineTracker::new();
        assert_eq!(tracker.get("G.PEL.00.BHZ"), None);
        tracker.update("G.PEL.00.BHZ", Some(1.0));
        assert_eq!(tracker.get("G.PEL.00.BHZ"), Some(1.0));
        // Empty windows leave the last known baseline in place.
        tracker.update("G.PEL.00.BHZ", None);
        assert_eq!(tracker.get("G.PEL.00.BHZ"), Some(1.0));
    }
}
