use std::time::{Duration, Instant};

/// Delivery seam so tests can record notifications instead of sending them.
pub trait Notify {
    fn notify(&self, message: &str);
}

/// Mutable alert bookkeeping owned by the scheduler. Idle vs cooling is
/// derived lazily from the last notification timestamp, there is no timer.
#[derive(Default)]
pub struct AlertState {
    last_notified: Option<Instant>,
    capture_pending: bool,
}

impl AlertState {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-shot: returns true at most once per notification.
    pub fn take_capture_request(&mut self) -> bool {
        std::mem::take(&mut self.capture_pending)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum AlertOutcome {
    /// No breach this frame.
    Quiet,
    /// Breach detected but the cooldown window is still open.
    Suppressed,
    /// Breach detected, notification dispatched, cooldown re-anchored.
    Notified,
}

pub fn breach_message(channel: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{channel} ({label}) breached threshold"),
        None => format!("{channel} breached threshold"),
    }
}

/// Compares each rendered sample against the channel's prior-frame baseline.
/// The cooldown is global across channels: one notification quiets the whole
/// monitor until it expires.
pub struct AlertManager {
    threshold: f64,
    cooldown: Duration,
}

impl AlertManager {
    pub fn new(threshold: f64, cooldown: Duration) -> Self {
        Self { threshold, cooldown }
    }

    pub fn evaluate(
        &self,
        channel: &str,
        label: Option<&str>,
        window: &[f64],
        prior: Option<f64>,
        state: &mut AlertState,
        now: Instant,
        notifier: &dyn Notify,
    ) -> AlertOutcome {
        let Some(prior) = prior else {
            // First frame for this channel, nothing to compare against.
            return AlertOutcome::Quiet;
        };
        let breached = window
            .iter()
            .any(|sample| (prior - sample).abs() > self.threshold);
        if !breached {
            return AlertOutcome::Quiet;
        }
        if let Some(last) = state.last_notified {
            if now.duration_since(last) <= self.cooldown {
                log::debug!("breach on {channel} suppressed by cooldown");
                return AlertOutcome::Suppressed;
            }
        }
        let message = breach_message(channel, label);
        log::info!("alert: {message}");
        notifier.notify(&message);
        state.last_notified = Some(now);
        state.capture_pending = true;
        AlertOutcome::Notified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl Notify for RecordingNotifier {
        fn notify(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    fn manager() -> AlertManager {
        AlertManager::new(200.0, Duration::from_secs(300))
    }

    #[test]
    fn small_deviation_stays_quiet() {
        let notifier = RecordingNotifier::default();
        let mut state = AlertState::new();
        let outcome = manager().evaluate(
            "G.PEL.00.BHZ",
            Some("Chile"),
            &[5.0, 6.0],
            Some(1.0),
            &mut state,
            Instant::now(),
            &notifier,
        );
        assert_eq!(outcome, AlertOutcome::Quiet);
        assert!(notifier.messages.lock().unwrap().is_empty());
        assert!(!state.take_capture_request());
    }

    #[test]
    fn breach_fires_exactly_once_and_requests_capture() {
        let notifier = RecordingNotifier::default();
        let mut state = AlertState::new();
        let outcome = manager().evaluate(
            "G.PEL.00.BHZ",
            Some("Chile"),
            &[300.0],
            Some(1.0),
            &mut state,
            Instant::now(),
            &notifier,
        );
        assert_eq!(outcome, AlertOutcome::Notified);
        let messages = notifier.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0], "G.PEL.00.BHZ (Chile) breached threshold");
        drop(messages);
        assert!(state.take_capture_request());
        assert!(!state.take_capture_request());
    }

    #[test]
    fn cooldown_suppresses_across_channels() {
        let notifier = RecordingNotifier::default();
        let mut state = AlertState::new();
        let start = Instant::now();
        let mgr = manager();
        mgr.evaluate(
            "G.PEL.00.BHZ",
            None,
            &[300.0],
            Some(1.0),
            &mut state,
            start,
            &notifier,
        );
        // A different channel one minute later is still inside the window.
        let outcome = mgr.evaluate(
            "G.INU.00.BHZ",
            None,
            &[300.0],
            Some(1.0),
            &mut state,
            start + Duration::from_secs(60),
            &notifier,
        );
        assert_eq!(outcome, AlertOutcome::Suppressed);
        assert_eq!(notifier.messages.lock().unwrap().len(), 1);
    }

    #[test]
    fn suppressed_breach_does_not_extend_the_cooldown() {
        let notifier = RecordingNotifier::default();
        let mut state = AlertState::new();
        let start = Instant::now();
        let mgr = manager();
        mgr.evaluate("G.PEL.00.BHZ", None, &[300.0], Some(1.0), &mut state, start, &notifier);
        mgr.evaluate(
            "G.PEL.00.BHZ",
            None,
            &[300.0],
            Some(1.0),
            &mut state,
            start + Duration::from_secs(299),
            &notifier,
        );
        // 301 s after the first notification the window has expired even
        // though a suppressed breach happened in between.
        let outcome = mgr.evaluate(
            "G.PEL.00.BHZ",
            None,
            &[300.0],
            Some(1.0),
            &mut state,
            start + Duration::from_secs(301),
            &notifier,
        );
        assert_eq!(outcome, AlertOutcome::Notified);
        assert_eq!(notifier.messages.lock().unwrap().len(), 2);
    }

    #[test]
    fn missing_baseline_never_alerts() {
        let notifier = RecordingNotifier::default();
        let mut state = AlertState::new();
        let outcome = manager().evaluate(
            "G.PEL.00.BHZ",
            None,
            &[10_000.0],
            None,
            &mut state,
            Instant::now(),
            &notifier,
        );
        assert_eq!(outcome, AlertOutcome::Quiet);
        assert!(notifier.messages.lock().unwrap().is_empty());
    }
}
