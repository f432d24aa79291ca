use std::thread;
use std::time::Duration;

use serde::Serialize;

use crate::stream::alert::Notify;

const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";
const TITLE: &str = "seiswatch";

#[derive(Clone, Serialize)]
struct PushoverRequest {
    token: String,
    user: String,
    title: String,
    message: String,
}

/// Sends breach notifications to Pushover. Delivery is fire-and-forget on a
/// throwaway thread so the scheduler never blocks on the network; failures
/// are logged and not retried.
pub struct PushoverNotifier {
    client: reqwest::blocking::Client,
    token: String,
    user: String,
}

impl PushoverNotifier {
    /// Reads `APP_TOKEN` and `USER_TOKEN`; absent either, there is nothing
    /// to deliver with.
    pub fn from_env() -> Option<Self> {
        let token = std::env::var("APP_TOKEN").ok()?;
        let user = std::env::var("USER_TOKEN").ok()?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .ok()?;
        Some(Self { client, token, user })
    }
}

impl Notify for PushoverNotifier {
    fn notify(&self, message: &str) {
        let request = PushoverRequest {
            token: self.token.clone(),
            user: self.user.clone(),
            title: TITLE.to_string(),
            message: message.to_string(),
        };
        let client = self.client.clone();
        thread::spawn(move || match client.post(PUSHOVER_URL).form(&request).send() {
            Ok(response) if response.status().is_success() => {
                log::debug!("pushover accepted notification");
            }
            Ok(response) => {
                log::warn!("pushover rejected notification: {}", response.status());
            }
            Err(err) => {
                log::warn!("pushover delivery failed: {err}");
            }
        });
    }
}

/// Fallback when no Pushover credentials are configured: breaches still
/// reach the log.
pub struct LogNotifier;

impl Notify for LogNotifier {
    fn notify(&self, message: &str) {
        log::warn!("alert (log only): {message}");
    }
}
