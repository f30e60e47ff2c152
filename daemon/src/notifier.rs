//! Desktop notification on profile changes

use crate::profile::Profile;
use notify_rust::Notification;
use tracing::warn;

pub fn send_notification(summary: &str, body: &str) -> Result<(), notify_rust::error::Error> {
    Notification::new()
        .summary(summary)
        .body(body)
        .appname("powerpilot")
        .show()?;
    Ok(())
}

pub fn profile_changed(from: Option<Profile>, to: Profile, usage: f64) {
    let body = match from {
        Some(from) => format!("{from} → {to} (load {usage:.1}%)"),
        None => format!("{to} (load {usage:.1}%)"),
    };
    if let Err(e) = send_notification("Power profile changed", &body) {
        warn!("Failed to send notification: {}", e);
    }
}
