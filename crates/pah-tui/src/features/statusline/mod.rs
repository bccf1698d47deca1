//! Status line state: connection indicator and transient notices.

use std::time::{Duration, Instant};

/// How long a notice stays visible.
const NOTICE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
    shown_at: Instant,
}

#[derive(Debug, Default)]
pub struct StatusState {
    connected: bool,
    connection_error: Option<String>,
    notice: Option<Notice>,
}

impl StatusState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_connected(&mut self) {
        self.connected = true;
        self.connection_error = None;
    }

    pub fn set_disconnected(&mut self, error: impl Into<String>) {
        self.connected = false;
        self.connection_error = Some(error.into());
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn connection_error(&self) -> Option<&str> {
        self.connection_error.as_deref()
    }

    pub fn notify(&mut self, text: impl Into<String>) {
        self.set_notice(text, false);
    }

    pub fn notify_error(&mut self, text: impl Into<String>) {
        self.set_notice(text, true);
    }

    fn set_notice(&mut self, text: impl Into<String>, is_error: bool) {
        self.notice = Some(Notice {
            text: text.into(),
            is_error,
            shown_at: Instant::now(),
        });
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Drops the notice once its TTL passes. Called from the tick path.
    pub fn expire_notice(&mut self) {
        if self
            .notice
            .as_ref()
            .is_some_and(|n| n.shown_at.elapsed() >= NOTICE_TTL)
        {
            self.notice = None;
        }
    }
}
