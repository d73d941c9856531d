use std::sync::Mutex;

/// Where failed checks send the client.
pub const LOGIN_PATH: &str = "/login";

/// Fire-and-forget navigation side effect.
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, path: &str);
}

/// Navigator that only remembers where it was sent. Tests use it to count redirects.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.visits.lock().map(|v| v.len()).unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_to(&self, path: &str) {
        if let Ok(mut visits) = self.visits.lock() {
            visits.push(path.to_string());
        }
    }
}
