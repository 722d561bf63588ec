//! Human-readable status lines, one per deployment stage.

use std::error::Error;
use tracing::{error, info};

const SUCCESS_MARKER: &str = "✅";
const FAILURE_MARKER: &str = "❌";

#[derive(Debug, Clone, Copy, Default)]
pub struct Report {
    markers: bool,
}

impl Report {
    pub fn new(markers: bool) -> Self {
        Report { markers }
    }

    fn line(&self, marker: &str, message: &str) -> String {
        if self.markers {
            format!("{} {}", marker, message)
        } else {
            String::from(message)
        }
    }

    /// The status line for a completed stage.
    pub fn success_line(&self, message: &str) -> String {
        self.line(SUCCESS_MARKER, message)
    }

    /// The status line for a failure, including every underlying
    /// cause.
    pub fn failure_line(&self, err: &dyn Error) -> String {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        self.line(FAILURE_MARKER, &message)
    }

    pub fn success(&self, message: &str) {
        info!("{}", self.success_line(message));
    }

    pub fn failure(&self, err: &dyn Error) {
        error!("{}", self.failure_line(err));
    }
}
