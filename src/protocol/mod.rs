pub mod request;
pub mod response;

pub use request::{App, Event, Request};
pub use response::{Response, UpdateCheck};

pub const PROTOCOL_VERSION: &str = "3.0";
pub const OS_VERSION: &str = "lsb";
pub const OS_PLATFORM: &str = "CoreOS";

/// Path every exchange is POSTed to, under the configured server.
pub const UPDATE_PATH: &str = "/v1/update/";

/// Diagnostic code attached to any event whose result signals failure.
pub const EVENT_ERROR_CODE: &str = "2000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    UpdateComplete,
    DownloadStarted,
    DownloadFinished,
}

impl EventType {
    pub fn code(self) -> &'static str {
        match self {
            EventType::UpdateComplete => "3",
            EventType::DownloadStarted => "13",
            EventType::DownloadFinished => "14",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Error,
    Success,
    SuccessReboot,
}

impl EventResult {
    pub fn code(self) -> &'static str {
        match self {
            EventResult::Error => "0",
            EventResult::Success => "1",
            EventResult::SuccessReboot => "2",
        }
    }

    pub fn is_failure(self) -> bool {
        matches!(self, EventResult::Error)
    }
}
