use serde::Serialize;

use super::{EVENT_ERROR_CODE, EventResult, EventType, OS_PLATFORM, OS_VERSION, PROTOCOL_VERSION};
use crate::error::{Error, Result};

/// One outgoing protocol document. Attribute order matters to the serializer:
/// attributes first, child elements after.
#[derive(Debug, Clone, Serialize)]
#[serde(rename = "request")]
pub struct Request {
    #[serde(rename = "@protocol")]
    pub protocol: &'static str,
    pub os: Os,
    #[serde(rename = "app")]
    pub apps: Vec<App>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Os {
    #[serde(rename = "@version")]
    pub version: &'static str,
    #[serde(rename = "@platform")]
    pub platform: &'static str,
    #[serde(rename = "@sp")]
    pub sp: &'static str,
}

impl Default for Os {
    fn default() -> Self {
        Self {
            version: OS_VERSION,
            platform: OS_PLATFORM,
            sp: "",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct App {
    #[serde(rename = "@appid")]
    pub app_id: String,
    #[serde(rename = "@version")]
    pub version: String,
    #[serde(rename = "@machineid")]
    pub machine_id: String,
    #[serde(rename = "@bootid")]
    pub boot_id: String,
    #[serde(rename = "@track")]
    pub track: String,
    #[serde(rename = "@oem")]
    pub oem: String,
    #[serde(rename = "updatecheck", skip_serializing_if = "Option::is_none")]
    pub update_check: Option<UpdateCheckRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping: Option<Ping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
}

/// Bare marker element asking the server for update status.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateCheckRequest {}

#[derive(Debug, Clone, Serialize)]
pub struct Ping {
    /// Days since the last report; fixed at one for the simulator.
    #[serde(rename = "@r")]
    pub last_report_days: &'static str,
    #[serde(rename = "@status")]
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Event {
    #[serde(rename = "@eventtype")]
    pub event_type: &'static str,
    #[serde(rename = "@eventresult")]
    pub event_result: &'static str,
    #[serde(rename = "@errorcode")]
    pub error_code: &'static str,
}

impl Request {
    pub fn with_app(app: App) -> Self {
        Self {
            protocol: PROTOCOL_VERSION,
            os: Os::default(),
            apps: vec![app],
        }
    }

    pub fn to_xml(&self) -> Result<String> {
        quick_xml::se::to_string(self).map_err(|e| Error::Encode(e.to_string()))
    }
}

impl App {
    pub fn new(app_id: &str, version: &str) -> Self {
        Self {
            app_id: app_id.to_string(),
            version: version.to_string(),
            machine_id: String::new(),
            boot_id: String::new(),
            track: String::new(),
            oem: String::new(),
            update_check: None,
            ping: None,
            event: None,
        }
    }

    pub fn request_update_check(&mut self) {
        self.update_check = Some(UpdateCheckRequest {});
    }

    pub fn add_ping(&mut self) {
        self.ping = Some(Ping {
            last_report_days: "1",
            status: "1",
        });
    }

    /// A failing result always carries the diagnostic code, success never does.
    pub fn add_event(&mut self, event_type: EventType, result: EventResult) {
        let error_code = if result.is_failure() {
            EVENT_ERROR_CODE
        } else {
            ""
        };
        self.event = Some(Event {
            event_type: event_type.code(),
            event_result: result.code(),
            error_code,
        });
    }
}
