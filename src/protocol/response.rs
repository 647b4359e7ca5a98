use serde::Deserialize;

use crate::error::{Error, Result};

/// Server reply. Servers routinely omit parts of this document, so every
/// nested layer is optional and access goes through accessors that surface
/// absence instead of panicking.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename = "response")]
pub struct Response {
    #[serde(rename = "@protocol", default)]
    pub protocol: String,
    #[serde(rename = "app", default)]
    pub apps: Vec<AppResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppResponse {
    #[serde(rename = "@appid", default)]
    pub app_id: String,
    #[serde(rename = "@status", default)]
    pub status: String,
    #[serde(rename = "updatecheck")]
    pub update_check: Option<UpdateCheck>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCheck {
    #[serde(rename = "@status", default)]
    pub status: String,
    pub urls: Option<Urls>,
    pub manifest: Option<Manifest>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Urls {
    #[serde(rename = "url", default)]
    pub urls: Vec<Url>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Url {
    #[serde(rename = "@codebase", default)]
    pub codebase: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(rename = "@version", default)]
    pub version: String,
}

pub fn parse_response(raw: &str) -> Result<Response> {
    quick_xml::de::from_str(raw).map_err(|e| Error::MalformedResponse(e.to_string()))
}

impl Response {
    /// First application entry, if the server included one.
    pub fn app(&self) -> Option<&AppResponse> {
        self.apps.first()
    }
}

impl UpdateCheck {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    /// First listed download base URL. Selection is deterministic.
    pub fn first_codebase(&self) -> Option<&str> {
        self.urls
            .as_ref()?
            .urls
            .first()
            .map(|u| u.codebase.as_str())
            .filter(|c| !c.is_empty())
    }

    pub fn manifest_version(&self) -> Option<&str> {
        self.manifest
            .as_ref()
            .map(|m| m.version.as_str())
            .filter(|v| !v.is_empty())
    }
}
