use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

/// Where fetched artifacts land on a real device.
pub const DOWNLOAD_DIR: &str = "/home/core";

/// Local action that applies a downloaded update.
pub const APPLY_SCRIPT: &str = "/home/core/updater.sh";

/// Artifact name appended to the codebase URL.
pub const ARTIFACT_NAME: &str = "webapp.tar.gz";

/// Retrieves a named artifact from an update codebase into local storage.
/// Agents only care about success or failure, never about the payload.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn fetch(&self, base_url: &str, artifact: &str) -> Result<()>;
}

/// Invokes whatever applies the update locally.
#[async_trait]
pub trait UpdateApplier: Send + Sync {
    async fn apply(&self) -> Result<()>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
    dest_dir: PathBuf,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::with_dest(DOWNLOAD_DIR)
    }

    pub fn with_dest(dir: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            dest_dir: dir.into(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactFetcher for HttpFetcher {
    async fn fetch(&self, base_url: &str, artifact: &str) -> Result<()> {
        let url = format!("{}{}", base_url, artifact);
        let dest = self.dest_dir.join(artifact);
        info!("downloading {} to {}", url, dest.display());

        let reply = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {}", url))?;
        let bytes = reply
            .bytes()
            .await
            .with_context(|| format!("reading body of {}", url))?;

        tokio::fs::write(&dest, &bytes)
            .await
            .with_context(|| format!("writing {}", dest.display()))?;

        info!("{} bytes downloaded", bytes.len());
        Ok(())
    }
}

pub struct ScriptApplier {
    script: PathBuf,
}

impl ScriptApplier {
    pub fn new() -> Self {
        Self {
            script: APPLY_SCRIPT.into(),
        }
    }
}

impl Default for ScriptApplier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UpdateApplier for ScriptApplier {
    async fn apply(&self) -> Result<()> {
        info!("executing {}", self.script.display());

        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.script)
            .output()
            .await
            .with_context(|| format!("running {}", self.script.display()))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.script.display(),
                output.status,
                String::from_utf8_lossy(&output.stdout)
            );
        }
        Ok(())
    }
}
