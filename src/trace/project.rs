//! Project identifier resolution.
//!
//! The project id is needed to build trace resource names. It is taken from
//! configuration (which `GOOGLE_CLOUD_PROJECT` feeds) or, failing that, from
//! the compute metadata server. It is resolved once at startup and handed to
//! the middleware explicitly.

use std::fmt;
use std::time::Duration;

use crate::config::ProjectConfig;

/// Metadata server address used when no host override is configured.
pub const DEFAULT_METADATA_HOST: &str = "169.254.169.254";

const PROJECT_ID_PATH: &str = "/computeMetadata/v1/project/project-id";
const METADATA_FLAVOR: &str = "Metadata-Flavor";

/// Errors resolving the project id. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("metadata server request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("metadata server returned status {0}")]
    Status(u16),

    #[error("metadata server returned an empty project id")]
    Empty,
}

/// Cloud project identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve from configuration, querying the metadata server when no id
    /// is configured.
    pub async fn resolve(config: &ProjectConfig) -> Result<Self, ProjectError> {
        if let Some(id) = config.project_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            tracing::debug!(project_id = id, "Using configured project id");
            return Ok(Self::new(id));
        }

        let host = config
            .metadata_host
            .as_deref()
            .unwrap_or(DEFAULT_METADATA_HOST);
        let timeout = Duration::from_secs(config.metadata_timeout_secs);
        let id = Self::from_metadata(host, timeout).await?;

        tracing::info!(
            project_id = %id,
            metadata_host = host,
            "Resolved project id from metadata server"
        );
        Ok(id)
    }

    /// Query the metadata server at `host` for the project id.
    pub async fn from_metadata(host: &str, timeout: Duration) -> Result<Self, ProjectError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()?;

        let res = client
            .get(format!("http://{}{}", host, PROJECT_ID_PATH))
            .header(METADATA_FLAVOR, "Google")
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(ProjectError::Status(status.as_u16()));
        }

        let body = res.text().await?;
        let id = body.trim();
        if id.is_empty() {
            return Err(ProjectError::Empty);
        }
        Ok(Self::new(id))
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
