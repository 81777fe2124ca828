use camino::{Utf8Path, Utf8PathBuf};
use reqwest::Url;

use crate::domain::ResourceName;
use crate::error::FetchError;

pub const DEFAULT_BASE_URL: &str = "https://movingai.com/benchmarks/mapf";

pub const DEFAULT_OUTPUT_ROOT: &str = "moving-ai";

/// Grid maps plus the two scenario sets published alongside them.
pub const DEFAULT_RESOURCES: &[&str] = &["mapf-map", "mapf-scen-random", "mapf-scen-even"];

/// Everything a pipeline run needs to know about what to fetch and where to put it.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    resources: Vec<ResourceName>,
    base_url: String,
    output_root: Utf8PathBuf,
}

impl PipelineConfig {
    pub fn new<S: AsRef<str>>(
        resources: &[S],
        base_url: &str,
        output_root: impl Into<Utf8PathBuf>,
    ) -> Result<Self, FetchError> {
        let resources = resources
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<ResourceName>, FetchError>>()?;

        let parsed = Url::parse(base_url).map_err(|err| FetchError::InvalidBaseUrl {
            url: base_url.to_string(),
            message: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidBaseUrl {
                url: base_url.to_string(),
                message: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        Ok(Self {
            resources,
            base_url: base_url.trim_end_matches('/').to_string(),
            output_root: output_root.into(),
        })
    }

    /// The hardcoded benchmark set the binary fetches.
    pub fn builtin() -> Result<Self, FetchError> {
        Self::new(DEFAULT_RESOURCES, DEFAULT_BASE_URL, DEFAULT_OUTPUT_ROOT)
    }

    pub fn resources(&self) -> &[ResourceName] {
        &self.resources
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn output_root(&self) -> &Utf8Path {
        &self.output_root
    }

    pub fn archive_url(&self, name: &ResourceName) -> String {
        format!("{}/{}", self.base_url, name.archive_file_name())
    }
}
