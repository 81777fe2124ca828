use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::domain::ResourceName;
use crate::error::FetchError;
use crate::extract::ArchiveExtractor;
use crate::fetch::ArchiveFetcher;
use crate::layout::OutputLayout;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: String,
    pub finished_at: String,
    pub output_root: String,
    pub resources: Vec<ResourceReport>,
    pub removed_archives: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceReport {
    pub name: String,
    pub url: String,
    pub bytes: u64,
    pub files: usize,
    pub extraction_dir: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Prepare,
    Fetch,
    Extract,
    Cleanup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Prepare => write!(f, "Prepare"),
            Phase::Fetch => write!(f, "Fetch"),
            Phase::Extract => write!(f, "Extract"),
            Phase::Cleanup => write!(f, "Cleanup"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub resource: Option<ResourceName>,
    pub message: String,
    pub elapsed: Option<Duration>,
}

/// Receives progress from every worker thread, so implementations must be `Sync`.
pub trait ProgressSink: Sync {
    fn event(&self, event: ProgressEvent);
}

pub struct Pipeline<F: ArchiveFetcher, E: ArchiveExtractor> {
    config: PipelineConfig,
    layout: OutputLayout,
    fetcher: F,
    extractor: E,
}

impl<F: ArchiveFetcher, E: ArchiveExtractor> Pipeline<F, E> {
    pub fn new(config: PipelineConfig, fetcher: F, extractor: E) -> Self {
        let layout = OutputLayout::new(config.output_root());
        Self {
            config,
            layout,
            fetcher,
            extractor,
        }
    }

    /// Fetches and extracts every configured resource concurrently, then removes the
    /// downloaded archives. Archive removal only happens once every worker has been
    /// joined and none of them failed; on failure the archives stay on disk.
    pub fn run(&self, sink: &dyn ProgressSink) -> Result<RunReport, FetchError> {
        let started_at = Utc::now();
        self.layout.ensure_root()?;
        sink.event(ProgressEvent {
            phase: Phase::Prepare,
            resource: None,
            message: format!(
                "{} resources into {}",
                self.config.resources().len(),
                self.layout.root()
            ),
            elapsed: None,
        });
        info!(
            resources = self.config.resources().len(),
            root = %self.layout.root(),
            "starting pipeline"
        );

        let results = thread::scope(|scope| {
            let handles = self
                .config
                .resources()
                .iter()
                .map(|name| (name, scope.spawn(move || self.process(name, sink))))
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .map(|(name, handle)| {
                    let result = handle
                        .join()
                        .unwrap_or_else(|_| Err(FetchError::WorkerPanicked(name.to_string())));
                    (name, result)
                })
                .collect::<Vec<_>>()
        });

        let mut resources = Vec::with_capacity(results.len());
        let mut first_error = None;
        for (name, result) in results {
            match result {
                Ok(report) => resources.push(report),
                Err(err) => {
                    error!(
                        resource = err.resource().unwrap_or(name.as_str()),
                        network = err.is_network(),
                        error = %err,
                        "resource failed"
                    );
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        let start = Instant::now();
        sink.event(ProgressEvent {
            phase: Phase::Cleanup,
            resource: None,
            message: "removing archives".to_string(),
            elapsed: None,
        });
        let removed = self.layout.remove_archives()?;
        sink.event(ProgressEvent {
            phase: Phase::Cleanup,
            resource: None,
            message: format!("removed {} archives", removed.len()),
            elapsed: Some(start.elapsed()),
        });
        info!(removed = removed.len(), "cleanup finished");

        Ok(RunReport {
            started_at: started_at.to_rfc3339(),
            finished_at: Utc::now().to_rfc3339(),
            output_root: self.layout.root().to_string(),
            resources,
            removed_archives: removed.iter().map(ToString::to_string).collect(),
        })
    }

    fn process(
        &self,
        name: &ResourceName,
        sink: &dyn ProgressSink,
    ) -> Result<ResourceReport, FetchError> {
        let url = self.config.archive_url(name);
        let archive = self.layout.archive_path(name);

        sink.event(ProgressEvent {
            phase: Phase::Fetch,
            resource: Some(name.clone()),
            message: format!("GET {url}"),
            elapsed: None,
        });
        info!(resource = %name, %url, "fetching archive");
        let start = Instant::now();
        let download = self.fetcher.fetch(name, &url, archive.as_std_path())?;
        sink.event(ProgressEvent {
            phase: Phase::Fetch,
            resource: Some(name.clone()),
            message: format!("wrote {} bytes to {archive}", download.bytes),
            elapsed: Some(start.elapsed()),
        });

        let dir = self.layout.ensure_extraction_dir(name)?;
        info!(resource = %name, dir = %dir, "extracting archive");
        let start = Instant::now();
        let extracted = self
            .extractor
            .extract(name, archive.as_std_path(), dir.as_std_path())?;
        sink.event(ProgressEvent {
            phase: Phase::Extract,
            resource: Some(name.clone()),
            message: format!("extracted {} files into {dir}", extracted.files),
            elapsed: Some(start.elapsed()),
        });

        Ok(ResourceReport {
            name: name.to_string(),
            url,
            bytes: download.bytes,
            files: extracted.files,
            extraction_dir: dir.to_string(),
        })
    }
}
