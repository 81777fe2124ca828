use std::io::{self, Write};

use serde::Serialize;
use tracing::info;

use crate::domain::ResourceName;
use crate::pipeline::{ProgressEvent, ProgressSink, RunReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(result: &RunReport) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Progress as `tracing` events and a coloured summary on stdout.
pub struct TextOutput;

impl TextOutput {
    pub fn print_report(result: &RunReport) {
        let green = "\x1b[32m";
        let cyan = "\x1b[36m";
        let reset = "\x1b[0m";

        println!("{cyan}movingai-fetch summary{reset}");
        println!(
            "{green}Extracted resources: {} into {}{reset}",
            result.resources.len(),
            result.output_root
        );
        for item in &result.resources {
            println!(
                "{cyan}  {} ({} bytes, {} files) -> {}{reset}",
                item.name, item.bytes, item.files, item.extraction_dir
            );
        }
        println!(
            "{green}Removed archives: {}{reset}",
            result.removed_archives.len()
        );
    }
}

impl ProgressSink for TextOutput {
    fn event(&self, event: ProgressEvent) {
        let resource = event
            .resource
            .as_ref()
            .map_or("-", ResourceName::as_str);
        let elapsed_ms = event
            .elapsed
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        info!(
            phase = %event.phase,
            resource = %resource,
            elapsed_ms,
            "{}",
            event.message.trim()
        );
    }
}
