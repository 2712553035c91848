//! Report artifacts: one structured JSON record and one Markdown document
//! per successful analysis, both write-once and named by timestamp.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// The machine-readable form of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportArtifact {
    pub timestamp: DateTime<Utc>,
    pub analysis: String,
    pub data_summary: String,
}

/// Where the two artifacts of a run landed.
#[derive(Debug)]
pub struct ArtifactPaths {
    pub json: PathBuf,
    pub document: PathBuf,
}

/// Write both artifacts for one successful analysis. Files are created with
/// `create_new`, so a second run within the same second fails instead of
/// overwriting — an accepted limitation of second-granularity names.
pub fn write_artifacts(dir: &Path, analysis: &str, data_summary: &str) -> Result<ArtifactPaths> {
    let artifact = ReportArtifact {
        timestamp: Utc::now(),
        analysis: analysis.to_string(),
        data_summary: data_summary.to_string(),
    };
    let stamp = artifact.timestamp.format("%Y%m%d_%H%M%S");

    let json = dir.join(format!("market_analysis_{stamp}.json"));
    let file = File::create_new(&json)
        .with_context(|| format!("Failed to create {}", json.display()))?;
    serde_json::to_writer_pretty(file, &artifact)
        .with_context(|| format!("Failed to write {}", json.display()))?;
    info!(path = %json.display(), "JSON report saved");

    let document = dir.join(format!("market_report_{stamp}.md"));
    let mut file = File::create_new(&document)
        .with_context(|| format!("Failed to create {}", document.display()))?;
    file.write_all(render_document(&artifact).as_bytes())
        .with_context(|| format!("Failed to write {}", document.display()))?;
    info!(path = %document.display(), "Report document saved");

    Ok(ArtifactPaths { json, document })
}

fn render_document(artifact: &ReportArtifact) -> String {
    format!(
        "# Market Intelligence Report\n\n\
         Date: {}\n\n\
         ## AI Analysis\n\n\
         {}\n\n\
         ## Data Summary\n\n\
         ```\n{}\n```\n",
        artifact.timestamp.format("%Y-%m-%d %H:%M UTC"),
        artifact.analysis.trim(),
        artifact.data_summary.trim(),
    )
}
