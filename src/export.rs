// src/export.rs

//! Writes the finished pages out of the session.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::errors::Result;
use crate::pages::ExportPage;
use crate::types::PageIndex;

/// Consumer of the ordered list of complete pages.
pub trait Exporter {
    fn export(&self, pages: &[ExportPage<'_>]) -> Result<ExportSummary>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub files: Vec<PathBuf>,
    pub manifest: PathBuf,
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    title: &'a str,
    pages: Vec<ManifestPage<'a>>,
}

#[derive(Debug, Serialize)]
struct ManifestPage<'a> {
    index: PageIndex,
    kind: &'static str,
    file: String,
    mime_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dialogue: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scene: Option<&'a str>,
}

/// Writes one `NN-<kind>.<ext>` file per page plus `manifest.json`.
#[derive(Debug, Clone)]
pub struct DirectoryExporter {
    dir: PathBuf,
    title: String,
}

impl DirectoryExporter {
    pub fn new(dir: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            title: title.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// File name of one exported page, e.g. `03-story.png`.
pub fn page_file_name(page: &ExportPage<'_>) -> String {
    format!(
        "{:02}-{}.{}",
        page.index,
        page.kind.as_str().replace('_', "-"),
        page.artifact.extension()
    )
}

impl Exporter for DirectoryExporter {
    fn export(&self, pages: &[ExportPage<'_>]) -> Result<ExportSummary> {
        fs::create_dir_all(&self.dir)?;

        let mut files = Vec::with_capacity(pages.len());
        let mut entries = Vec::with_capacity(pages.len());

        for page in pages {
            let name = page_file_name(page);
            let path = self.dir.join(&name);
            fs::write(&path, &page.artifact.data[..])?;
            debug!(page = page.index, path = %path.display(), bytes = page.artifact.len(), "page written");

            entries.push(ManifestPage {
                index: page.index,
                kind: page.kind.as_str(),
                file: name,
                mime_type: &page.artifact.mime_type,
                caption: page.beat.map(|b| b.caption.as_str()),
                dialogue: page.beat.and_then(|b| b.dialogue.as_deref()),
                scene: page.beat.map(|b| b.scene.as_str()),
            });
            files.push(path);
        }

        let manifest = Manifest {
            title: &self.title,
            pages: entries,
        };
        let manifest_path = self.dir.join("manifest.json");
        fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;

        info!(dir = %self.dir.display(), pages = files.len(), "comic exported");
        Ok(ExportSummary {
            files,
            manifest: manifest_path,
        })
    }
}
