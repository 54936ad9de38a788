//! Loading a dataset from a ZIP archive
//!
//! The archive may hold the dataset at its root or nested under a single shared
//! folder. Images are extracted eagerly into a temporary directory owned by the
//! resolver.

use super::{DatasetLayout, ImageResolver, LoadedData, parse_json};
use crate::{DataError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use zip::ZipArchive;

type Archive = ZipArchive<Cursor<Vec<u8>>>;

/// Resolves image ids against images extracted from the archive at load time.
#[derive(Debug)]
pub struct ArchiveImageResolver {
    layout: DatasetLayout,
    /// File name -> URL of the extracted copy
    urls: HashMap<String, String>,
    /// Holds the extracted files; removed on cleanup
    dir: Option<tempfile::TempDir>,
}

impl ArchiveImageResolver {
    /// Extract the image entries directly inside `images_prefix`
    fn extract(
        archive: &mut Archive,
        entries: &[String],
        images_prefix: &str,
        layout: DatasetLayout,
    ) -> Result<Self> {
        let image_entries: Vec<(&str, &str)> = entries
            .iter()
            .filter_map(|entry| {
                let name = entry.strip_prefix(images_prefix)?;
                (!name.is_empty() && !name.contains('/') && layout.is_image(name))
                    .then_some((entry.as_str(), name))
            })
            .collect();

        let mut urls = HashMap::new();
        if image_entries.is_empty() {
            return Ok(Self {
                layout,
                urls,
                dir: None,
            });
        }

        let dir = tempfile::Builder::new()
            .prefix("trajectory-images-")
            .tempdir()?;

        for (entry, name) in image_entries {
            let mut blob = Vec::new();
            archive
                .by_name(entry)?
                .read_to_end(&mut blob)
                .map_err(|source| DataError::ReadFile {
                    path: PathBuf::from(entry),
                    source,
                })?;

            let path = dir.path().join(name);
            std::fs::write(&path, &blob)?;

            if let Ok(url) = url::Url::from_file_path(&path) {
                urls.insert(name.to_string(), url.to_string());
            }
        }

        Ok(Self {
            layout,
            urls,
            dir: Some(dir),
        })
    }

    /// Number of images currently available
    pub fn image_count(&self) -> usize {
        self.urls.len()
    }
}

impl ImageResolver for ArchiveImageResolver {
    fn resolve(&mut self, image_id: &str) -> Option<String> {
        self.layout
            .image_candidates(image_id)
            .find_map(|name| self.urls.get(&name).cloned())
    }

    fn cleanup(&mut self) {
        self.urls.clear();
        if let Some(dir) = self.dir.take() {
            tracing::debug!("Removing extracted images in {}", dir.path().display());
            if let Err(e) = dir.close() {
                tracing::warn!("Failed to remove extracted images: {}", e);
            }
        }
    }
}

/// Load a dataset from ZIP archive bytes using the default [`DatasetLayout`].
pub async fn load_from_archive(bytes: Vec<u8>) -> Result<LoadedData> {
    load_from_archive_with(bytes, &DatasetLayout::default()).await
}

/// Load a dataset from ZIP archive bytes.
///
/// Decompression runs on the blocking thread pool.
pub async fn load_from_archive_with(bytes: Vec<u8>, layout: &DatasetLayout) -> Result<LoadedData> {
    let layout = layout.clone();
    tokio::task::spawn_blocking(move || extract_dataset(bytes, layout)).await?
}

fn extract_dataset(bytes: Vec<u8>, layout: DatasetLayout) -> Result<LoadedData> {
    #[cfg(feature = "profiling")]
    profiling::scope!("loader::extract_dataset");

    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let entries: Vec<String> = archive
        .file_names()
        .filter(|name| !is_macos_metadata(name))
        .map(str::to_string)
        .collect();

    let prefix = common_root_prefix(&entries);
    tracing::debug!("Archive has {} entries, root prefix {:?}", entries.len(), prefix);

    let top_level: Vec<&str> = entries
        .iter()
        .filter_map(|entry| entry.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty() && !rest.contains('/'))
        .collect();
    let files = layout.select(&top_level);
    let trajectory = files
        .trajectory
        .ok_or_else(|| DataError::MissingTrajectory("archive".to_string()))?;

    let trajectory_geometry = read_entry_json(&mut archive, prefix, trajectory)?;
    let shot_metadata = files
        .metadata
        .map(|name| read_entry_json(&mut archive, prefix, name))
        .transpose()?;
    let object_annotations = files
        .objects
        .map(|name| read_entry_json(&mut archive, prefix, name))
        .transpose()?;

    let images_prefix = format!("{}{}/", prefix, layout.images_dir);
    let resolver = ArchiveImageResolver::extract(&mut archive, &entries, &images_prefix, layout)?;

    tracing::info!(
        "Loaded dataset from archive ({} images extracted)",
        resolver.image_count()
    );

    Ok(LoadedData {
        trajectory_geometry,
        shot_metadata,
        object_annotations,
        image_resolver: Box::new(resolver),
    })
}

/// Detect a single root folder shared by every entry.
///
/// The candidate comes from the first entry's leading path segment and is only
/// used if every entry starts with it; otherwise the prefix is empty.
fn common_root_prefix(entries: &[String]) -> &str {
    let Some(candidate) = entries
        .first()
        .and_then(|first| first.find('/').map(|slash| &first[..=slash]))
    else {
        return "";
    };

    if entries.iter().all(|entry| entry.starts_with(candidate)) {
        candidate
    } else {
        ""
    }
}

/// Resource-fork entries added by the macOS archiver
fn is_macos_metadata(name: &str) -> bool {
    name.split('/').any(|part| part == "__MACOSX")
}

fn read_entry_json(archive: &mut Archive, prefix: &str, name: &str) -> Result<Value> {
    let full_name = format!("{}{}", prefix, name);
    let mut text = String::new();
    archive
        .by_name(&full_name)?
        .read_to_string(&mut text)
        .map_err(|source| DataError::ReadFile {
            path: PathBuf::from(&full_name),
            source,
        })?;
    parse_json(name, &text)
}
