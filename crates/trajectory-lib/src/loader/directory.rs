//! Loading a dataset from a local directory

use super::{DatasetLayout, ImageResolver, LoadedData, parse_json};
use crate::{DataError, Result};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Resolves image ids against the files of the dataset's `images` directory.
///
/// URLs are produced lazily and tracked until [`ImageResolver::cleanup`], which
/// only forgets them: a `file://` URL holds no resources.
#[derive(Debug)]
pub struct DirectoryImageResolver {
    layout: DatasetLayout,
    /// File name -> path, for the files directly inside the images directory
    images: HashMap<String, PathBuf>,
    /// URLs handed out since the last cleanup
    issued: HashSet<String>,
}

impl DirectoryImageResolver {
    fn new(layout: DatasetLayout, images: HashMap<String, PathBuf>) -> Self {
        Self {
            layout,
            images,
            issued: HashSet::new(),
        }
    }

    /// Number of URLs currently held
    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }
}

impl ImageResolver for DirectoryImageResolver {
    fn resolve(&mut self, image_id: &str) -> Option<String> {
        let path = self
            .layout
            .image_candidates(image_id)
            .find_map(|name| self.images.get(&name))?;
        let url = url::Url::from_file_path(path).ok()?.to_string();
        self.issued.insert(url.clone());
        Some(url)
    }

    fn cleanup(&mut self) {
        if !self.issued.is_empty() {
            tracing::debug!("Forgetting {} issued image URLs", self.issued.len());
        }
        self.issued.clear();
    }
}

/// Load a dataset from a directory using the default [`DatasetLayout`].
pub async fn load_from_directory(root: impl AsRef<Path>) -> Result<LoadedData> {
    load_from_directory_with(root, &DatasetLayout::default()).await
}

/// Load a dataset from a directory.
///
/// `root` may be relative; it is resolved against the working directory first.
/// Only the immediate children are considered. An `images` child directory is
/// indexed by file name for on-demand resolution.
pub async fn load_from_directory_with(
    root: impl AsRef<Path>,
    layout: &DatasetLayout,
) -> Result<LoadedData> {
    #[cfg(feature = "profiling")]
    profiling::scope!("loader::load_from_directory");

    // file:// URLs need absolute paths
    let root = &canonicalize(root.as_ref()).await?;
    let mut file_names = Vec::new();
    let mut images = HashMap::new();

    let mut entries = read_dir(root).await?;
    while let Some(entry) = next_entry(root, &mut entries).await? {
        let file_type = entry.file_type().await.map_err(|source| DataError::ReadFile {
            path: entry.path(),
            source,
        })?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::warn!("Skipping non UTF-8 entry {}", entry.path().display());
            continue;
        };

        if file_type.is_dir() && name == layout.images_dir {
            images = index_images(&entry.path()).await?;
        } else if file_type.is_file() {
            file_names.push(name);
        }
    }
    // Directory iteration order is platform dependent
    file_names.sort();

    let names: Vec<&str> = file_names.iter().map(String::as_str).collect();
    let files = layout.select(&names);
    let trajectory = files
        .trajectory
        .ok_or_else(|| DataError::MissingTrajectory(root.display().to_string()))?;

    let (trajectory_geometry, shot_metadata, object_annotations) = tokio::try_join!(
        read_json(root, trajectory),
        read_optional_json(root, files.metadata),
        read_optional_json(root, files.objects),
    )?;

    tracing::info!(
        "Loaded dataset from {} ({} images indexed)",
        root.display(),
        images.len()
    );

    Ok(LoadedData {
        trajectory_geometry,
        shot_metadata,
        object_annotations,
        image_resolver: Box::new(DirectoryImageResolver::new(layout.clone(), images)),
    })
}

async fn canonicalize(path: &Path) -> Result<PathBuf> {
    tokio::fs::canonicalize(path)
        .await
        .map_err(|source| DataError::ReadFile {
            path: path.to_path_buf(),
            source,
        })
}

async fn read_dir(path: &Path) -> Result<tokio::fs::ReadDir> {
    tokio::fs::read_dir(path)
        .await
        .map_err(|source| DataError::ReadFile {
            path: path.to_path_buf(),
            source,
        })
}

async fn next_entry(
    path: &Path,
    entries: &mut tokio::fs::ReadDir,
) -> Result<Option<tokio::fs::DirEntry>> {
    entries
        .next_entry()
        .await
        .map_err(|source| DataError::ReadFile {
            path: path.to_path_buf(),
            source,
        })
}

/// Index the files directly inside `dir` by file name
async fn index_images(dir: &Path) -> Result<HashMap<String, PathBuf>> {
    let mut images = HashMap::new();
    let mut entries = read_dir(dir).await?;
    while let Some(entry) = next_entry(dir, &mut entries).await? {
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if let (true, Some(name)) = (is_file, entry.file_name().to_str()) {
            images.insert(name.to_string(), entry.path());
        }
    }
    Ok(images)
}

async fn read_json(root: &Path, name: &str) -> Result<Value> {
    let path = root.join(name);
    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| DataError::ReadFile { path, source })?;
    parse_json(name, &text)
}

async fn read_optional_json(root: &Path, name: Option<&str>) -> Result<Option<Value>> {
    match name {
        Some(name) => read_json(root, name).await.map(Some),
        None => Ok(None),
    }
}
