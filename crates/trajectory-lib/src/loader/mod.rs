//! Source loaders
//!
//! Three interchangeable ways of obtaining a dataset, all producing a [`LoadedData`]:
//!
//! - [`load_from_directory`]: a local directory
//! - [`load_from_archive`]: the bytes of a ZIP archive
//! - [`load_from_urls`]: remote URLs
//!
//! Loaders only check that the files exist and contain valid JSON. Schema problems
//! surface later as an empty [`ParsedTrajectory`](crate::ParsedTrajectory).

mod archive;
mod directory;
mod remote;

pub use archive::{ArchiveImageResolver, load_from_archive, load_from_archive_with};
pub use directory::{DirectoryImageResolver, load_from_directory, load_from_directory_with};
pub use remote::{RemoteImageResolver, RemoteSource, load_from_urls};

use crate::{DataError, ParsedTrajectory, Result, parse_trajectory};
use serde_json::Value;
use std::fmt;

/// File naming conventions of a dataset
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    /// Preferred trajectory geometry file name
    pub trajectory_file: String,
    /// Extension accepted for the geometry file when the preferred name is absent
    pub trajectory_extension: String,
    /// Preferred shot metadata file name
    pub metadata_file: String,
    /// Extension accepted for the metadata file when the preferred name is absent
    pub metadata_extension: String,
    /// Detected-object annotations file name
    pub objects_file: String,
    /// Sub-directory holding the images
    pub images_dir: String,
    /// Recognized image extensions, compared case-insensitively
    pub image_extensions: Vec<String>,
}

impl Default for DatasetLayout {
    fn default() -> Self {
        Self {
            trajectory_file: "trajectory.geojson".to_string(),
            trajectory_extension: ".geojson".to_string(),
            metadata_file: "trajectory.json".to_string(),
            metadata_extension: ".json".to_string(),
            objects_file: "objects.geojson".to_string(),
            images_dir: "images".to_string(),
            image_extensions: vec![".jpg".to_string(), ".jpeg".to_string(), ".png".to_string()],
        }
    }
}

/// The dataset files picked out of a listing
#[derive(Debug, Default, PartialEq)]
pub(crate) struct DatasetFiles<'a> {
    pub trajectory: Option<&'a str>,
    pub metadata: Option<&'a str>,
    pub objects: Option<&'a str>,
}

impl DatasetLayout {
    /// Pick the dataset files among the names of one directory level.
    ///
    /// The exact name wins; otherwise the first name with the right extension that
    /// is not excluded.
    pub(crate) fn select<'a>(&self, names: &[&'a str]) -> DatasetFiles<'a> {
        let trajectory = select_file(
            names,
            &self.trajectory_file,
            &self.trajectory_extension,
            &[self.objects_file.as_str()],
        );
        let metadata = select_file(
            names,
            &self.metadata_file,
            &self.metadata_extension,
            &[trajectory.unwrap_or_default()],
        );
        let objects = names
            .iter()
            .copied()
            .find(|name| *name == self.objects_file);

        tracing::debug!(
            "Selected trajectory={:?} metadata={:?} objects={:?}",
            trajectory,
            metadata,
            objects
        );

        DatasetFiles {
            trajectory,
            metadata,
            objects,
        }
    }

    /// Whether a file name carries one of the image extensions
    pub(crate) fn is_image(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.image_extensions
            .iter()
            .any(|ext| name.ends_with(&ext.to_lowercase()))
    }

    /// File names an image id may be stored under, in lookup order
    pub(crate) fn image_candidates<'a>(&'a self, image_id: &'a str) -> impl Iterator<Item = String> + 'a {
        std::iter::once(image_id.to_string()).chain(
            self.image_extensions
                .iter()
                .map(move |ext| format!("{}{}", image_id, ext)),
        )
    }
}

fn select_file<'a>(
    names: &[&'a str],
    exact: &str,
    extension: &str,
    exclude: &[&str],
) -> Option<&'a str> {
    names.iter().copied().find(|name| *name == exact).or_else(|| {
        names
            .iter()
            .copied()
            .find(|name| name.ends_with(extension) && !exclude.contains(name))
    })
}

/// Parse JSON text, naming the file in the error
pub(crate) fn parse_json(file: &str, text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|source| DataError::Json {
        file: file.to_string(),
        source,
    })
}

/// Turns image ids into URLs usable for display.
///
/// A resolver owns whatever it allocated to produce those URLs. `cleanup` releases
/// all of it and must be safe to call more than once.
pub trait ImageResolver: Send {
    /// URL for the image with this id, or `None` if the dataset does not have it.
    fn resolve(&mut self, image_id: &str) -> Option<String>;

    /// Release every resource handed out so far.
    fn cleanup(&mut self);
}

/// The raw contents of one loaded dataset.
///
/// The caller owns the resolver's resources and must call [`LoadedData::cleanup`]
/// before discarding or replacing this value.
pub struct LoadedData {
    /// Trajectory geometry, cameras in `[lat, lon, elevation]` order
    pub trajectory_geometry: Value,
    /// Optional shot metadata (capture times)
    pub shot_metadata: Option<Value>,
    /// Optional detected-object annotations (a GeoJSON FeatureCollection)
    pub object_annotations: Option<Value>,
    /// Image lookup for this dataset
    pub image_resolver: Box<dyn ImageResolver>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl LoadedData {
    /// Run the trajectory parser over the loaded geometry and metadata
    pub fn parse(&self) -> ParsedTrajectory {
        parse_trajectory(&self.trajectory_geometry, self.shot_metadata.as_ref())
    }

    /// Object annotations as a feature collection.
    ///
    /// `None` when absent or when the file is not a GeoJSON FeatureCollection.
    pub fn objects(&self) -> Option<geojson::FeatureCollection> {
        let value = self.object_annotations.as_ref()?;
        match geojson::FeatureCollection::try_from(value.clone()) {
            Ok(collection) => Some(collection),
            Err(e) => {
                tracing::warn!("Ignoring object annotations: {}", e);
                None
            }
        }
    }

    #[inline]
    pub fn resolve_image(&mut self, image_id: &str) -> Option<String> {
        self.image_resolver.resolve(image_id)
    }

    #[inline]
    pub fn cleanup(&mut self) {
        self.image_resolver.cleanup();
    }
}

impl fmt::Debug for LoadedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedData")
            .field("has_metadata", &self.shot_metadata.is_some())
            .field("has_objects", &self.object_annotations.is_some())
            .finish_non_exhaustive()
    }
}
