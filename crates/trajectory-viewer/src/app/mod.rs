//! Headless trajectory viewer application

pub mod picker;
pub mod settings;
pub mod state;

use settings::{Settings, Source};
use state::AppState;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use trajectory_lib::{
    DataError, LoadedData, RemoteSource, load_from_archive, load_from_directory, load_from_urls,
};

/// Errors that end a viewer run
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Failed to write {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Main application
pub struct TrajectoryViewerApp {
    settings: Settings,
    pub state: AppState,
}

impl TrajectoryViewerApp {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            state: AppState::new(),
        }
    }

    /// Load the configured source, then report, list and export.
    pub async fn run(&mut self) -> Result<(), AppError> {
        let result = load_source(&self.settings.source).await;
        if !self.state.apply_load(result)? {
            return Ok(());
        }

        if let Some(index) = self.settings.selected {
            self.state.select(index);
        }
        if let Some(camera) = self.state.selected_camera() {
            tracing::info!(
                "Selected camera {} at ({:.6}, {:.6})",
                camera.id,
                camera.lat(),
                camera.lon()
            );
        }

        if self.settings.list_images {
            self.list_images().await?;
        }

        if let Some(path) = self.settings.output.clone() {
            self.export(&path).await?;
        }

        self.state.clear();
        Ok(())
    }

    /// Print one `index, id, url` line per camera
    async fn list_images(&mut self) -> Result<(), AppError> {
        let listing = self.image_listing();
        write_stdout(&listing).await
    }

    /// Tab-separated `index, id, url` lines; `-` when an image is missing
    pub fn image_listing(&mut self) -> String {
        let mut out = String::new();
        for index in 0..self.state.trajectory.len() {
            let url = self.state.image_url(index);
            let id = &self.state.trajectory.cameras[index].id;
            out.push_str(&format!("{}\t{}\t{}\n", index, id, url.as_deref().unwrap_or("-")));
        }
        out
    }

    async fn export(&self, path: &Path) -> Result<(), AppError> {
        let text = serde_json::to_string_pretty(&self.state.export_json())?;

        if self.settings.output_is_stdout() {
            return write_stdout(&text).await;
        }

        tokio::fs::write(path, text)
            .await
            .map_err(|source| AppError::Export {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!("Exported GeoJSON to {}", path.display());
        Ok(())
    }
}

/// Run the loader matching `source`
pub async fn load_source(source: &Source) -> trajectory_lib::Result<LoadedData> {
    match source {
        Source::Dir { path } => load_from_directory(path).await,
        Source::Archive { path } => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|source| DataError::ReadFile {
                    path: path.clone(),
                    source,
                })?;
            load_from_archive(bytes).await
        }
        Source::Url {
            geometry,
            metadata,
            objects,
            images,
        } => {
            let remote = RemoteSource {
                geometry_url: geometry.clone(),
                metadata_url: metadata.clone(),
                objects_url: objects.clone(),
                image_base_path: images.clone(),
            };
            load_from_urls(&remote).await
        }
        Source::Pick => {
            let path = picker::pick_dataset_folder().await?;
            load_from_directory(path).await
        }
    }
}

async fn write_stdout(text: &str) -> Result<(), AppError> {
    let mut stdout = tokio::io::stdout();
    let write = async {
        stdout.write_all(text.as_bytes()).await?;
        if !text.ends_with('\n') {
            stdout.write_all(b"\n").await?;
        }
        stdout.flush().await
    };
    write.await.map_err(|source| AppError::Export {
        path: PathBuf::from("-"),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;

    fn dataset() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("trajectory.geojson"),
            r#"{"trajectories": [{"cameras": [
                {"id": "img1", "coordinates": [47.671, -122.274, 14.3], "rotation": [0, 0, 0, 1]},
                {"id": "img2", "coordinates": [47.672, -122.275, 15.1], "rotation": [0, 0, 0, 1]}
            ]}]}"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join("images")).unwrap();
        fs::write(dir.path().join("images").join("img2.jpg"), b"jpeg").unwrap();
        dir
    }

    fn settings(args: &[&str]) -> Settings {
        Settings::try_parse_from(std::iter::once("trajectory-viewer").chain(args.iter().copied()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_run_exports_geojson() {
        let dir = dataset();
        let output = dir.path().join("out.geojson");
        let mut app = TrajectoryViewerApp::new(settings(&[
            "--selected",
            "1",
            "--output",
            output.to_str().unwrap(),
            "dir",
            dir.path().to_str().unwrap(),
        ]));

        app.run().await.unwrap();
        assert!(!app.state.has_data());

        let exported: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(exported["type"], "FeatureCollection");
        assert_eq!(exported["features"].as_array().unwrap().len(), 3);
        assert_eq!(exported["features"][1]["properties"]["selected"], true);
        assert_eq!(exported["features"][2]["geometry"]["type"], "LineString");
        assert_eq!(exported["bbox"][0], -122.275);
    }

    #[tokio::test]
    async fn test_image_listing() {
        let dir = dataset();
        let mut app = TrajectoryViewerApp::new(settings(&[
            "--list-images",
            "dir",
            dir.path().to_str().unwrap(),
        ]));
        let result = load_source(&app.settings.source).await;
        assert!(app.state.apply_load(result).unwrap());

        let listing = app.image_listing();
        let lines: Vec<Vec<&str>> = listing
            .lines()
            .map(|line| line.split('\t').collect())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], vec!["0", "img1", "-"]);
        assert_eq!(lines[1][..2], ["1", "img2"]);
        assert!(lines[1][2].starts_with("file://"));
        assert!(lines[1][2].ends_with("images/img2.jpg"));

        app.run().await.unwrap();
        assert!(!app.state.has_data());
    }

    #[tokio::test]
    async fn test_run_with_relative_directory() {
        let dir = tempfile::tempdir_in(".").unwrap();
        fs::write(
            dir.path().join("trajectory.geojson"),
            r#"{"trajectories": [{"cameras": [
                {"id": "img1", "coordinates": [47.671, -122.274, 14.3]}
            ]}]}"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join("images")).unwrap();
        fs::write(dir.path().join("images").join("img1.jpg"), b"jpeg").unwrap();

        let relative = PathBuf::from(".").join(dir.path().file_name().unwrap());
        let source = Source::Dir { path: relative };

        let mut state = AppState::new();
        assert!(state.apply_load(load_source(&source).await).unwrap());
        assert!(state.image_url(0).unwrap().starts_with("file:///"));
    }

    #[tokio::test]
    async fn test_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = TrajectoryViewerApp::new(settings(&[
            "archive",
            dir.path().join("missing.zip").to_str().unwrap(),
        ]));

        let err = app.run().await.unwrap_err();
        assert!(matches!(err, AppError::Data(DataError::ReadFile { .. })));
        assert_eq!(app.state.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_load_source_resolves_images() {
        let dir = dataset();
        let source = Source::Dir {
            path: dir.path().to_path_buf(),
        };

        let mut state = AppState::new();
        assert!(state.apply_load(load_source(&source).await).unwrap());
        assert!(state.image_url(0).is_none());
        assert!(state.image_url(1).unwrap().ends_with("img2.jpg"));
    }
}
