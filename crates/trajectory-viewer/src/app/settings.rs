use crate::entrypoints::parse_args;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Trajectory Viewer - Load a photo trajectory dataset, browse its cameras and export map-ready GeoJSON
pub struct Settings {
    /// Index of the camera to mark as selected
    #[clap(short, long, value_name = "INDEX")]
    pub selected: Option<usize>,

    /// Write the exported GeoJSON to this file ("-" for stdout)
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the resolved image URL of every camera
    #[clap(long, default_value = "false")]
    pub list_images: bool,

    /// Where to load the dataset from
    #[clap(subcommand)]
    pub source: Source,
}

/// Dataset sources
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Source {
    /// A local dataset directory
    Dir {
        #[clap(value_name = "PATH")]
        path: PathBuf,
    },

    /// A ZIP archive of a dataset
    Archive {
        #[clap(value_name = "PATH")]
        path: PathBuf,
    },

    /// Remote files
    Url {
        /// Trajectory geometry URL
        #[clap(value_name = "GEOMETRY")]
        geometry: String,

        /// Shot metadata URL
        #[clap(long, value_name = "URL")]
        metadata: Option<String>,

        /// Object annotations URL
        #[clap(long, value_name = "URL")]
        objects: Option<String>,

        /// Base path the images are served under
        #[clap(long, value_name = "BASE")]
        images: Option<String>,
    },

    /// Choose a dataset directory with a folder dialog
    Pick,
}

impl Settings {
    /// Parse settings from the process arguments, exiting with usage on error
    pub fn from_cli() -> Self {
        match parse_args::<Settings>() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    /// Whether the export goes to stdout
    pub fn output_is_stdout(&self) -> bool {
        self.output.as_deref().is_some_and(|p| p.as_os_str() == "-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dir_source() {
        let settings =
            Settings::try_parse_from(["trajectory-viewer", "--selected", "3", "dir", "data/run1"])
                .unwrap();
        assert_eq!(settings.selected, Some(3));
        assert!(!settings.list_images);
        assert_eq!(
            settings.source,
            Source::Dir {
                path: PathBuf::from("data/run1")
            }
        );
    }

    #[test]
    fn test_parse_url_source() {
        let settings = Settings::try_parse_from([
            "trajectory-viewer",
            "-o",
            "-",
            "url",
            "https://example.com/trajectory.geojson",
            "--metadata",
            "https://example.com/trajectory.json",
            "--images",
            "https://example.com/images",
        ])
        .unwrap();

        assert!(settings.output_is_stdout());
        assert_eq!(
            settings.source,
            Source::Url {
                geometry: "https://example.com/trajectory.geojson".to_string(),
                metadata: Some("https://example.com/trajectory.json".to_string()),
                objects: None,
                images: Some("https://example.com/images".to_string()),
            }
        );
    }

    #[test]
    fn test_source_required() {
        assert!(Settings::try_parse_from(["trajectory-viewer"]).is_err());
        assert!(Settings::try_parse_from(["trajectory-viewer", "pick"]).is_ok());
    }

    #[test]
    fn test_output_file_is_not_stdout() {
        let settings =
            Settings::try_parse_from(["trajectory-viewer", "-o", "out.geojson", "pick"]).unwrap();
        assert!(!settings.output_is_stdout());
    }
}
