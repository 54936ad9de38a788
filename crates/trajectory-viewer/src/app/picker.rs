//! Native folder picker
//!
//! Uses `rfd`'s async dialog. Dismissing the dialog is reported as
//! [`DataError::Cancelled`] so callers can treat it as a no-op.

use std::path::PathBuf;
use trajectory_lib::{DataError, Result};

/// Ask the user for a dataset directory.
pub async fn pick_dataset_folder() -> Result<PathBuf> {
    let handle = rfd::AsyncFileDialog::new()
        .set_title("Open trajectory dataset")
        .pick_folder()
        .await;

    match handle {
        Some(handle) => {
            let path = handle.path().to_path_buf();
            tracing::debug!("Picked dataset folder {}", path.display());
            Ok(path)
        }
        None => Err(DataError::Cancelled),
    }
}
