use std::process::ExitCode;

// The binary uses the library, not duplicate modules
use trajectory_viewer::{Settings, TrajectoryViewerApp, entrypoints};

fn main() -> ExitCode {
    entrypoints::setup_logging();
    let settings = Settings::from_cli();

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    rt.block_on(async {
        match TrajectoryViewerApp::new(settings).run().await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("{}", e);
                ExitCode::FAILURE
            }
        }
    })
}
