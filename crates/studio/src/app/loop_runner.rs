use std::process::ExitCode;

use stage::run_stage;
use tracing::error;

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    if let Err(err) = run_stage(
        app.config,
        app.runtime,
        Box::new(app.editor),
        Box::new(app.console),
    ) {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
