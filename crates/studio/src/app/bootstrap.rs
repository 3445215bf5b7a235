use std::path::PathBuf;
use std::sync::Arc;

use stage::{GameRuntime, StageConfig, ThreadedRuntime};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::console::LogConsole;
use super::demo::{DemoLoader, DEFAULT_PROGRAM};
use super::editor::FileEditor;

const SOURCE_PATH_ENV_VAR: &str = "STAGE_SOURCE";
const DEFAULT_SOURCE_PATH: &str = "program.json";

pub(crate) struct AppWiring {
    pub(crate) config: StageConfig,
    pub(crate) runtime: Box<dyn GameRuntime>,
    pub(crate) editor: FileEditor,
    pub(crate) console: LogConsole,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Studio Startup ===");

    let config = StageConfig {
        window_title: "Studio".to_string(),
        ..StageConfig::default()
    };

    let editor = FileEditor::new(source_path_from_env());
    match editor.seed_if_missing(DEFAULT_PROGRAM) {
        Ok(_) => info!(path = %editor.path().display(), "program_source"),
        Err(error) => warn!(error = %error, "program_source_seed_failed"),
    }

    let loader = Arc::new(DemoLoader::new(config.frame_width, config.frame_height));
    let runtime = ThreadedRuntime::new(loader, config.runtime_config());

    AppWiring {
        config,
        runtime: Box::new(runtime),
        editor,
        console: LogConsole::new(),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn source_path_from_env() -> PathBuf {
    std::env::var(SOURCE_PATH_ENV_VAR)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_PATH))
}
