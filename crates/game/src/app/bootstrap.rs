use std::path::PathBuf;

use engine::{resolve_app_paths, MeshRegistry};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::config::{ConfigResult, RunConfig};

const CONFIG_FILE_NAME: &str = "run_config.json";
const CONFIG_ENV_VAR: &str = "SIDESCROLL_CONFIG";

pub(crate) struct AppWiring {
    pub(crate) config: RunConfig,
    pub(crate) meshes: MeshRegistry,
}

pub(crate) fn build_app() -> ConfigResult<AppWiring> {
    init_tracing();
    info!("=== Sidescroll Startup ===");

    // The simulation runs fine without an asset checkout; built-in meshes
    // cover every geometry and overrides only refine rock outlines.
    let mut meshes = MeshRegistry::builtin();
    let config_path = match resolve_app_paths() {
        Ok(paths) => {
            if let Err(error) = meshes.load_overrides(&paths.meshes_dir) {
                warn!(error = %error, "mesh_overrides_skipped");
            }
            paths.root.join(CONFIG_FILE_NAME)
        }
        Err(error) => {
            warn!(error = %error, "app_paths_unresolved_using_builtins");
            PathBuf::from(CONFIG_FILE_NAME)
        }
    };

    let config_path = std::env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or(config_path);
    let config = RunConfig::load_or_default(&config_path)?;
    info!(
        seed = config.seed,
        start_level = ?config.start_level,
        demo_frames = config.demo_frames,
        "config_loaded"
    );

    Ok(AppWiring { config, meshes })
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
