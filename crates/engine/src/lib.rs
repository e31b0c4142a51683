use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod assets;
pub mod audio;
pub mod entity;
pub mod input;
pub mod mesh;
pub mod render;

pub use assets::{
    EffectId, GeometryId, TextureId, DRAGON_FRAMES, EXPLOSION_FRAMES, PLAYER_WALK_FRAMES,
    TORNADO_FRAMES,
};
pub use audio::{AudioSink, NullAudio, RecordingAudio, SoundId};
pub use entity::{EntityId, EntityIdAllocator};
pub use input::{ButtonState, Key, KeyInput};
pub use mesh::{Mesh, MeshError, MeshRegistry};
pub use render::{Color, DrawCall, RenderFrame, RenderRequest, TextDraw};

pub const ROOT_ENV_VAR: &str = "SIDESCROLL_ROOT";

/// Filesystem layout the game reads assets from. The directories are not
/// created here; missing audio or mesh overrides are tolerated downstream.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub textures_dir: PathBuf,
    pub audio_dir: PathBuf,
    pub meshes_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "{env_var} is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot {
        path: PathBuf,
        env_var: &'static str,
    },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/checkout\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let assets = root.join("assets");

    Ok(AppPaths {
        textures_dir: assets.join("textures"),
        audio_dir: assets.join("audio"),
        meshes_dir: assets.join("meshes"),
        root,
    })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot {
                    path: normalized,
                    env_var: ROOT_ENV_VAR,
                })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
