use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::sim::level::LevelKind;

pub(crate) type ConfigResult<T> = Result<T, String>;

/// Run parameters read from an optional JSON file. Every field has a
/// default so an empty object is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct RunConfig {
    pub(crate) seed: u64,
    pub(crate) start_level: LevelKind,
    pub(crate) display_fps: bool,
    pub(crate) demo_frames: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            seed: 0,
            start_level: LevelKind::Forest,
            display_fps: false,
            demo_frames: 600,
        }
    }
}

impl RunConfig {
    /// Missing file means defaults; a file that exists but does not parse
    /// is an error, not a silent fallback.
    pub(crate) fn load_or_default(path: &Path) -> ConfigResult<RunConfig> {
        if !path.is_file() {
            info!(path = %path.display(), "config_missing_using_defaults");
            return Ok(RunConfig::default());
        }
        let raw = fs::read_to_string(path)
            .map_err(|error| format!("read config '{}': {error}", path.display()))?;
        Self::parse_json(&raw)
    }

    fn parse_json(raw: &str) -> ConfigResult<RunConfig> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        match serde_path_to_error::deserialize::<_, RunConfig>(&mut deserializer) {
            Ok(config) => Ok(config),
            Err(error) => {
                let path = error.path().to_string();
                let source = error.into_inner();
                if path.is_empty() || path == "." {
                    Err(format!("parse config json: {source}"))
                } else {
                    Err(format!("parse config json at {path}: {source}"))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_parses_to_defaults() {
        let config = RunConfig::parse_json("{}").expect("parse");
        assert_eq!(config.seed, 0);
        assert_eq!(config.start_level, LevelKind::Forest);
        assert!(!config.display_fps);
    }

    #[test]
    fn fields_override_defaults() {
        let config = RunConfig::parse_json(
            r#"{"seed": 42, "start_level": "ice", "display_fps": true, "demo_frames": 120}"#,
        )
        .expect("parse");
        assert_eq!(config.seed, 42);
        assert_eq!(config.start_level, LevelKind::Ice);
        assert!(config.display_fps);
        assert_eq!(config.demo_frames, 120);
    }

    #[test]
    fn parse_errors_name_the_offending_field() {
        let error = RunConfig::parse_json(r#"{"start_level": "volcano"}"#).unwrap_err();
        assert!(error.contains("start_level"), "{error}");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config =
            RunConfig::load_or_default(Path::new("definitely_not_a_config.json")).expect("load");
        assert_eq!(config.demo_frames, RunConfig::default().demo_frames);
    }

    #[test]
    fn file_on_disk_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run_config.json");
        let mut file = fs::File::create(&path).expect("create");
        write!(file, r#"{{"seed": 7, "start_level": "desert"}}"#).expect("write");

        let config = RunConfig::load_or_default(&path).expect("load");
        assert_eq!(config.seed, 7);
        assert_eq!(config.start_level, LevelKind::Desert);
    }
}
