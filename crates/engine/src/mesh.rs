use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::assets::GeometryId;

/// Polygon outline in model space. World-space vertices are obtained by
/// multiplying each vertex component-wise with the owning entity's scale
/// and adding its position.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vec2>,
    pub original_size: Vec2,
}

impl Mesh {
    pub fn from_vertices(vertices: Vec<Vec2>) -> Mesh {
        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        for v in &vertices {
            min = min.min(*v);
            max = max.max(*v);
        }
        let original_size = if vertices.is_empty() {
            Vec2::ZERO
        } else {
            max - min
        };
        Mesh {
            vertices,
            original_size,
        }
    }
}

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("failed to read mesh directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read mesh file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse mesh file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("mesh file {path} has no vertices")]
    Empty { path: PathBuf },
    #[error("mesh file {path} does not name a known geometry")]
    UnknownGeometry { path: PathBuf },
}

#[derive(Debug, Deserialize)]
struct MeshFile {
    vertices: Vec<[f32; 2]>,
}

/// Lookup from geometry id to outline mesh. Ships with built-in shapes so
/// the simulation never depends on asset files being present; a meshes
/// directory may override any of them with JSON outlines.
#[derive(Debug)]
pub struct MeshRegistry {
    meshes: HashMap<GeometryId, Mesh>,
}

impl MeshRegistry {
    pub fn builtin() -> MeshRegistry {
        let mut meshes = HashMap::new();
        for id in GeometryId::ALL {
            meshes.insert(id, builtin_mesh(id));
        }
        MeshRegistry { meshes }
    }

    pub fn mesh(&self, id: GeometryId) -> &Mesh {
        // builtin() seeds every id and overrides only replace entries.
        &self.meshes[&id]
    }

    /// Replaces built-in outlines with any `<geometry>.json` files found in
    /// `dir`. Returns how many overrides were applied. A missing directory
    /// is not an error.
    pub fn load_overrides(&mut self, dir: &Path) -> Result<usize, MeshError> {
        if !dir.is_dir() {
            debug!(path = %dir.display(), "mesh_override_dir_missing");
            return Ok(0);
        }

        let entries = fs::read_dir(dir).map_err(|source| MeshError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut applied = 0usize;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let stem = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default();
            let id = GeometryId::from_file_stem(stem)
                .ok_or_else(|| MeshError::UnknownGeometry { path: path.clone() })?;

            let raw = fs::read_to_string(&path).map_err(|source| MeshError::ReadFile {
                path: path.clone(),
                source,
            })?;
            let parsed: MeshFile =
                serde_json::from_str(&raw).map_err(|source| MeshError::Parse {
                    path: path.clone(),
                    source,
                })?;
            if parsed.vertices.is_empty() {
                return Err(MeshError::Empty { path });
            }

            let vertices = parsed
                .vertices
                .into_iter()
                .map(|[x, y]| Vec2::new(x, y))
                .collect();
            self.meshes.insert(id, Mesh::from_vertices(vertices));
            applied += 1;
        }

        info!(count = applied, "mesh_overrides_loaded");
        Ok(applied)
    }
}

fn builtin_mesh(id: GeometryId) -> Mesh {
    let vertices = match id {
        GeometryId::Sprite | GeometryId::DebugLine => vec![
            Vec2::new(-0.5, -0.5),
            Vec2::new(0.5, -0.5),
            Vec2::new(0.5, 0.5),
            Vec2::new(-0.5, 0.5),
        ],
        GeometryId::ScreenTriangle => vec![
            Vec2::new(-1.0, -1.0),
            Vec2::new(3.0, -1.0),
            Vec2::new(-1.0, 3.0),
        ],
        GeometryId::Rock0 => vec![
            Vec2::new(-0.48, 0.10),
            Vec2::new(-0.22, 0.46),
            Vec2::new(0.18, 0.50),
            Vec2::new(0.47, 0.21),
            Vec2::new(0.50, -0.18),
            Vec2::new(0.12, -0.50),
            Vec2::new(-0.35, -0.41),
        ],
        GeometryId::Rock1 => vec![
            Vec2::new(-0.50, -0.05),
            Vec2::new(-0.30, 0.38),
            Vec2::new(0.05, 0.50),
            Vec2::new(0.42, 0.30),
            Vec2::new(0.50, -0.12),
            Vec2::new(0.20, -0.47),
            Vec2::new(-0.25, -0.50),
        ],
        GeometryId::Rock2 => vec![
            Vec2::new(-0.45, 0.28),
            Vec2::new(0.00, 0.50),
            Vec2::new(0.44, 0.33),
            Vec2::new(0.50, -0.20),
            Vec2::new(0.05, -0.50),
            Vec2::new(-0.50, -0.30),
        ],
        GeometryId::Rock3 => vec![
            Vec2::new(-0.40, 0.45),
            Vec2::new(0.25, 0.50),
            Vec2::new(0.50, 0.05),
            Vec2::new(0.35, -0.45),
            Vec2::new(-0.15, -0.50),
            Vec2::new(-0.50, -0.10),
        ],
        GeometryId::Rock4 => vec![
            Vec2::new(-0.50, 0.00),
            Vec2::new(-0.15, 0.48),
            Vec2::new(0.30, 0.42),
            Vec2::new(0.50, 0.02),
            Vec2::new(0.28, -0.44),
            Vec2::new(-0.20, -0.50),
        ],
    };
    Mesh::from_vertices(vertices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_registry_covers_every_geometry() {
        let registry = MeshRegistry::builtin();
        for id in GeometryId::ALL {
            assert!(!registry.mesh(id).vertices.is_empty());
        }
    }

    #[test]
    fn original_size_spans_vertex_bounds() {
        let mesh = Mesh::from_vertices(vec![
            Vec2::new(-1.0, -2.0),
            Vec2::new(3.0, 0.5),
            Vec2::new(0.0, 1.0),
        ]);
        assert_eq!(mesh.original_size, Vec2::new(4.0, 3.0));
    }

    #[test]
    fn json_override_replaces_builtin_rock() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rock_2.json");
        let mut file = fs::File::create(&path).expect("create");
        write!(file, r#"{{"vertices": [[-1.0, 0.0], [1.0, 0.0], [0.0, 2.0]]}}"#).expect("write");

        let mut registry = MeshRegistry::builtin();
        let applied = registry.load_overrides(dir.path()).expect("load");
        assert_eq!(applied, 1);
        assert_eq!(registry.mesh(GeometryId::Rock2).vertices.len(), 3);
        assert_eq!(
            registry.mesh(GeometryId::Rock2).original_size,
            Vec2::new(2.0, 2.0)
        );
    }

    #[test]
    fn missing_override_dir_is_tolerated() {
        let mut registry = MeshRegistry::builtin();
        let applied = registry
            .load_overrides(Path::new("definitely_not_a_mesh_dir"))
            .expect("load");
        assert_eq!(applied, 0);
    }

    #[test]
    fn unknown_geometry_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("boulder.json");
        fs::write(&path, r#"{"vertices": [[0.0, 0.0]]}"#).expect("write");

        let mut registry = MeshRegistry::builtin();
        let result = registry.load_overrides(dir.path());
        assert!(matches!(result, Err(MeshError::UnknownGeometry { .. })));
    }
}
