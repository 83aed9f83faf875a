use abcview_camera::TurntableCamera;
use abcview_flatten::{BufferLimits, FlattenOptions, OverflowPolicy, QuadSplit};
use abcview_runtime::{Playback, STATIC_LOOP_END, ViewerSettings};
use abcview_scene::{Archive, SelectionPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "abcview.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveSection {
    pub path: PathBuf,
}

impl Default for ArchiveSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/example.ron"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSection {
    pub speed: f64,
    pub loop_start: f64,
    /// Falls back to the end of the archive's time range.
    pub loop_end: Option<f64>,
    pub selection: SelectionPolicy,
    pub quad_split: QuadSplit,
}

impl Default for PlaybackSection {
    fn default() -> Self {
        Self {
            speed: 1.1,
            loop_start: 0.0,
            loop_end: None,
            selection: SelectionPolicy::Near,
            quad_split: QuadSplit::Diagonal02,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BuffersSection {
    pub max_vertices: usize,
    pub max_indices: usize,
    pub overflow: OverflowPolicy,
}

impl Default for BuffersSection {
    fn default() -> Self {
        let limits = BufferLimits::default();
        Self {
            max_vertices: limits.max_vertices,
            max_indices: limits.max_indices,
            overflow: limits.overflow,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSection {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub wireframe: bool,
    pub clear_color: [f64; 3],
    pub line_color: [f32; 4],
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            title: "abcview".into(),
            width: 800,
            height: 600,
            wireframe: true,
            clear_color: [0.0, 0.2, 0.2],
            line_color: [1.0, 0.5, 0.2, 1.0],
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub archive: ArchiveSection,
    pub playback: PlaybackSection,
    pub buffers: BuffersSection,
    pub render: RenderSection,
    pub camera: TurntableCamera,
}

impl ViewerConfig {
    /// Reads `path`, or `abcview.toml` when no path is given. Only the
    /// implicit default file may be absent, in which case defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no {} found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        let config = toml::from_str(&text)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn limits(&self) -> BufferLimits {
        BufferLimits {
            max_vertices: self.buffers.max_vertices,
            max_indices: self.buffers.max_indices,
            overflow: self.buffers.overflow,
        }
    }

    pub fn flatten_options(&self) -> FlattenOptions {
        FlattenOptions {
            selection: self.playback.selection,
            quad_split: self.playback.quad_split,
        }
    }

    pub fn playback_for(&self, archive: &Archive) -> Playback {
        let loop_end = self
            .playback
            .loop_end
            .or_else(|| archive.time_range().map(|(_, end)| end))
            .unwrap_or(STATIC_LOOP_END);
        if loop_end <= self.playback.loop_start {
            log::warn!(
                "loop end {loop_end} is not after loop start {}, playback will hold",
                self.playback.loop_start
            );
        }
        Playback::new(self.playback.speed, self.playback.loop_start, loop_end)
    }

    pub fn viewer_settings(&self, archive: Arc<Archive>) -> ViewerSettings {
        ViewerSettings {
            flatten: self.flatten_options(),
            limits: self.limits(),
            playback: self.playback_for(&archive),
            camera: self.camera,
            wireframe: self.render.wireframe,
            clear_color: self.render.clear_color,
            line_color: self.render.line_color,
            archive,
        }
    }
}
