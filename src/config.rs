use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::source::{FileSource, InlineSource, ScriptSource, DEFAULT_SCRIPT};

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScriptHostConfig {
    /// Script file to load. The embedded demo script is used when unset.
    #[serde(default)]
    pub script_file_name: Option<String>,
    #[serde(default = "ScriptHostConfig::default_update_function")]
    pub update_function: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DemoConfig {
    #[serde(default)]
    pub host: ScriptHostConfig,
    #[serde(default = "DemoConfig::default_frames")]
    pub frames: u32,
    #[serde(default = "DemoConfig::default_frame_rate")]
    pub frame_rate: f32,
    #[serde(default)]
    pub initial_rotation: [f32; 3],
    #[serde(default = "DemoConfig::default_object_name")]
    pub object_name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemoOverrides {
    pub script: Option<String>,
    pub update_function: Option<String>,
    pub frames: Option<u32>,
    pub frame_rate: Option<f32>,
}

impl ScriptHostConfig {
    fn default_update_function() -> String {
        "updateFunction".to_string()
    }

    pub fn source(&self) -> Box<dyn ScriptSource> {
        match &self.script_file_name {
            Some(path) => Box::new(FileSource::new(path)),
            None => Box::new(InlineSource::named("embedded", DEFAULT_SCRIPT)),
        }
    }
}

impl Default for ScriptHostConfig {
    fn default() -> Self {
        Self { script_file_name: None, update_function: Self::default_update_function() }
    }
}

impl DemoConfig {
    const fn default_frames() -> u32 {
        240
    }

    const fn default_frame_rate() -> f32 {
        60.0
    }

    fn default_object_name() -> String {
        "Cube".to_string()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!("Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &DemoOverrides) {
        if let Some(script) = &overrides.script {
            self.host.script_file_name = Some(script.clone());
        }
        if let Some(name) = &overrides.update_function {
            self.host.update_function = name.clone();
        }
        if let Some(frames) = overrides.frames {
            self.frames = frames;
        }
        if let Some(rate) = overrides.frame_rate {
            self.frame_rate = rate;
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            host: ScriptHostConfig::default(),
            frames: Self::default_frames(),
            frame_rate: Self::default_frame_rate(),
            initial_rotation: [0.0; 3],
            object_name: Self::default_object_name(),
        }
    }
}

impl DemoOverrides {
    pub fn is_empty(&self) -> bool {
        self.script.is_none() && self.update_function.is_none() && self.frames.is_none() && self.frame_rate.is_none()
    }
}
