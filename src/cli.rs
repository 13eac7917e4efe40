use crate::config::DemoOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;

pub const DEFAULT_CONFIG_PATH: &str = "config/script_host.json";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliOverrides {
    config: Option<String>,
    script: Option<String>,
    update_function: Option<String>,
    frames: Option<u32>,
    fps: Option<f32>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if !flag.starts_with("--") {
                bail!("Unexpected argument '{flag}'. Use --config/--script/--update/--frames/--fps with values.");
            }
            let key = &flag[2..];
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "config" => overrides.config = Some(value),
                "script" => overrides.script = Some(value),
                "update" => overrides.update_function = Some(value),
                "frames" => {
                    overrides.frames =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid frame count '{value}'"))?);
                }
                "fps" => {
                    let fps = value.parse::<f32>().with_context(|| format!("Invalid fps '{value}'"))?;
                    if !(fps.is_finite() && fps > 0.0) {
                        bail!("Invalid fps '{value}'. Use a positive frame rate.");
                    }
                    overrides.fps = Some(fps);
                }
                _ => bail!("Unknown flag '{flag}'. Supported flags: --config, --script, --update, --frames, --fps."),
            }
        }
        Ok(overrides)
    }

    pub fn config_path(&self) -> &str {
        self.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH)
    }

    pub fn into_demo_overrides(self) -> DemoOverrides {
        DemoOverrides {
            script: self.script,
            update_function: self.update_function,
            frames: self.frames,
            frame_rate: self.fps,
        }
    }
}
