use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sceneconfig::SceneConfig;

use crate::cli::Cli;

pub fn parse_surface_size(spec: &str) -> Result<(u32, u32)> {
    let trimmed = spec.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| anyhow::anyhow!("expected WxH format, e.g. 1280x720"))?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid width in size specification"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid height in size specification"))?;

    if width == 0 || height == 0 {
        anyhow::bail!("window dimensions must be greater than zero");
    }

    Ok((width, height))
}

/// Reads `path`, or returns the built-in defaults when no file was given.
pub fn load_config(path: Option<&Path>) -> Result<SceneConfig> {
    let Some(path) = path else {
        return Ok(SceneConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    let config = SceneConfig::from_toml_str(&raw)
        .with_context(|| format!("failed to load config at {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded scene config");
    Ok(config)
}

/// Layers command-line flags over the file config and re-validates the result.
pub fn apply_overrides(config: &mut SceneConfig, cli: &Cli) -> Result<()> {
    if let Some(size) = cli.size.as_deref() {
        let (width, height) = parse_surface_size(size)?;
        config.window.width = width;
        config.window.height = height;
    }
    if let Some(fps) = cli.fps {
        config.render.fps = Some(fps);
    }
    if let Some(antialias) = cli.antialias {
        config.render.antialias = Some(antialias);
    }
    if let Some(color) = cli.color {
        config.colors.base = color;
    }
    config
        .validate()
        .context("command-line overrides produced an invalid config")?;
    Ok(())
}

pub fn resolve_config(cli: &Cli) -> Result<SceneConfig> {
    let mut config = load_config(cli.config.as_deref())?;
    apply_overrides(&mut config, cli)?;
    Ok(config)
}
