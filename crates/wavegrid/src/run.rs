use std::io::{self, Write};

use anyhow::{Context, Result};
use renderer::Renderer;
use tracing_subscriber::EnvFilter;

use crate::bindings::renderer_config;
use crate::bootstrap::resolve_config;
use crate::cli::Cli;

pub fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;

    if cli.print_config {
        let rendered = config.to_toml_string()?;
        io::stdout()
            .write_all(rendered.as_bytes())
            .context("failed to write config to stdout")?;
        return Ok(());
    }

    let renderer_config = renderer_config(&config);
    tracing::info!(
        grid = %format!("{}x{}", config.grid.amount_x, config.grid.amount_y),
        window = %format!("{}x{}", config.window.width, config.window.height),
        fps = ?renderer_config.target_fps,
        antialias = ?renderer_config.antialiasing,
        color = %config.colors.base,
        "starting wavegrid"
    );
    Renderer::new(renderer_config).run()
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
