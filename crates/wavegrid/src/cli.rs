use std::path::PathBuf;

use clap::Parser;
use sceneconfig::{AntialiasSetting, HexColor};

#[derive(Parser, Debug)]
#[command(
    name = "wavegrid",
    author,
    version,
    about = "Animated wireframe wave background",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Scene configuration TOML file; missing fields fall back to built-in defaults.
    #[arg(long, value_name = "FILE", env = "WAVEGRID_CONFIG")]
    pub config: Option<PathBuf>,

    /// Initial window size in logical pixels (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Optional FPS cap (0=uncapped).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f64>,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(long, value_name = "MODE", value_parser = parse_antialias)]
    pub antialias: Option<AntialiasSetting>,

    /// Base wireframe color as `#rrggbb` or `0xrrggbb`.
    #[arg(long, value_name = "COLOR", value_parser = parse_color)]
    pub color: Option<HexColor>,

    /// Print the resolved configuration as TOML and exit without opening a window.
    #[arg(long)]
    pub print_config: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_antialias(value: &str) -> Result<AntialiasSetting, String> {
    if value.trim().is_empty() {
        return Err("anti-alias mode must not be empty".to_string());
    }
    value.parse::<AntialiasSetting>().map_err(|_| {
        format!("invalid anti-alias mode '{value}'; use auto/off or 2/4/8/16")
    })
}

pub fn parse_color(value: &str) -> Result<HexColor, String> {
    value.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_antialias_modes() {
        assert_eq!(parse_antialias("auto"), Ok(AntialiasSetting::Auto));
        assert_eq!(parse_antialias("OFF"), Ok(AntialiasSetting::Off));
        assert_eq!(parse_antialias("0"), Ok(AntialiasSetting::Off));
        assert_eq!(parse_antialias("8"), Ok(AntialiasSetting::Samples8));
        assert!(parse_antialias("3").is_err());
        assert!(parse_antialias("  ").is_err());
    }

    #[test]
    fn parses_full_command_line() {
        let cli = Cli::try_parse_from([
            "wavegrid",
            "--size",
            "800x600",
            "--fps",
            "30",
            "--antialias",
            "4",
            "--color",
            "#00ff88",
            "--print-config",
        ])
        .expect("valid arguments");
        assert_eq!(cli.size.as_deref(), Some("800x600"));
        assert_eq!(cli.fps, Some(30.0));
        assert_eq!(cli.antialias, Some(AntialiasSetting::Samples4));
        assert_eq!(cli.color, Some(HexColor(0x00ff88)));
        assert!(cli.print_config);
    }

    #[test]
    fn rejects_malformed_color() {
        let err = Cli::try_parse_from(["wavegrid", "--color", "violet"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
