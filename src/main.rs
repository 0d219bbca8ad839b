/*
 *  main.rs
 *
 *  omni-epd - one loader, many panels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Command line front end: list drivers, dump merged config, draw a test card
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::Gray8,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Rectangle},
    text::Text,
};
use env_logger::Env;
use log::{debug, info};

use omni_epd::{DisplayDriverFactory, EpdConfig, Frame, LayerKind, SupportedDisplays};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), version, about = env!("CARGO_PKG_DESCRIPTION"))]
struct Cli {
    /// Log filter, e.g. `debug` or `omni_epd=trace` (default: info, or RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Directory holding omni-epd.ini and <device>.ini (default: working directory)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List supported device identifiers
    List {
        /// One JSON record per driver class instead of a flat list
        #[arg(long)]
        structured: bool,
    },
    /// Print the merged configuration for a device as YAML
    Config {
        /// Device identifier, e.g. omni_epd.mock (default: [EPD] type)
        device: Option<String>,

        /// Override an option, e.g. --set Display.rotate=90
        #[arg(long = "set", value_name = "SECTION.KEY=VALUE", value_parser = parse_override)]
        overrides: Vec<(String, String, String)>,
    },
    /// Load a device and draw a test card on it
    Test {
        /// Device identifier, e.g. omni_epd.pbm (default: [EPD] type)
        device: Option<String>,

        /// Override an option, e.g. --set EPD.mode=gray4
        #[arg(long = "set", value_name = "SECTION.KEY=VALUE", value_parser = parse_override)]
        overrides: Vec<(String, String, String)>,
    },
}

/// `SECTION.KEY=VALUE`; the section may itself contain dots or spaces
fn parse_override(arg: &str) -> Result<(String, String, String), String> {
    let (path, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected SECTION.KEY=VALUE, got '{}'", arg))?;
    let (section, key) = path
        .rsplit_once('.')
        .filter(|(s, k)| !s.is_empty() && !k.is_empty())
        .ok_or_else(|| format!("expected SECTION.KEY before '=', got '{}'", path))?;
    Ok((section.trim().to_string(), key.trim().to_string(), value.trim().to_string()))
}

fn overrides_config(overrides: &[(String, String, String)]) -> Option<EpdConfig> {
    if overrides.is_empty() {
        return None;
    }
    Some(
        overrides
            .iter()
            .fold(EpdConfig::new(), |cfg, (section, key, value)| cfg.with(section, key, value.as_str())),
    )
}

fn list(factory: &DisplayDriverFactory, structured: bool) -> Result<()> {
    match factory.registry().list_supported_displays(structured) {
        SupportedDisplays::Devices(ids) => {
            for id in ids {
                println!("{}", id);
            }
        }
        classes @ SupportedDisplays::Classes(_) => {
            println!("{}", serde_json::to_string_pretty(&classes)?);
        }
    }
    Ok(())
}

fn dump_config(factory: &DisplayDriverFactory, device: Option<&str>, overrides: Option<&EpdConfig>) -> Result<()> {
    let resolved = factory.load_config(device, overrides)?;
    let mut layers = resolved.layers;

    // driver defaults only exist once the device is known
    if let Some(name) = resolved.device_name.as_deref() {
        let registration = factory
            .registry()
            .implementations()
            .into_iter()
            .find(|r| r.supported_devices().iter().any(|d| d == name));
        if let Some(registration) = registration {
            layers = layers.with_layer(LayerKind::Defaults, registration.class, registration.defaults());
        }
    }

    for layer in layers.layers() {
        debug!("{:?} layer from {}", layer.kind, layer.origin);
    }
    info!(
        "Configuration for {}",
        resolved.device_name.as_deref().unwrap_or("<no device>")
    );
    print!("{}", serde_yaml::to_string(&layers.merged())?);
    Ok(())
}

fn draw_test_card(frame: &mut Frame, label: &str) -> Result<()> {
    let size = frame.size();
    let (w, h) = (size.width as i32, size.height as i32);
    let stroke = PrimitiveStyle::with_stroke(Gray8::BLACK, 2);

    Rectangle::new(Point::zero(), size).into_styled(stroke).draw(frame)?;
    Line::new(Point::zero(), Point::new(w - 1, h - 1)).into_styled(stroke).draw(frame)?;
    Line::new(Point::new(0, h - 1), Point::new(w - 1, 0)).into_styled(stroke).draw(frame)?;

    let diameter = (size.width.min(size.height) / 2).max(1);
    Circle::with_center(Point::new(w / 2, h / 2), diameter)
        .into_styled(PrimitiveStyle::with_fill(Gray8::new(0x80)))
        .draw(frame)?;

    // gray ramp along the bottom edge
    let steps = 16;
    let step_w = (size.width / steps).max(1);
    for i in 0..steps {
        let level = (i * 255 / (steps - 1)) as u8;
        Rectangle::new(Point::new((i * step_w) as i32, h - 24), Size::new(step_w, 20))
            .into_styled(PrimitiveStyle::with_fill(Gray8::new(level)))
            .draw(frame)?;
    }

    Text::new(label, Point::new(8, 16), MonoTextStyle::new(&FONT_6X10, Gray8::BLACK)).draw(frame)?;
    Ok(())
}

fn test_display(factory: &DisplayDriverFactory, device: Option<&str>, overrides: Option<&EpdConfig>) -> Result<()> {
    let mut epd = factory
        .load_display_driver(device, overrides)
        .context("could not load display driver")?;

    info!(
        "{} {}x{} mode {} (available: {})",
        epd.full_name(),
        epd.width(),
        epd.height(),
        epd.mode(),
        epd.modes_available().join(", ")
    );

    epd.prepare()?;
    let mut frame = epd.new_frame();
    let label = format!("{} {}", epd.full_name(), epd.mode());
    draw_test_card(&mut frame, &label)?;
    epd.display(&frame)?;
    epd.sleep()?;
    epd.close()?;

    info!("Test card sent to {}", epd.full_name());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    if let Some(level) = &cli.log_level {
        logger.parse_filters(level);
    }
    logger.format_timestamp_secs().init();

    debug!("{} v.{} built {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let mut factory = DisplayDriverFactory::builtin();
    if let Some(dir) = cli.config_dir {
        factory = factory.with_config_dir(dir);
    }

    match cli.command {
        Command::List { structured } => list(&factory, structured),
        Command::Config { device, overrides } => {
            dump_config(&factory, device.as_deref(), overrides_config(&overrides).as_ref())
        }
        Command::Test { device, overrides } => {
            test_display(&factory, device.as_deref(), overrides_config(&overrides).as_ref())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("Display.rotate=90").unwrap(),
            ("Display".to_string(), "rotate".to_string(), "90".to_string())
        );
        assert_eq!(
            parse_override("Image Enhancements.contrast = 1.5").unwrap(),
            ("Image Enhancements".to_string(), "contrast".to_string(), "1.5".to_string())
        );
        assert!(parse_override("rotate=90").is_err());
        assert!(parse_override("Display.rotate").is_err());
    }

    #[test]
    fn test_overrides_config() {
        assert!(overrides_config(&[]).is_none());
        let cfg = overrides_config(&[("EPD".into(), "Mode".into(), "gray4".into())]).unwrap();
        assert_eq!(cfg.get("EPD", "mode"), Some("gray4"));
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["omni-epd", "--config-dir", "/tmp", "test", "omni_epd.pbm", "--set", "EPD.mode=bw"]).unwrap();
        assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp")));
        assert!(matches!(cli.command, Command::Test { device: Some(ref d), ref overrides } if d == "omni_epd.pbm" && overrides.len() == 1));
    }
}
