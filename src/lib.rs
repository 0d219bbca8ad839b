/*
 *  lib.rs
 *
 *  omni-epd - one loader, many panels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Driver loader and layered configuration for e-paper displays
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

//! # omni-epd
//!
//! One entry point for many e-paper displays. Drivers register against a
//! [`DriverRegistry`]; [`load_display_driver`] picks one by device identifier
//! (`package.device`) and hands it a configuration merged from, lowest to
//! highest precedence:
//!
//! 1. the driver's built-in defaults
//! 2. `omni-epd.ini` in the working directory
//! 3. `<device>.ini` in the working directory
//! 4. the override mapping passed by the caller
//!
//! ```no_run
//! use omni_epd::{load_display_driver, EpdConfig, IMAGE_DISPLAY};
//!
//! let overrides = EpdConfig::new().with(IMAGE_DISPLAY, "rotate", "90");
//! let mut epd = load_display_driver(Some("omni_epd.mock"), Some(&overrides))?;
//!
//! epd.prepare()?;
//! let frame = epd.new_frame();
//! epd.display(&frame)?;
//! epd.sleep()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod display;
pub mod vframebuf;

pub use config::{
    ConfigError, ConfigLayers, EpdConfig, LayerKind, CONFIG_FILE, EPD_CONFIG, IMAGE_DISPLAY,
    IMAGE_ENHANCEMENTS,
};
pub use display::{
    BoxedDriver, DisplayDriver, DisplayDriverFactory, DisplayError, DisplayFactoryError,
    DriverClass, DriverDescriptor, DriverRegistry, Frame, SupportedDisplays,
};

/// Load a built-in driver, reading config files from the working directory.
///
/// See [`DisplayDriverFactory::load_display_driver`].
pub fn load_display_driver(
    display_name: Option<&str>,
    overrides: Option<&EpdConfig>,
) -> Result<BoxedDriver, DisplayFactoryError> {
    DisplayDriverFactory::builtin().load_display_driver(display_name, overrides)
}

/// Devices supported by the built-in drivers.
///
/// Flat, sorted identifiers by default; one descriptor per driver class when
/// `as_structured` is set.
pub fn list_supported_displays(as_structured: bool) -> SupportedDisplays {
    DriverRegistry::builtin().list_supported_displays(as_structured)
}
