/*
 *  display/traits.rs
 *
 *  omni-epd - one loader, many panels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for display driver abstraction
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

use std::any::Any;
use std::fmt::Debug;
use embedded_graphics::pixelcolor::{Gray8, GrayColor};
use log::debug;

use crate::config::{ConfigError, EpdConfig, EPD_CONFIG};
use crate::display::error::DisplayError;
use crate::display::framebuffer::{Frame, FrameBuffer, MODE_PALETTE};
use crate::display::transform::DisplayTransform;

/// Name of the root capability every driver class is registered beneath
pub const DISPLAY_DRIVER: &str = "DisplayDriver";

/// Instance side of a display driver.
///
/// A driver holds the fully merged configuration it was built with, the
/// display mode it settled on and the modes it can handle. The factory
/// checks `mode()` against `modes_available()` once the driver exists.
pub trait DisplayDriver: Debug {
    /// Package part of the device identifier, e.g. `omni_epd`
    fn package(&self) -> &str;

    /// Short device name the driver was created with, e.g. `mock`
    fn device_name(&self) -> &str;

    /// Merged configuration for this instance
    fn config(&self) -> &EpdConfig;

    /// Declared display mode (`bw`, `gray4`, `palette`, ...)
    fn mode(&self) -> &str;

    fn modes_available(&self) -> &[&'static str];

    /// Panel width in pixels
    fn width(&self) -> u32;

    /// Panel height in pixels
    fn height(&self) -> u32;

    /// Wake the panel and get it ready for frames
    fn prepare(&mut self) -> Result<(), DisplayError>;

    /// Push a mode-converted buffer to the panel
    ///
    /// Called by [`DisplayDriver::display`] after the transform and size
    /// checks; the buffer always matches `width()` x `height()`.
    fn write_frame(&mut self, buffer: &FrameBuffer) -> Result<(), DisplayError>;

    /// Blank the panel
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Put the panel into low power mode
    fn sleep(&mut self) -> Result<(), DisplayError>;

    /// Release the hardware
    fn close(&mut self) -> Result<(), DisplayError>;

    /// Access to the concrete type, mostly for tests
    fn as_any(&self) -> &dyn Any;

    /// Full `package.device` identifier
    fn full_name(&self) -> String {
        format!("{}.{}", self.package(), self.device_name())
    }

    /// Option from the `[EPD]` section
    fn device_option(&self, key: &str) -> Option<&str> {
        self.config().get(EPD_CONFIG, key)
    }

    fn device_option_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.device_option(key).unwrap_or(default)
    }

    /// Rotation and mirroring from the `[Display]` section
    fn transform(&self) -> Result<DisplayTransform, ConfigError> {
        DisplayTransform::from_config(self.config())
    }

    /// `palette_filter` parsed as a JSON list of `[r, g, b]` colors
    fn palette_filter(&self) -> Result<Vec<[u8; 3]>, ConfigError> {
        let raw = self.device_option_or("palette_filter", "[]");
        serde_json::from_str(raw).map_err(|_| ConfigError::InvalidValue {
            section: EPD_CONFIG.to_string(),
            key: "palette_filter".to_string(),
            value: raw.to_string(),
            expected: "a JSON list of [r, g, b] colors",
        })
    }

    /// Blank canvas sized so that it fits the panel after the transform
    fn new_frame(&self) -> Frame {
        let (w, h) = self
            .transform()
            .unwrap_or_default()
            .canvas_size(self.width(), self.height());
        Frame::new(w, h, Gray8::WHITE)
    }

    /// Transform, size check, convert to the current mode, write.
    fn display(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        let frame = self.transform()?.apply(frame);

        let expected = (self.width(), self.height());
        let actual = (frame.width() as u32, frame.height() as u32);
        if expected != actual {
            return Err(DisplayError::FrameSizeMismatch { expected, actual });
        }

        let palette = if self.mode() == MODE_PALETTE {
            self.palette_filter()?
        } else {
            Vec::new()
        };

        let buffer = FrameBuffer::from_frame(&frame, self.mode(), &palette)?;
        debug!("{}: writing {}x{} frame in {} mode", self.full_name(), actual.0, actual.1, self.mode());
        self.write_frame(&buffer)
    }
}

/// Class side of a display driver: what a registry needs to list and build it.
pub trait DriverClass: DisplayDriver + Sized + 'static {
    /// Package the device identifiers are namespaced under
    const PACKAGE: &'static str;

    /// Class identifier, also used as a parent name for registrations
    const CLASS: &'static str;

    /// Device identifiers this class handles, in declaration order
    fn supported_devices() -> Vec<String>;

    /// Built-in defaults, the lowest configuration layer
    fn defaults() -> EpdConfig {
        EpdConfig::new()
    }

    /// Build an instance for `device_name` (the part after the package)
    fn create(device_name: &str, config: EpdConfig) -> Result<Self, DisplayError>;
}
