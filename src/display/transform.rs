/*
 *  display/transform.rs
 *
 *  omni-epd - one loader, many panels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display transform options: rotation and mirroring
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

use crate::config::{ConfigError, EpdConfig, IMAGE_DISPLAY};
use crate::display::framebuffer::Frame;

/// Options from the `[Display]` section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayTransform {
    /// Counter-clockwise, one of 0, 90, 180, 270
    pub rotate: u16,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
}

impl DisplayTransform {
    pub fn from_config(config: &EpdConfig) -> Result<Self, ConfigError> {
        let rotate = match config.get_float(IMAGE_DISPLAY, "rotate")? {
            None => 0,
            Some(deg) if deg.is_finite() && deg.fract() == 0.0 && (deg as i64) % 90 == 0 => {
                (deg as i64).rem_euclid(360) as u16
            }
            Some(_) => {
                return Err(ConfigError::InvalidValue {
                    section: IMAGE_DISPLAY.to_string(),
                    key: "rotate".to_string(),
                    value: config.get(IMAGE_DISPLAY, "rotate").unwrap_or_default().to_string(),
                    expected: "a multiple of 90 degrees",
                });
            }
        };

        Ok(Self {
            rotate,
            flip_horizontal: config.get_bool(IMAGE_DISPLAY, "flip_horizontal")?.unwrap_or(false),
            flip_vertical: config.get_bool(IMAGE_DISPLAY, "flip_vertical")?.unwrap_or(false),
        })
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Canvas size to draw on so the result fits a `width` x `height` panel
    pub fn canvas_size(&self, width: u32, height: u32) -> (u32, u32) {
        match self.rotate {
            90 | 270 => (height, width),
            _ => (width, height),
        }
    }

    /// Rotate first, then mirror.
    pub fn apply(&self, frame: &Frame) -> Frame {
        if self.is_identity() {
            return frame.clone();
        }
        let rotated = frame.rotated_ccw((self.rotate / 90) as u8);
        if self.flip_horizontal || self.flip_vertical {
            rotated.flipped(self.flip_horizontal, self.flip_vertical)
        } else {
            rotated
        }
    }
}
