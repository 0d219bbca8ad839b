/*
 *  display/framebuffer.rs
 *
 *  omni-epd - one loader, many panels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mode-specific pixel buffers handed to drivers
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

use embedded_graphics::pixelcolor::{BinaryColor, Gray2, Gray4, Gray8, GrayColor};
use crate::display::error::DisplayError;
use crate::vframebuf::VarFrameBuf;

/// Drawing canvas for a whole frame, 8-bit grayscale
pub type Frame = VarFrameBuf<Gray8>;

pub const MODE_BW: &str = "bw";
pub const MODE_GRAY4: &str = "gray4";
pub const MODE_GRAY16: &str = "gray16";
pub const MODE_PALETTE: &str = "palette";

/// Palette indices are stored as bytes
pub const MAX_PALETTE_COLORS: usize = 256;

/// Enum dispatch over the pixel formats the display modes map to
///
/// `BinaryColor::On` is ink (dark), `Off` is paper.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameBuffer {
    /// 1-bit, mode `bw`
    Mono(VarFrameBuf<BinaryColor>),

    /// 4 gray levels, mode `gray4`
    Gray2(VarFrameBuf<Gray2>),

    /// 16 gray levels, mode `gray16`
    Gray4(VarFrameBuf<Gray4>),

    /// One palette index per pixel, mode `palette`
    Palette {
        width: usize,
        height: usize,
        indices: Vec<u8>,
        palette: Vec<[u8; 3]>,
    },
}

impl FrameBuffer {
    /// Quantize a frame for `mode`. `palette` is only consulted in palette mode.
    pub fn from_frame(frame: &Frame, mode: &str, palette: &[[u8; 3]]) -> Result<Self, DisplayError> {
        match mode {
            MODE_BW => Ok(FrameBuffer::Mono(frame.map(|c| {
                if c.luma() < 128 { BinaryColor::On } else { BinaryColor::Off }
            }))),
            MODE_GRAY4 => Ok(FrameBuffer::Gray2(frame.map(|c| Gray2::new(c.luma() >> 6)))),
            MODE_GRAY16 => Ok(FrameBuffer::Gray4(frame.map(|c| Gray4::new(c.luma() >> 4)))),
            MODE_PALETTE => {
                if palette.is_empty() {
                    return Err(DisplayError::UnsupportedMode(
                        "palette (no palette_filter colors)".to_string(),
                    ));
                }
                if palette.len() > MAX_PALETTE_COLORS {
                    return Err(DisplayError::UnsupportedMode(format!(
                        "palette ({} colors, at most {})",
                        palette.len(),
                        MAX_PALETTE_COLORS
                    )));
                }
                let lumas: Vec<i32> = palette.iter().map(|&rgb| rgb_luma(rgb)).collect();
                let indices = frame
                    .as_slice()
                    .iter()
                    .map(|c| nearest(&lumas, c.luma() as i32))
                    .collect();
                Ok(FrameBuffer::Palette {
                    width: frame.width(),
                    height: frame.height(),
                    indices,
                    palette: palette.to_vec(),
                })
            }
            other => Err(DisplayError::UnsupportedMode(other.to_string())),
        }
    }

    /// Get dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        let (w, h) = match self {
            FrameBuffer::Mono(fb) => (fb.width(), fb.height()),
            FrameBuffer::Gray2(fb) => (fb.width(), fb.height()),
            FrameBuffer::Gray4(fb) => (fb.width(), fb.height()),
            FrameBuffer::Palette { width, height, .. } => (*width, *height),
        };
        (w as u32, h as u32)
    }

    /// Highest level a pixel can take (1 for bw, 3 for gray4, ...)
    pub fn max_level(&self) -> u8 {
        match self {
            FrameBuffer::Mono(_) => 1,
            FrameBuffer::Gray2(_) => 3,
            FrameBuffer::Gray4(_) => 15,
            FrameBuffer::Palette { palette, .. } => palette.len().saturating_sub(1) as u8,
        }
    }

    /// Pixel values row by row. Mono yields 1 for ink, grays yield luma.
    pub fn levels(&self) -> Vec<u8> {
        match self {
            FrameBuffer::Mono(fb) => fb.as_slice().iter().map(|p| p.is_on() as u8).collect(),
            FrameBuffer::Gray2(fb) => fb.as_slice().iter().map(|p| p.luma()).collect(),
            FrameBuffer::Gray4(fb) => fb.as_slice().iter().map(|p| p.luma()).collect(),
            FrameBuffer::Palette { indices, .. } => indices.clone(),
        }
    }

    /// Convert framebuffer to a packed byte array
    ///
    /// - Mono: 8 pixels per byte (LSB first)
    /// - Gray2: 4 pixels per byte (high bits first)
    /// - Gray4: 2 pixels per byte (high nibble first)
    /// - Palette: one index per byte
    pub fn to_packed_bytes(&self) -> Vec<u8> {
        match self {
            FrameBuffer::Mono(fb) => fb
                .as_slice()
                .chunks(8)
                .map(|chunk| {
                    chunk.iter().enumerate().fold(0u8, |byte, (i, p)| {
                        if p.is_on() { byte | (1 << i) } else { byte }
                    })
                })
                .collect(),
            FrameBuffer::Gray2(fb) => fb
                .as_slice()
                .chunks(4)
                .map(|chunk| {
                    chunk.iter().enumerate().fold(0u8, |byte, (i, p)| {
                        byte | ((p.luma() & 0x03) << (6 - 2 * i))
                    })
                })
                .collect(),
            FrameBuffer::Gray4(fb) => fb
                .as_slice()
                .chunks(2)
                .map(|chunk| {
                    let hi = chunk.first().map_or(0, |p| p.luma() & 0x0F);
                    let lo = chunk.get(1).map_or(0, |p| p.luma() & 0x0F);
                    (hi << 4) | lo
                })
                .collect(),
            FrameBuffer::Palette { indices, .. } => indices.clone(),
        }
    }
}

fn rgb_luma([r, g, b]: [u8; 3]) -> i32 {
    (299 * r as i32 + 587 * g as i32 + 114 * b as i32) / 1000
}

fn nearest(lumas: &[i32], luma: i32) -> u8 {
    lumas
        .iter()
        .enumerate()
        .min_by_key(|&(_, l)| (l - luma).abs())
        .map_or(0, |(i, _)| i as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Frame {
        // 0, 64, 128, 255 across, two rows
        Frame::from_fn(4, 2, |x, _| Gray8::new([0, 64, 128, 255][x]))
    }

    #[test]
    fn test_bw_threshold() {
        let fb = FrameBuffer::from_frame(&ramp(), MODE_BW, &[]).unwrap();
        assert_eq!(fb.dimensions(), (4, 2));
        assert_eq!(fb.levels(), vec![1, 1, 0, 0, 1, 1, 0, 0]);
        // 8 pixels, LSB first
        assert_eq!(fb.to_packed_bytes(), vec![0b0011_0011]);
    }

    #[test]
    fn test_gray_levels() {
        let fb = FrameBuffer::from_frame(&ramp(), MODE_GRAY4, &[]).unwrap();
        assert_eq!(fb.max_level(), 3);
        assert_eq!(&fb.levels()[..4], &[0, 1, 2, 3]);
        assert_eq!(fb.to_packed_bytes()[0], 0b00_01_10_11);

        let fb = FrameBuffer::from_frame(&ramp(), MODE_GRAY16, &[]).unwrap();
        assert_eq!(&fb.levels()[..4], &[0, 4, 8, 15]);
        assert_eq!(&fb.to_packed_bytes()[..2], &[0x04, 0x8F]);
    }

    #[test]
    fn test_palette_nearest_by_luma() {
        let palette = [[0, 0, 0], [255, 255, 255], [255, 0, 0]];
        let fb = FrameBuffer::from_frame(&ramp(), MODE_PALETTE, &palette).unwrap();

        // red has luma 76
        assert_eq!(&fb.levels()[..4], &[0, 2, 2, 1]);
        assert_eq!(fb.max_level(), 2);
    }

    #[test]
    fn test_unknown_mode_and_empty_palette() {
        assert!(matches!(
            FrameBuffer::from_frame(&ramp(), "color", &[]),
            Err(DisplayError::UnsupportedMode(_))
        ));
        assert!(FrameBuffer::from_frame(&ramp(), MODE_PALETTE, &[]).is_err());
    }

    #[test]
    fn test_palette_size_limit() {
        let mut palette = vec![[0, 0, 0]; MAX_PALETTE_COLORS];
        palette[MAX_PALETTE_COLORS - 1] = [255, 255, 255];
        let fb = FrameBuffer::from_frame(&ramp(), MODE_PALETTE, &palette).unwrap();
        assert_eq!(fb.max_level(), 255);
        assert_eq!(fb.levels()[3], 255);

        palette.push([255, 0, 0]);
        assert!(matches!(
            FrameBuffer::from_frame(&ramp(), MODE_PALETTE, &palette),
            Err(DisplayError::UnsupportedMode(_))
        ));
    }
}
