/*
 *  vframebuf.rs
 *
 *  omni-epd - one loader, many panels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Runtime-sized framebuffer used as the drawing canvas for frames
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

use core::convert::Infallible;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::PixelColor;
use embedded_graphics::prelude::*;

/// A runtime-sized framebuffer for embedded-graphics.
#[derive(Debug, Clone, PartialEq)]
pub struct VarFrameBuf<C: PixelColor> {
    buf: Vec<C>,
    w: usize,
    h: usize,
}

impl<C: PixelColor> VarFrameBuf<C> {
    pub fn new(width: u32, height: u32, fill: C) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self { buf: vec![fill; w * h], w, h }
    }

    /// Build a buffer pixel by pixel, `f(x, y)` in row-major order
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> C) -> Self {
        let mut buf = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                buf.push(f(x, y));
            }
        }
        Self { buf, w: width, h: height }
    }

    pub fn width(&self) -> usize { self.w }
    pub fn height(&self) -> usize { self.h }

    pub fn as_slice(&self) -> &[C] { &self.buf }

    pub fn as_mut_slice(&mut self) -> &mut [C] { &mut self.buf }

    pub fn get(&self, x: usize, y: usize) -> Option<C> {
        if x < self.w && y < self.h {
            Some(self.buf[y * self.w + x])
        } else {
            None
        }
    }

    pub fn clear_color(&mut self, color: C) {
        self.buf.fill(color);
    }

    /// Convert every pixel, keeping the geometry
    pub fn map<D: PixelColor>(&self, f: impl Fn(C) -> D) -> VarFrameBuf<D> {
        VarFrameBuf { buf: self.buf.iter().map(|&c| f(c)).collect(), w: self.w, h: self.h }
    }

    /// Rotate counter-clockwise by `quarter_turns` * 90 degrees
    pub fn rotated_ccw(&self, quarter_turns: u8) -> Self {
        let (w, h) = (self.w, self.h);
        match quarter_turns % 4 {
            1 => Self::from_fn(h, w, |u, v| self.buf[u * w + (w - 1 - v)]),
            2 => Self::from_fn(w, h, |u, v| self.buf[(h - 1 - v) * w + (w - 1 - u)]),
            3 => Self::from_fn(h, w, |u, v| self.buf[(h - 1 - u) * w + v]),
            _ => self.clone(),
        }
    }

    /// Mirror left/right and/or top/bottom
    pub fn flipped(&self, horizontal: bool, vertical: bool) -> Self {
        let (w, h) = (self.w, self.h);
        Self::from_fn(w, h, |x, y| {
            let sx = if horizontal { w - 1 - x } else { x };
            let sy = if vertical { h - 1 - y } else { y };
            self.buf[sy * w + sx]
        })
    }

    /// Map (x,y) to linear index; returns None if out of bounds
    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }
}

impl<C: PixelColor> OriginDimensions for VarFrameBuf<C> {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl<C: PixelColor> DrawTarget for VarFrameBuf<C> {
    type Color = C;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.clear_color(color);
        Ok(())
    }
}
