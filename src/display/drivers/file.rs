/*
 *  display/drivers/file.rs
 *
 *  omni-epd - one loader, many panels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Netpbm file output driver - every frame lands in a .pbm/.pgm file
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
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use chrono::Local;
use embedded_graphics::pixelcolor::{Gray8, GrayColor};
use log::info;

use crate::config::{EpdConfig, EPD_CONFIG};
use crate::display::drivers::mock::{MockDisplay, MockDisplayState};
use crate::display::error::DisplayError;
use crate::display::framebuffer::{Frame, FrameBuffer, MODE_BW, MODE_GRAY16, MODE_GRAY4};
use crate::display::traits::{DisplayDriver, DriverClass};

const PBM_MODES: &[&str] = &[MODE_BW];
const PGM_MODES: &[&str] = &[MODE_BW, MODE_GRAY4, MODE_GRAY16];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NetpbmFormat {
    /// P1, 1 = ink
    Pbm,
    /// P2, 0 = black
    Pgm,
}

/// Writes every frame as a plain Netpbm image
///
/// Registered beneath [`MockDisplay`] and built on top of it: the mock keeps
/// the bookkeeping, this driver adds the file output. `omni_epd.pbm` writes
/// bitmaps, `omni_epd.pgm` writes graymaps. The target path comes from
/// `[EPD] file` and defaults to `omni-epd.pbm` / `omni-epd.pgm`.
#[derive(Debug)]
pub struct FileDisplay {
    inner: MockDisplay,
    format: NetpbmFormat,
    path: PathBuf,
}

impl FileDisplay {
    /// Where frames are written
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> Rc<RefCell<MockDisplayState>> {
        self.inner.state()
    }

    fn write_netpbm(&self, buffer: &FrameBuffer) -> Result<(), DisplayError> {
        let (width, height) = buffer.dimensions();
        let mut out = BufWriter::new(File::create(&self.path)?);

        match self.format {
            NetpbmFormat::Pbm => writeln!(out, "P1")?,
            NetpbmFormat::Pgm => writeln!(out, "P2")?,
        }
        writeln!(out, "# {} {}", self.full_name(), Local::now().format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(out, "{} {}", width, height)?;

        let levels = buffer.levels();
        let max = buffer.max_level();
        if self.format == NetpbmFormat::Pgm {
            writeln!(out, "{}", max)?;
        }

        for row in levels.chunks(width.max(1) as usize) {
            let line: Vec<String> = row
                .iter()
                .map(|&v| match (self.format, buffer) {
                    // graymaps count up from black, mono levels count ink
                    (NetpbmFormat::Pgm, FrameBuffer::Mono(_)) => (1 - v).to_string(),
                    _ => v.to_string(),
                })
                .collect();
            writeln!(out, "{}", line.join(" "))?;
        }

        out.flush()?;
        info!("{}: wrote {}", self.full_name(), self.path.display());
        Ok(())
    }
}

impl DisplayDriver for FileDisplay {
    fn package(&self) -> &str {
        Self::PACKAGE
    }

    fn device_name(&self) -> &str {
        self.inner.device_name()
    }

    fn config(&self) -> &EpdConfig {
        self.inner.config()
    }

    fn mode(&self) -> &str {
        self.inner.mode()
    }

    fn modes_available(&self) -> &[&'static str] {
        self.inner.modes_available()
    }

    fn width(&self) -> u32 {
        self.inner.width()
    }

    fn height(&self) -> u32 {
        self.inner.height()
    }

    fn prepare(&mut self) -> Result<(), DisplayError> {
        self.inner.prepare()
    }

    fn write_frame(&mut self, buffer: &FrameBuffer) -> Result<(), DisplayError> {
        self.inner.write_frame(buffer)?;
        self.write_netpbm(buffer)
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.inner.clear()?;
        let white = Frame::new(self.width(), self.height(), Gray8::WHITE);
        self.write_netpbm(&FrameBuffer::from_frame(&white, MODE_BW, &[])?)
    }

    fn sleep(&mut self) -> Result<(), DisplayError> {
        self.inner.sleep()
    }

    fn close(&mut self) -> Result<(), DisplayError> {
        self.inner.close()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl DriverClass for FileDisplay {
    const PACKAGE: &'static str = "omni_epd";
    const CLASS: &'static str = "FileDisplay";

    fn supported_devices() -> Vec<String> {
        ["pbm", "pgm"].iter().map(|d| format!("{}.{}", Self::PACKAGE, d)).collect()
    }

    fn defaults() -> EpdConfig {
        MockDisplay::defaults()
    }

    fn create(device_name: &str, config: EpdConfig) -> Result<Self, DisplayError> {
        let (format, modes) = match device_name {
            "pbm" => (NetpbmFormat::Pbm, PBM_MODES),
            "pgm" => (NetpbmFormat::Pgm, PGM_MODES),
            other => {
                return Err(DisplayError::InitializationFailed(format!(
                    "no Netpbm format for device '{}'",
                    other
                )));
            }
        };

        let path = config
            .get(EPD_CONFIG, "file")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(format!("omni-epd.{}", device_name)));

        Ok(Self {
            inner: MockDisplay::with_modes(device_name, config, modes)?,
            format,
            path,
        })
    }
}
