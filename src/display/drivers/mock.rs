/*
 *  display/drivers/mock.rs
 *
 *  omni-epd - one loader, many panels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock display driver for testing without hardware
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
use std::rc::Rc;
use log::{debug, info};

use crate::config::{ConfigError, EpdConfig, EPD_CONFIG, IMAGE_DISPLAY};
use crate::display::error::DisplayError;
use crate::display::framebuffer::{FrameBuffer, MODE_BW, MODE_GRAY16, MODE_GRAY4, MODE_PALETTE};
use crate::display::traits::{DisplayDriver, DriverClass};

pub const MOCK_WIDTH: u32 = 800;
pub const MOCK_HEIGHT: u32 = 600;

/// Largest width or height accepted from `[EPD]`
pub const MAX_DIMENSION: u32 = 16384;

const MOCK_MODES: &[&str] = &[MODE_BW, MODE_GRAY4, MODE_GRAY16, MODE_PALETTE];

/// Mock display driver
///
/// Accepts every frame without touching hardware and records what happened,
/// which makes it the stand-in for real panels in tests and for trying out
/// configuration files.
#[derive(Debug)]
pub struct MockDisplay {
    device_name: String,
    config: EpdConfig,
    mode: String,
    modes: &'static [&'static str],
    width: u32,
    height: u32,

    /// Shared state for testing
    state: Rc<RefCell<MockDisplayState>>,
}

/// Internal state for the mock driver (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockDisplayState {
    pub prepare_count: usize,
    pub display_count: usize,
    pub clear_count: usize,
    pub sleep_count: usize,
    pub close_count: usize,

    /// Awake and ready for frames
    pub is_prepared: bool,

    /// Last buffer handed to `write_frame`
    pub last_frame: Option<FrameBuffer>,

    /// Simulate failures (for error testing)
    pub simulate_display_failure: bool,
}

impl MockDisplay {
    /// Build a mock with an explicit mode set; `mode` comes from `[EPD] mode`.
    pub(crate) fn with_modes(
        device_name: &str,
        config: EpdConfig,
        modes: &'static [&'static str],
    ) -> Result<Self, DisplayError> {
        let mode = config.get(EPD_CONFIG, "mode").unwrap_or(MODE_BW).to_string();
        let width = dimension(&config, "width", MOCK_WIDTH)?;
        let height = dimension(&config, "height", MOCK_HEIGHT)?;

        debug!("{} display {}x{} in {} mode", device_name, width, height, mode);

        Ok(Self {
            device_name: device_name.to_string(),
            config,
            mode,
            modes,
            width,
            height,
            state: Rc::new(RefCell::new(MockDisplayState::default())),
        })
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Rc<RefCell<MockDisplayState>> {
        Rc::clone(&self.state)
    }
}

/// Positive integer `[EPD]` option with a fallback
fn dimension(config: &EpdConfig, key: &str, default: u32) -> Result<u32, ConfigError> {
    match config.get_int(EPD_CONFIG, key)? {
        None => Ok(default),
        Some(v) if v > 0 && v <= MAX_DIMENSION as i64 => Ok(v as u32),
        Some(_) => Err(ConfigError::InvalidValue {
            section: EPD_CONFIG.to_string(),
            key: key.to_string(),
            value: config.get(EPD_CONFIG, key).unwrap_or_default().to_string(),
            expected: "a pixel count between 1 and 16384",
        }),
    }
}

impl DisplayDriver for MockDisplay {
    fn package(&self) -> &str {
        Self::PACKAGE
    }

    fn device_name(&self) -> &str {
        &self.device_name
    }

    fn config(&self) -> &EpdConfig {
        &self.config
    }

    fn mode(&self) -> &str {
        &self.mode
    }

    fn modes_available(&self) -> &[&'static str] {
        self.modes
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn prepare(&mut self) -> Result<(), DisplayError> {
        let mut state = self.state.borrow_mut();
        state.prepare_count += 1;
        state.is_prepared = true;
        info!("{}: prepared", self.full_name());
        Ok(())
    }

    fn write_frame(&mut self, buffer: &FrameBuffer) -> Result<(), DisplayError> {
        let mut state = self.state.borrow_mut();
        if state.simulate_display_failure {
            return Err(DisplayError::Other("Simulated display failure".to_string()));
        }
        state.display_count += 1;
        state.last_frame = Some(buffer.clone());
        debug!("{}: frame {} of {} bytes", self.full_name(), state.display_count, buffer.to_packed_bytes().len());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let mut state = self.state.borrow_mut();
        state.clear_count += 1;
        state.last_frame = None;
        Ok(())
    }

    fn sleep(&mut self) -> Result<(), DisplayError> {
        let mut state = self.state.borrow_mut();
        state.sleep_count += 1;
        state.is_prepared = false;
        info!("{}: sleeping", self.full_name());
        Ok(())
    }

    fn close(&mut self) -> Result<(), DisplayError> {
        self.state.borrow_mut().close_count += 1;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl DriverClass for MockDisplay {
    const PACKAGE: &'static str = "omni_epd";
    const CLASS: &'static str = "MockDisplay";

    fn supported_devices() -> Vec<String> {
        vec![format!("{}.mock", Self::PACKAGE)]
    }

    fn defaults() -> EpdConfig {
        EpdConfig::new()
            .with(EPD_CONFIG, "mode", MODE_BW)
            .with(EPD_CONFIG, "palette_filter", "[[0, 0, 0], [255, 255, 255]]")
            .with(IMAGE_DISPLAY, "rotate", "0")
            .with(IMAGE_DISPLAY, "flip_horizontal", "false")
            .with(IMAGE_DISPLAY, "flip_vertical", "false")
    }

    fn create(device_name: &str, config: EpdConfig) -> Result<Self, DisplayError> {
        Self::with_modes(device_name, config, MOCK_MODES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::framebuffer::Frame;
    use embedded_graphics::pixelcolor::{Gray8, GrayColor};

    fn mock(config: EpdConfig) -> MockDisplay {
        MockDisplay::create("mock", MockDisplay::defaults().merged_with(&config)).unwrap()
    }

    #[test]
    fn test_mock_defaults() {
        let driver = mock(EpdConfig::new());
        assert_eq!(driver.full_name(), "omni_epd.mock");
        assert_eq!(driver.mode(), "bw");
        assert_eq!((driver.width(), driver.height()), (MOCK_WIDTH, MOCK_HEIGHT));
        assert!(driver.modes_available().contains(&"palette"));
    }

    #[test]
    fn test_mock_size_from_config() {
        let driver = mock(EpdConfig::new().with(EPD_CONFIG, "width", "16").with(EPD_CONFIG, "height", "8"));
        assert_eq!((driver.width(), driver.height()), (16, 8));

        let err = MockDisplay::create("mock", EpdConfig::new().with(EPD_CONFIG, "width", "0")).unwrap_err();
        assert!(matches!(err, DisplayError::Config(ConfigError::InvalidValue { .. })));

        let driver = mock(EpdConfig::new().with(EPD_CONFIG, "height", "16384"));
        assert_eq!(driver.height(), MAX_DIMENSION);

        let err = MockDisplay::create("mock", EpdConfig::new().with(EPD_CONFIG, "height", "16385")).unwrap_err();
        assert!(matches!(err, DisplayError::Config(ConfigError::InvalidValue { ref key, .. }) if key == "height"));
    }

    #[test]
    fn test_mock_lifecycle() {
        let mut driver = mock(EpdConfig::new().with(EPD_CONFIG, "width", "16").with(EPD_CONFIG, "height", "8"));
        let state = driver.state();

        driver.prepare().unwrap();
        assert!(state.borrow().is_prepared);

        let frame = driver.new_frame();
        driver.display(&frame).unwrap();
        assert_eq!(state.borrow().display_count, 1);
        assert!(matches!(state.borrow().last_frame, Some(FrameBuffer::Mono(_))));

        driver.clear().unwrap();
        driver.sleep().unwrap();
        driver.close().unwrap();

        let state = state.borrow();
        assert_eq!(state.clear_count, 1);
        assert_eq!(state.sleep_count, 1);
        assert_eq!(state.close_count, 1);
        assert!(!state.is_prepared);
        assert!(state.last_frame.is_none());
    }

    #[test]
    fn test_mock_display_applies_transform() {
        let mut driver = mock(
            EpdConfig::new()
                .with(EPD_CONFIG, "width", "4")
                .with(EPD_CONFIG, "height", "2")
                .with(IMAGE_DISPLAY, "rotate", "90"),
        );

        // rotated panels draw on a swapped canvas
        let mut frame = driver.new_frame();
        assert_eq!((frame.width(), frame.height()), (2, 4));
        frame.as_mut_slice()[0] = Gray8::BLACK;

        driver.display(&frame).unwrap();
        let state = driver.state();
        let state = state.borrow();
        let levels = state.last_frame.as_ref().unwrap().levels();
        // top-left of the canvas ends up bottom-left of the panel
        assert_eq!(levels, vec![0, 0, 0, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn test_mock_display_rejects_wrong_size() {
        let mut driver = mock(EpdConfig::new().with(EPD_CONFIG, "width", "4").with(EPD_CONFIG, "height", "2"));
        let frame = Frame::new(3, 3, Gray8::WHITE);

        assert!(matches!(
            driver.display(&frame),
            Err(DisplayError::FrameSizeMismatch { expected: (4, 2), actual: (3, 3) })
        ));
    }

    #[test]
    fn test_mock_palette_mode() {
        let mut driver = mock(
            EpdConfig::new()
                .with(EPD_CONFIG, "width", "2")
                .with(EPD_CONFIG, "height", "1")
                .with(EPD_CONFIG, "mode", "palette")
                .with(EPD_CONFIG, "palette_filter", "[[0, 0, 0], [255, 255, 255], [255, 0, 0]]"),
        );
        assert_eq!(driver.palette_filter().unwrap().len(), 3);

        let frame = Frame::from_fn(2, 1, |x, _| if x == 0 { Gray8::new(80) } else { Gray8::WHITE });
        driver.display(&frame).unwrap();

        let state = driver.state();
        assert_eq!(state.borrow().last_frame.as_ref().unwrap().levels(), vec![2, 1]);
    }

    #[test]
    fn test_mock_simulated_failure() {
        let mut driver = mock(EpdConfig::new().with(EPD_CONFIG, "width", "2").with(EPD_CONFIG, "height", "2"));
        driver.state().borrow_mut().simulate_display_failure = true;

        let frame = driver.new_frame();
        assert!(driver.display(&frame).is_err());

        driver.state().borrow_mut().simulate_display_failure = false;
        assert!(driver.display(&frame).is_ok());
    }
}
