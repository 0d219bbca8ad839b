/*
 *  display/mod.rs
 *
 *  omni-epd - one loader, many panels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem - driver registry, factory and built-in drivers
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod framebuffer;
pub mod transform;
pub mod registry;
pub mod factory;

// Built-in drivers (conditionally compiled based on features)
pub mod drivers;

// Re-exports for convenience
pub use traits::{DisplayDriver, DriverClass, DISPLAY_DRIVER};
pub use error::{DisplayError, DisplayFactoryError};
pub use framebuffer::{Frame, FrameBuffer, MODE_BW, MODE_GRAY4, MODE_GRAY16, MODE_PALETTE};
pub use transform::DisplayTransform;
pub use registry::{DriverDescriptor, DriverRegistration, DriverRegistry, SupportedDisplays};
pub use factory::{BoxedDriver, DisplayDriverFactory, ResolvedConfig};

#[cfg(feature = "driver-mock")]
pub use drivers::mock::MockDisplay;

#[cfg(feature = "driver-file")]
pub use drivers::file::FileDisplay;
