/*
 *  display/error.rs
 *
 *  omni-epd - one loader, many panels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Error types for drivers and the driver factory
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

use std::fmt;
use std::error::Error;
use crate::config::ConfigError;

/// Error type for driver operations
#[derive(Debug)]
pub enum DisplayError {
    /// Panel could not be brought up
    InitializationFailed(String),

    /// A driver option could not be read
    Config(ConfigError),

    /// The driver has no pixel format for this mode
    UnsupportedMode(String),

    /// Frame does not match the panel after the display transform
    FrameSizeMismatch { expected: (u32, u32), actual: (u32, u32) },

    /// Writing frame output failed
    Io(std::io::Error),

    /// Generic error with message
    Other(String),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::InitializationFailed(msg) =>
                write!(f, "Display initialization failed: {}", msg),
            DisplayError::Config(err) =>
                write!(f, "Invalid configuration: {}", err),
            DisplayError::UnsupportedMode(mode) =>
                write!(f, "Display mode '{}' is not supported by this driver", mode),
            DisplayError::FrameSizeMismatch { expected, actual } =>
                write!(f, "Frame size mismatch: expected {}x{}, got {}x{}",
                    expected.0, expected.1, actual.0, actual.1),
            DisplayError::Io(err) =>
                write!(f, "Frame output error: {}", err),
            DisplayError::Other(msg) =>
                write!(f, "{}", msg),
        }
    }
}

impl Error for DisplayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DisplayError::Config(err) => Some(err),
            DisplayError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for DisplayError {
    fn from(err: ConfigError) -> Self {
        DisplayError::Config(err)
    }
}

impl From<std::io::Error> for DisplayError {
    fn from(err: std::io::Error) -> Self {
        DisplayError::Io(err)
    }
}

/// Factory error types
#[derive(Debug)]
pub enum DisplayFactoryError {
    /// No driver, or more than one, claims the requested device
    DeviceNotFound(String),

    /// A resolved option has a value the driver cannot use
    Configuration { device: String, option: String, value: String },

    /// A config file exists but could not be read or parsed
    Config(ConfigError),

    /// The driver constructor failed
    DriverInitFailed { device: String, source: DisplayError },
}

impl DisplayFactoryError {
    /// Turn an invalid option value into a configuration error for `device`.
    pub fn from_config_error(device: &str, err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidValue { key, value, .. } => DisplayFactoryError::Configuration {
                device: device.to_string(),
                option: key,
                value,
            },
            other => DisplayFactoryError::Config(other),
        }
    }
}

impl fmt::Display for DisplayFactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayFactoryError::DeviceNotFound(name) if name.is_empty() =>
                write!(f, "No display device given and none configured"),
            DisplayFactoryError::DeviceNotFound(name) =>
                write!(f, "Couldn't find a unique display driver for '{}'", name),
            DisplayFactoryError::Configuration { device, option, value } =>
                write!(f, "Option '{}' has invalid value '{}' for device {}", option, value, device),
            DisplayFactoryError::Config(err) =>
                write!(f, "Configuration error: {}", err),
            DisplayFactoryError::DriverInitFailed { device, source } =>
                write!(f, "Driver initialization failed for {}: {}", device, source),
        }
    }
}

impl Error for DisplayFactoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DisplayFactoryError::Config(err) => Some(err),
            DisplayFactoryError::DriverInitFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for DisplayFactoryError {
    fn from(err: ConfigError) -> Self {
        DisplayFactoryError::Config(err)
    }
}
