/*
 *  display/factory.rs
 *
 *  omni-epd - one loader, many panels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Resolve a device name and layered config into a driver instance
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
use log::{debug, info};

use crate::config::{ConfigLayers, EpdConfig, LayerKind, CONFIG_FILE, EPD_CONFIG};
use crate::display::error::{DisplayError, DisplayFactoryError};
use crate::display::framebuffer::{MAX_PALETTE_COLORS, MODE_PALETTE};
use crate::display::registry::{DriverDescriptor, DriverRegistry};
use crate::display::traits::DisplayDriver;

/// Type alias for boxed display driver trait objects
pub type BoxedDriver = Box<dyn DisplayDriver>;

/// Configuration gathered for a load, before any driver exists
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Device that will be looked up in the registry
    pub device_name: Option<String>,
    /// Device whose `<name>.ini` was considered
    pub device_file: Option<String>,
    /// Global, device and override layers (no driver defaults yet)
    pub layers: ConfigLayers,
}

/// Factory for creating display drivers from a device name and config files
#[derive(Debug, Clone)]
pub struct DisplayDriverFactory {
    registry: DriverRegistry,
    config_dir: Option<PathBuf>,
}

impl DisplayDriverFactory {
    /// Factory over `registry`, reading config files from the working directory
    pub fn new(registry: DriverRegistry) -> Self {
        Self { registry, config_dir: None }
    }

    /// Factory over the built-in drivers
    pub fn builtin() -> Self {
        Self::new(DriverRegistry::builtin())
    }

    /// Read `omni-epd.ini` and `<device>.ini` from `dir` instead of the working directory
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }

    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    fn config_dir(&self) -> PathBuf {
        match &self.config_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Load the global, device and override layers and settle on a device name.
    ///
    /// The name is checked twice. Before the device file is read, a missing
    /// name is taken from `type` in the global file so its `<type>.ini` is
    /// picked up. After the overrides are merged a missing name is taken from
    /// `type` again, this time in the merged result; an override `type` can
    /// therefore change the device without changing which device file was read.
    pub fn load_config(
        &self,
        display_name: Option<&str>,
        overrides: Option<&EpdConfig>,
    ) -> Result<ResolvedConfig, DisplayFactoryError> {
        let requested = display_name.filter(|n| !n.is_empty());
        let dir = self.config_dir();
        let mut layers = ConfigLayers::new();

        let global_path = dir.join(CONFIG_FILE);
        if let Some(global) = EpdConfig::read_if_exists(&global_path)? {
            debug!("Loading {}", global_path.display());
            layers = layers.with_layer(LayerKind::Global, global_path.display().to_string(), global);
        }

        let device_file = requested.map(str::to_string).or_else(|| {
            layers
                .layer(LayerKind::Global)
                .and_then(|g| g.get(EPD_CONFIG, "type"))
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        });

        if let Some(name) = &device_file {
            let device_path = dir.join(format!("{}.ini", name));
            if let Some(device) = EpdConfig::read_if_exists(&device_path)? {
                debug!("Loading {}", device_path.display());
                layers = layers.with_layer(LayerKind::Device, device_path.display().to_string(), device);
            }
        }

        if let Some(overrides) = overrides {
            layers = layers.with_layer(LayerKind::Overrides, "overrides", overrides.clone());
        }

        let device_name = match requested {
            Some(name) => Some(name.to_string()),
            None => layers
                .merged()
                .get(EPD_CONFIG, "type")
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        };

        Ok(ResolvedConfig { device_name, device_file, layers })
    }

    /// Resolve, build and validate a driver.
    ///
    /// # Arguments
    ///
    /// * `display_name` - full device identifier, e.g. `omni_epd.mock`; `None`
    ///   or empty falls back to `type` in the `[EPD]` section
    /// * `overrides` - highest precedence configuration layer
    ///
    /// # Errors
    ///
    /// `DeviceNotFound` when no driver, or more than one, claims the name.
    /// `Configuration` when a resolved option is invalid for the driver.
    pub fn load_display_driver(
        &self,
        display_name: Option<&str>,
        overrides: Option<&EpdConfig>,
    ) -> Result<BoxedDriver, DisplayFactoryError> {
        let resolved = self.load_config(display_name, overrides)?;
        let name = resolved.device_name.unwrap_or_default();

        let descriptor = self.find_class(&name)?;
        let registration = self
            .registry
            .class(&descriptor.package, &descriptor.class)
            .ok_or_else(|| DisplayFactoryError::DeviceNotFound(name.clone()))?;

        let (_, short_name) = split_device_name(&name);
        let config = resolved
            .layers
            .with_layer(LayerKind::Defaults, registration.class, registration.defaults())
            .merged();

        info!("Loading {} with {}.{}", name, registration.package, registration.class);

        let driver = registration
            .construct(short_name, config)
            .map_err(|err| match err {
                DisplayError::Config(cfg) => DisplayFactoryError::from_config_error(&name, cfg),
                source => DisplayFactoryError::DriverInitFailed { device: name.clone(), source },
            })?;

        Self::validate(driver.as_ref(), &name)?;
        Ok(driver)
    }

    /// The single class claiming `name`
    fn find_class(&self, name: &str) -> Result<DriverDescriptor, DisplayFactoryError> {
        let mut matches: Vec<DriverDescriptor> = self
            .registry
            .descriptors()
            .into_iter()
            .filter(|d| d.devices.iter().any(|dev| dev == name))
            .collect();

        if matches.len() != 1 {
            debug!("{} classes claim '{}'", matches.len(), name);
            return Err(DisplayFactoryError::DeviceNotFound(name.to_string()));
        }
        Ok(matches.remove(0))
    }

    /// Check the settings a driver ended up with.
    ///
    /// Runs after construction because the mode only exists once the
    /// driver has read its configuration.
    pub fn validate(driver: &dyn DisplayDriver, device: &str) -> Result<(), DisplayFactoryError> {
        if !driver.modes_available().iter().any(|m| *m == driver.mode()) {
            return Err(DisplayFactoryError::Configuration {
                device: device.to_string(),
                option: "mode".to_string(),
                value: driver.mode().to_string(),
            });
        }

        driver
            .transform()
            .map_err(|err| DisplayFactoryError::from_config_error(device, err))?;

        if driver.mode() == MODE_PALETTE {
            let palette = driver
                .palette_filter()
                .map_err(|err| DisplayFactoryError::from_config_error(device, err))?;
            if palette.is_empty() || palette.len() > MAX_PALETTE_COLORS {
                return Err(DisplayFactoryError::Configuration {
                    device: device.to_string(),
                    option: "palette_filter".to_string(),
                    value: driver.device_option_or("palette_filter", "").to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Package and short device name: the first two dot-separated parts.
///
/// Anything after a second dot is not part of the short name, so
/// `pkg.epd7in5.v2` is created as `epd7in5`. Names without a dot have no package.
pub fn split_device_name(name: &str) -> (&str, &str) {
    match name.split_once('.') {
        Some((package, rest)) => (package, rest.split_once('.').map_or(rest, |(short, _)| short)),
        None => ("", name),
    }
}
