/*
 *  display/registry.rs
 *
 *  omni-epd - one loader, many panels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Driver registry - explicit registration of driver classes
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

//! Driver registry
//!
//! Driver classes register themselves either directly beneath the root
//! [`DISPLAY_DRIVER`] capability or beneath another registered class. Queries
//! walk that tree depth-first, in registration order, so a class registered
//! under another class is reported right after its parent.
//!
//! Nothing is discovered lazily: a class that was never registered does not
//! exist as far as the registry is concerned, and one whose parent chain never
//! reaches the root is not reported.

use std::collections::BTreeSet;
use std::fmt;
use log::{debug, warn};
use serde::Serialize;

use crate::config::EpdConfig;
use crate::display::error::DisplayError;
use crate::display::factory::BoxedDriver;
use crate::display::traits::{DriverClass, DISPLAY_DRIVER};

/// Constructor reference stored for each registered class
pub type DriverConstructor = fn(&str, EpdConfig) -> Result<BoxedDriver, DisplayError>;

/// A registered driver class
#[derive(Clone)]
pub struct DriverRegistration {
    pub package: &'static str,
    pub class: &'static str,
    /// Class (or the root capability) this one was registered beneath
    pub parent: &'static str,
    supported_devices: fn() -> Vec<String>,
    defaults: fn() -> EpdConfig,
    constructor: DriverConstructor,
}

impl DriverRegistration {
    pub fn of<T: DriverClass>(parent: &'static str) -> Self {
        Self {
            package: T::PACKAGE,
            class: T::CLASS,
            parent,
            supported_devices: T::supported_devices,
            defaults: T::defaults,
            constructor: construct::<T>,
        }
    }

    pub fn supported_devices(&self) -> Vec<String> {
        (self.supported_devices)()
    }

    pub fn defaults(&self) -> EpdConfig {
        (self.defaults)()
    }

    pub fn construct(&self, device_name: &str, config: EpdConfig) -> Result<BoxedDriver, DisplayError> {
        (self.constructor)(device_name, config)
    }

    pub fn descriptor(&self) -> DriverDescriptor {
        DriverDescriptor {
            package: self.package.to_string(),
            class: self.class.to_string(),
            devices: self.supported_devices(),
        }
    }

    fn same_class(&self, other: &DriverRegistration) -> bool {
        self.package == other.package && self.class == other.class
    }
}

impl fmt::Debug for DriverRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistration")
            .field("package", &self.package)
            .field("class", &self.class)
            .field("parent", &self.parent)
            .finish()
    }
}

fn construct<T: DriverClass>(device_name: &str, config: EpdConfig) -> Result<BoxedDriver, DisplayError> {
    Ok(Box::new(T::create(device_name, config)?))
}

/// Everything needed to find a class again and what it supports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverDescriptor {
    pub package: String,
    pub class: String,
    pub devices: Vec<String>,
}

/// Result of [`DriverRegistry::list_supported_displays`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SupportedDisplays {
    /// Sorted, de-duplicated device identifiers
    Devices(Vec<String>),
    /// One descriptor per class
    Classes(Vec<DriverDescriptor>),
}

impl SupportedDisplays {
    pub fn len(&self) -> usize {
        match self {
            SupportedDisplays::Devices(d) => d.len(),
            SupportedDisplays::Classes(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct DriverRegistry {
    registrations: Vec<DriverRegistration>,
}

impl DriverRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every driver compiled into the crate
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        crate::display::drivers::register_builtin(&mut registry);
        registry
    }

    /// Register `T` directly beneath the root capability
    pub fn register<T: DriverClass>(&mut self) -> &mut Self {
        self.insert(DriverRegistration::of::<T>(DISPLAY_DRIVER))
    }

    /// Register `T` beneath another class
    pub fn register_under<T: DriverClass>(&mut self, parent: &'static str) -> &mut Self {
        self.insert(DriverRegistration::of::<T>(parent))
    }

    /// Add a registration, replacing an earlier one for the same class
    pub fn insert(&mut self, registration: DriverRegistration) -> &mut Self {
        debug!("Registering {}.{} under {}", registration.package, registration.class, registration.parent);
        match self.registrations.iter_mut().find(|r| r.same_class(&registration)) {
            Some(existing) => {
                warn!("{}.{} registered twice, replacing", registration.package, registration.class);
                *existing = registration;
            }
            None => self.registrations.push(registration),
        }
        self
    }

    /// Registered classes reachable from the root, depth-first
    pub fn implementations(&self) -> Vec<&DriverRegistration> {
        let mut found = Vec::new();
        self.collect(DISPLAY_DRIVER, &mut found);
        found
    }

    fn collect<'a>(&'a self, parent: &str, found: &mut Vec<&'a DriverRegistration>) {
        for reg in self.registrations.iter().filter(|r| r.parent == parent) {
            // class names may repeat across packages, don't walk a loop
            if found.iter().any(|f| f.same_class(reg)) {
                continue;
            }
            found.push(reg);
            self.collect(reg.class, found);
        }
    }

    /// One descriptor per reachable class, devices as declared
    pub fn descriptors(&self) -> Vec<DriverDescriptor> {
        self.implementations().into_iter().map(DriverRegistration::descriptor).collect()
    }

    /// Every device identifier, sorted and de-duplicated
    pub fn device_ids(&self) -> Vec<String> {
        self.implementations()
            .into_iter()
            .flat_map(|r| r.supported_devices())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn list_supported_displays(&self, as_structured: bool) -> SupportedDisplays {
        if as_structured {
            SupportedDisplays::Classes(self.descriptors())
        } else {
            SupportedDisplays::Devices(self.device_ids())
        }
    }

    /// Look a class up again from descriptor identifiers
    pub fn class(&self, package: &str, class: &str) -> Option<&DriverRegistration> {
        self.registrations
            .iter()
            .find(|r| r.package == package && r.class == class)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
