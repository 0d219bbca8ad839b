/*
 *  display/drivers/mod.rs
 *
 *  omni-epd - one loader, many panels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Built-in display driver implementations
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

use crate::display::registry::DriverRegistry;

// Conditionally compile each driver based on feature flags
#[cfg(feature = "driver-mock")]
pub mod mock;

#[cfg(feature = "driver-file")]
pub mod file;

/// Register every driver compiled into the crate
pub fn register_builtin(registry: &mut DriverRegistry) {
    #[cfg(feature = "driver-mock")]
    registry.register::<mock::MockDisplay>();

    #[cfg(feature = "driver-file")]
    {
        use crate::display::traits::DriverClass;
        registry.register_under::<file::FileDisplay>(mock::MockDisplay::CLASS);
    }

    log::debug!("{} built-in display drivers registered", registry.len());
}
