/*
 *  config.rs
 *
 *  omni-epd - one loader, many panels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layered INI configuration: parsing, typed access and merging
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

use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::{fmt, fs, io, path::{Path, PathBuf}};
use thiserror::Error;

/// Global configuration file, looked up in the config directory
pub const CONFIG_FILE: &str = "omni-epd.ini";

/// Device/hardware options
pub const EPD_CONFIG: &str = "EPD";
/// Display transform options (rotate, flip)
pub const IMAGE_DISPLAY: &str = "Display";
/// Image enhancement options
pub const IMAGE_ENHANCEMENTS: &str = "Image Enhancements";

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{origin}:{line}: option outside of any section: {text}")]
    MissingSectionHeader { origin: String, line: usize, text: String },
    #[error("{origin}:{line}: could not parse line: {text}")]
    Parse { origin: String, line: usize, text: String },
    #[error("{origin}:{line}: section [{section}] already defined")]
    DuplicateSection { origin: String, line: usize, section: String },
    #[error("{origin}:{line}: option '{key}' already defined in section [{section}]")]
    DuplicateOption { origin: String, line: usize, section: String, key: String },
    #[error("[{section}] {key} = {value}: expected {expected}")]
    InvalidValue { section: String, key: String, value: String, expected: &'static str },
}

/// Two-level mapping of section -> key -> value.
///
/// Keys are stored lower-case, section names are kept as written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EpdConfig {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl EpdConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse INI text. `origin` is only used in error messages.
    pub fn parse(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let mut config = EpdConfig::new();
        let mut seen_sections = HashSet::new();
        let mut seen_options = HashSet::new();
        let mut section: Option<String> = None;
        let mut last_key: Option<String> = None;
        // blank lines seen since the last value line
        let mut blanks = 0;

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw.trim();

            if trimmed.is_empty() {
                blanks += 1;
                continue;
            }
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            // indented line continues the previous value, blank lines included
            if raw.starts_with(char::is_whitespace) {
                if let (Some(sec), Some(key)) = (section.as_ref(), last_key.as_ref()) {
                    if let Some(value) = config.sections.get_mut(sec).and_then(|s| s.get_mut(key)) {
                        if !value.is_empty() {
                            value.push('\n');
                            value.push_str(&"\n".repeat(blanks));
                        }
                        value.push_str(trimmed);
                    }
                    blanks = 0;
                    continue;
                }
            }
            blanks = 0;

            // anything after the closing bracket is ignored
            if let Some(header) = trimmed.strip_prefix('[').and_then(|h| h.split_once(']')) {
                let name = header.0.trim().to_string();
                if !seen_sections.insert(name.clone()) {
                    return Err(ConfigError::DuplicateSection {
                        origin: origin.to_string(),
                        line,
                        section: name,
                    });
                }
                config.sections.entry(name.clone()).or_default();
                section = Some(name);
                last_key = None;
                continue;
            }

            let Some(current) = section.as_ref() else {
                return Err(ConfigError::MissingSectionHeader {
                    origin: origin.to_string(),
                    line,
                    text: trimmed.to_string(),
                });
            };

            let Some((key, value)) = split_option(trimmed) else {
                return Err(ConfigError::Parse {
                    origin: origin.to_string(),
                    line,
                    text: trimmed.to_string(),
                });
            };

            if !seen_options.insert((current.clone(), key.clone())) {
                return Err(ConfigError::DuplicateOption {
                    origin: origin.to_string(),
                    line,
                    section: current.clone(),
                    key,
                });
            }

            config.set(current, &key, value);
            last_key = Some(key);
        }

        Ok(config)
    }

    /// Read and parse a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    /// A missing file is not an error, it just means the layer is absent.
    pub fn read_if_exists(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.is_file() {
            debug!("No config at {}", path.display());
            return Ok(None);
        }
        Self::from_file(path).map(Some)
    }

    /// Builder-style `set`, handy for override mappings.
    pub fn with(mut self, section: &str, key: &str, value: impl Into<String>) -> Self {
        self.set(section, key, value);
        self
    }

    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.trim().to_lowercase(), value.into());
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(&key.to_lowercase()))
            .map(String::as_str)
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    pub fn has_option(&self, section: &str, key: &str) -> bool {
        self.get(section, key).is_some()
    }

    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Options of one section in key order
    pub fn options(&self, section: &str) -> impl Iterator<Item = (&str, &str)> {
        self.sections
            .get(section)
            .into_iter()
            .flat_map(|s| s.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, ConfigError> {
        self.get_parsed(section, key, "a boolean", |v| match v.to_lowercase().as_str() {
            "1" | "yes" | "true" | "on" => Some(true),
            "0" | "no" | "false" | "off" => Some(false),
            _ => None,
        })
    }

    pub fn get_float(&self, section: &str, key: &str) -> Result<Option<f64>, ConfigError> {
        self.get_parsed(section, key, "a number", |v| v.parse::<f64>().ok())
    }

    pub fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, ConfigError> {
        self.get_parsed(section, key, "an integer", |v| v.parse::<i64>().ok())
    }

    fn get_parsed<T>(
        &self,
        section: &str,
        key: &str,
        expected: &'static str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<Option<T>, ConfigError> {
        match self.get(section, key) {
            None => Ok(None),
            Some(raw) => parse(raw.trim()).map(Some).ok_or_else(|| ConfigError::InvalidValue {
                section: section.to_string(),
                key: key.to_lowercase(),
                value: raw.to_string(),
                expected,
            }),
        }
    }

    /// Return a new config with `other` laid over `self`, key by key.
    pub fn merged_with(&self, other: &EpdConfig) -> EpdConfig {
        let mut out = self.clone();
        for (section, options) in &other.sections {
            let target = out.sections.entry(section.clone()).or_default();
            for (key, value) in options {
                target.insert(key.clone(), value.clone());
            }
        }
        out
    }
}

impl fmt::Display for EpdConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for section in self.sections() {
            if !first {
                writeln!(f)?;
            }
            first = false;
            writeln!(f, "[{}]", section)?;
            for (key, value) in self.options(section) {
                // continuation lines must stay indented to round-trip
                writeln!(f, "{} = {}", key, value.replace('\n', "\n    "))?;
            }
        }
        Ok(())
    }
}

/// Split `key = value` / `key: value` on whichever delimiter comes first.
fn split_option(line: &str) -> Option<(String, String)> {
    let pos = line.find(['=', ':'])?;
    let key = line[..pos].trim().to_lowercase();
    if key.is_empty() {
        return None;
    }
    Some((key, line[pos + 1..].trim().to_string()))
}

/// Where a layer came from, in ascending precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Built-in defaults owned by the driver class
    Defaults,
    /// `omni-epd.ini`
    Global,
    /// `<device>.ini`
    Device,
    /// Mapping handed in by the caller
    Overrides,
}

#[derive(Debug, Clone)]
pub struct ConfigLayer {
    pub kind: LayerKind,
    pub origin: String,
    pub config: EpdConfig,
}

/// Immutable stack of configuration layers.
///
/// Layers are kept sorted by [`LayerKind`] so defaults added after the file
/// layers still end up at the bottom; equal kinds keep insertion order.
#[derive(Debug, Clone, Default)]
pub struct ConfigLayers {
    layers: Vec<ConfigLayer>,
}

impl ConfigLayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, kind: LayerKind, origin: impl Into<String>, config: EpdConfig) -> Self {
        let at = self.layers.iter().position(|l| l.kind > kind).unwrap_or(self.layers.len());
        self.layers.insert(at, ConfigLayer { kind, origin: origin.into(), config });
        self
    }

    /// First layer of the given kind, if present
    pub fn layer(&self, kind: LayerKind) -> Option<&EpdConfig> {
        self.layers.iter().find(|l| l.kind == kind).map(|l| &l.config)
    }

    pub fn layers(&self) -> &[ConfigLayer] {
        &self.layers
    }

    pub fn merged(&self) -> EpdConfig {
        self.layers
            .iter()
            .fold(EpdConfig::new(), |acc, layer| acc.merged_with(&layer.config))
    }
}
