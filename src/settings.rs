//! Flat key/value settings source.
//!
//! Settings live in a `dot.env`-style file: one `key = value` per line, `#`
//! starts a comment (whole-line or trailing), keys are case-insensitive.
//! Malformed lines are skipped with a warning; only failing to read the file
//! at all is an error.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::{info, warn};

use crate::error::Result;

/// Default settings file location.
pub const DEFAULT_FILE_PATH: &str = "dot.env";

/// Loaded settings, queried by case-insensitive key.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    /// Load settings from a file.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read. Malformed lines inside
    /// a readable file are skipped with a warning instead.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading settings from {}.", path.display());
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Parse settings from text already in memory.
    pub fn parse(text: &str) -> Self {
        let mut values = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                warn!("Skipping invalid settings line: {line}");
                continue;
            };
            // Trailing comments end the value.
            let value = value.split('#').next().unwrap_or("");
            values.insert(
                key.trim().to_ascii_lowercase(),
                value.trim().to_string(),
            );
        }
        Self { values }
    }

    /// Look up a setting.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&key.trim().to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Look up a setting with a fallback.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Look up and parse a setting, falling back on absence or parse failure.
    ///
    /// A present-but-unparsable value is a configuration error: it is logged
    /// and the default is used.
    pub fn get_parsed<T: FromStr + Copy>(&self, key: &str, default: T) -> T {
        match self.get(key) {
            None => default,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Invalid value for setting {key}: {raw}");
                default
            }),
        }
    }

    /// Number of loaded settings.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether any settings are loaded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# demo settings
Main_Topic = home/tree
pix_rows = 3
pix_columns = 4   # trailing comment
broken line without separator
wifi_ap_pfx=sense
";

    #[test]
    fn parses_keys_case_insensitively() {
        let settings = Settings::parse(SAMPLE);
        assert_eq!(settings.get("main_topic"), Some("home/tree"));
        assert_eq!(settings.get("MAIN_TOPIC"), Some("home/tree"));
        assert_eq!(settings.get("wifi_ap_pfx"), Some("sense"));
    }

    #[test]
    fn skips_comments_and_malformed_lines() {
        let settings = Settings::parse(SAMPLE);
        assert_eq!(settings.len(), 4);
        assert_eq!(settings.get("broken line without separator"), None);
    }

    #[test]
    fn strips_trailing_comments() {
        let settings = Settings::parse(SAMPLE);
        assert_eq!(settings.get("pix_columns"), Some("4"));
    }

    #[test]
    fn get_parsed_falls_back_on_bad_values() {
        let settings = Settings::parse("pix_rows = lots\npix_columns = 8\n");
        assert_eq!(settings.get_parsed("pix_rows", 3usize), 3);
        assert_eq!(settings.get_parsed("pix_columns", 3usize), 8);
        assert_eq!(settings.get_parsed("missing", 7u32), 7);
    }
}
