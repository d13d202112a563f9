//! Typed access to effect parameters.
//!
//! Control messages carry loosely-typed JSON fields next to the `effect`
//! name. Effects read them through [`EffectParams`]: absent keys fall back to
//! the effect's default, present-but-malformed values are rejected with a
//! parameter error so the bad message is dropped instead of half-applied.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::color::Rgb;
use crate::error::{Error, Result};

/// Effect-specific parameter mapping decoded from a control message.
#[derive(Debug, Clone, Default)]
pub struct EffectParams {
    values: Map<String, Value>,
}

impl EffectParams {
    /// Empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-decoded JSON object.
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Raw access to a parameter value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Whether no parameters were supplied.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read an unsigned integer parameter.
    pub fn u64_or(&self, key: &str, default: u64) -> Result<u64> {
        match self.values.get(key) {
            None => Ok(default),
            Some(value) => value.as_u64().ok_or_else(|| {
                Error::Params(format!("\"{key}\" must be an unsigned integer, not {value}"))
            }),
        }
    }

    /// Read a string parameter.
    pub fn str_or(&self, key: &str, default: &str) -> Result<String> {
        match self.values.get(key) {
            None => Ok(default.to_string()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(value) => Err(Error::Params(format!(
                "\"{key}\" must be a string, not {value}"
            ))),
        }
    }

    /// Read the `color` parameter as a `[r, g, b]` array.
    pub fn color_or(&self, default: Rgb) -> Result<Rgb> {
        match self.values.get("color") {
            None => Ok(default),
            Some(value) => serde_json::from_value(value.clone()).map_err(|_| {
                Error::Params(format!(
                    "\"color\" must be a [r, g, b] array of 0-255 integers, not {value}"
                ))
            }),
        }
    }

    /// Read the `wait` parameter in milliseconds.
    pub fn wait_or(&self, default_ms: u64) -> Result<Duration> {
        Ok(Duration::from_millis(self.u64_or("wait", default_ms)?))
    }
}
