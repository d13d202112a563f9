//! Effect registry.
//!
//! All available effects are registered in a static table built once at
//! startup from the compiled-in implementations. Lookup is by
//! case-insensitive name; the listing is sorted and stable so help output
//! and random selection behave the same across calls.

use crate::effects::{self, Effect};
use crate::error::{Error, Result};
use crate::matrix::MatrixDims;
use crate::params::EffectParams;

/// Constructor capability of a registered effect.
pub type BuildFn = fn(MatrixDims, &EffectParams) -> Result<Box<dyn Effect>>;

/// Registration metadata for one effect implementation.
///
/// Immutable once registered. `purpose` and `example` may be left out, in
/// which case the registry generates defaults from the name.
#[derive(Clone)]
pub struct EffectDescriptor {
    /// Unique effect name, matched case-insensitively.
    pub name: &'static str,
    /// Human-readable one-line purpose.
    pub purpose: Option<&'static str>,
    /// Example control message starting this effect.
    pub example: Option<&'static str>,
    /// Wait interval applied when the control message supplies none.
    pub default_wait_ms: u64,
    /// Instance constructor.
    pub build: BuildFn,
}

impl EffectDescriptor {
    /// Purpose text, generated from the name when none was supplied.
    pub fn purpose_text(&self) -> String {
        match self.purpose {
            Some(text) => text.to_string(),
            None => format!("Display {} on the matrix.", self.name),
        }
    }

    /// Example control message, generated from the name when none was
    /// supplied.
    pub fn example_config(&self) -> String {
        match self.example {
            Some(text) => text.to_string(),
            None => format!(r#"{{ "effect": "{}" }}"#, self.name),
        }
    }
}

impl std::fmt::Debug for EffectDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectDescriptor")
            .field("name", &self.name)
            .field("purpose", &self.purpose)
            .field("example", &self.example)
            .field("default_wait_ms", &self.default_wait_ms)
            .finish()
    }
}

/// Name-indexed collection of effect descriptors.
#[derive(Debug)]
pub struct Registry {
    effects: Vec<EffectDescriptor>,
}

impl Registry {
    /// Build the registry from the built-in effect implementations.
    ///
    /// # Errors
    /// Fails when a descriptor carries a blank name or a name already taken
    /// (case-insensitively). That is a build-configuration error: the caller
    /// is expected to abort startup, not to recover.
    pub fn discover() -> Result<Self> {
        Self::from_descriptors(effects::builtins())
    }

    /// Build a registry from an explicit descriptor list.
    ///
    /// # Errors
    /// Same validation as [`discover`](Self::discover).
    pub fn from_descriptors(mut effects: Vec<EffectDescriptor>) -> Result<Self> {
        for descriptor in &effects {
            if descriptor.name.trim().is_empty() {
                return Err(Error::Config(
                    "effect registered without a name".to_string(),
                ));
            }
        }
        effects.sort_by_key(|d| d.name.to_ascii_lowercase());
        for pair in effects.windows(2) {
            if pair[0].name.eq_ignore_ascii_case(pair[1].name) {
                return Err(Error::Config(format!(
                    "duplicate effect name: {}",
                    pair[1].name
                )));
            }
        }
        Ok(Self { effects })
    }

    /// Look up a descriptor by case-insensitive name.
    pub fn lookup(&self, name: &str) -> Option<&EffectDescriptor> {
        let name = name.trim();
        self.effects
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    /// All descriptors, sorted by name.
    pub fn list(&self) -> &[EffectDescriptor] {
        &self.effects
    }

    /// All effect names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.effects.iter().map(|d| d.name).collect()
    }

    /// Purpose text for a named effect.
    pub fn purpose(&self, name: &str) -> Option<String> {
        self.lookup(name).map(EffectDescriptor::purpose_text)
    }

    /// Example control message for a named effect.
    pub fn example_config(&self, name: &str) -> Option<String> {
        self.lookup(name).map(EffectDescriptor::example_config)
    }

    /// Example control message of a randomly picked effect.
    pub fn random_example<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Option<String> {
        if self.effects.is_empty() {
            return None;
        }
        let index = rng.random_range(0..self.effects.len());
        Some(self.effects[index].example_config())
    }

    /// Help text covering every registered effect.
    pub fn full_help(&self) -> String {
        let mut lines = vec![format!("Available effects: {}.\n", self.names().join(", "))];
        for descriptor in &self.effects {
            lines.push(format!(
                "{}: {}",
                descriptor.name,
                descriptor.purpose_text()
            ));
            lines.push(format!(
                "{:width$} {}",
                "",
                descriptor.example_config(),
                width = descriptor.name.len() + 1
            ));
        }
        lines.join("\n")
    }

    /// Number of registered effects.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
