//! Per-section validation and environment overrides
//!
//! Every table of `config.toml` implements [`ConfigSection`]. The section
//! reports its own violations into a [`Report`] and pulls its own
//! `LECTERN_<SECTION>_<FIELD>` variables from an [`EnvOverrides`].

pub use crate::error::ValidationError;
use std::fmt::Display;
use std::str::FromStr;

/// One `[table]` of `config.toml`
pub trait ConfigSection {
    /// Table name, also the middle part of its environment variables
    const NAME: &'static str;

    /// Records every out-of-range value
    fn check(&self, report: &mut Report);

    /// Replaces fields that have a `LECTERN_<NAME>_<FIELD>` variable set
    fn apply_env(&mut self, env: &EnvOverrides<'_>);

    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut report = Report::new(Self::NAME);
        self.check(&mut report);
        report.finish()
    }
}

/// Violations collected for one section; field names get the section prefix
pub struct Report {
    section: &'static str,
    errors: Vec<ValidationError>,
}

impl Report {
    pub fn new(section: &'static str) -> Self {
        Self {
            section,
            errors: Vec::new(),
        }
    }

    fn field(&self, name: &str) -> String {
        format!("{}.{}", self.section, name)
    }

    pub fn range<T>(&mut self, name: &str, value: T, min: T, max: T)
    where
        T: PartialOrd + Display + Copy,
    {
        if value < min || value > max {
            let field = self.field(name);
            self.errors.push(ValidationError::with_value(
                field,
                format!("must be between {} and {}", min, max),
                value,
            ));
        }
    }

    pub fn not_empty(&mut self, name: &str, value: &str) {
        if value.trim().is_empty() {
            let field = self.field(name);
            self.errors
                .push(ValidationError::new(field, "must not be empty"));
        }
    }

    /// `value` must mention at least one of `placeholders`
    pub fn mentions_any(&mut self, name: &str, value: &str, placeholders: &[&str]) {
        if !placeholders.iter().any(|p| value.contains(p)) {
            let field = self.field(name);
            self.errors.push(ValidationError::with_value(
                field,
                format!("must contain one of: {}", placeholders.join(", ")),
                value,
            ));
        }
    }

    pub fn reject(&mut self, name: &str, message: &str, value: impl ToString) {
        let field = self.field(name);
        self.errors
            .push(ValidationError::with_value(field, message, value));
    }

    pub fn finish(self) -> Result<(), Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Source of `LECTERN_*` variables
///
/// Production code reads the process environment; tests pass a map.
pub struct EnvOverrides<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl<'a> EnvOverrides<'a> {
    pub fn new(lookup: &'a dyn Fn(&str) -> Option<String>) -> Self {
        Self { lookup }
    }

    pub fn key(section: &str, field: &str) -> String {
        format!(
            "LECTERN_{}_{}",
            section.to_ascii_uppercase(),
            field.to_ascii_uppercase()
        )
    }

    /// Overwrites `slot` when the variable is set and parses.
    ///
    /// Unparseable values are logged and leave `slot` untouched.
    pub fn set<T: FromStr>(&self, section: &str, field: &str, slot: &mut T) {
        let key = Self::key(section, field);
        let Some(raw) = (self.lookup)(&key) else {
            return;
        };
        match raw.trim().parse::<T>() {
            Ok(value) => {
                log::debug!("{} overrides {}.{}", key, section, field);
                *slot = value;
            }
            Err(_) => log::warn!("Ignoring {}={:?}: not a valid value", key, raw),
        }
    }
}
