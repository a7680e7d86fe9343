use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::RpcError;

/// Semantic checks that run after the input deserialized and before the handler sees it
pub trait Validate {
    fn validate(&self) -> Result<(), RpcError> {
        Ok(())
    }
}

/// Input of procedures that take none. Any payload, including `null`, is accepted.
#[derive(Debug, Default, Deserialize)]
pub struct NoInput {}

impl Validate for NoInput {}

/// Collects per-field failures so a caller sees every problem at once
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
        self
    }

    /// Non-empty after trimming, at most `max` characters
    pub fn required(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if value.trim().is_empty() {
            self.add(field, "This field is required");
        }
        self.max_len(field, value, max)
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if value.chars().count() > max {
            self.add(field, format!("Must be at most {} characters", max));
        }
        self
    }

    pub fn optional_max_len(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        match value {
            Some(value) => self.max_len(field, value, max),
            None => self,
        }
    }

    pub fn range<T>(&mut self, field: &str, value: Option<T>, min: T, max: T) -> &mut Self
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if let Some(value) = value {
            if value < min || value > max {
                self.add(field, format!("Must be between {} and {}", min, max));
            }
        }
        self
    }

    pub fn at_least<T>(&mut self, field: &str, value: Option<T>, min: T) -> &mut Self
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if let Some(value) = value {
            if value < min {
                self.add(field, format!("Must be at least {}", min));
            }
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), RpcError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(RpcError::invalid_fields(
                "Invalid input",
                std::mem::take(&mut self.errors),
            ))
        }
    }
}
