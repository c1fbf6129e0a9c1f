//! Per-file lint results.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Findings for a single examined file.
///
/// A result starts out valid and becomes invalid the moment an error is
/// recorded. Warnings and suggestions never affect validity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LintResult {
    /// Absolute path of the examined file.
    pub file: PathBuf,
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
    /// Required fields that were absent, in first-reported order.
    pub missing_fields: Vec<String>,
    /// Fields present in the file but unknown to the composed schema.
    pub unused_fields: Vec<String>,
    /// Errors returned by a configured custom validation hook.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_schema_errors: Option<Vec<String>>,
}

impl LintResult {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            suggestions: Vec::new(),
            missing_fields: Vec::new(),
            unused_fields: Vec::new(),
            custom_schema_errors: None,
        }
    }

    /// Builds the result reported for a file whose processing failed outright.
    pub fn failed(file: &Path, message: impl std::fmt::Display) -> Self {
        let mut result = Self::new(file);
        result.add_error(format!("Failed to lint file: {message}"));
        result
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    /// Records an error unless the identical message is already present.
    ///
    /// Heuristic checks use this so they do not repeat a finding the schema
    /// pass already produced.
    pub fn add_error_once(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.errors.contains(&message) {
            self.add_error(message);
        }
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn add_suggestion(&mut self, message: impl Into<String>) {
        self.suggestions.push(message.into());
    }

    pub fn add_missing_field(&mut self, field: impl Into<String>) {
        let field = field.into();
        if !self.missing_fields.contains(&field) {
            self.missing_fields.push(field);
        }
    }

    pub fn add_unused_field(&mut self, field: impl Into<String>) {
        let field = field.into();
        if !self.unused_fields.contains(&field) {
            self.unused_fields.push(field);
        }
    }

    /// Records an error returned by a custom validation hook.
    ///
    /// The message is kept in `custom_schema_errors` and mirrored into
    /// `errors`, so the file becomes invalid.
    pub fn add_custom_schema_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.custom_schema_errors
            .get_or_insert_with(Vec::new)
            .push(message.clone());
        self.add_error(format!("Custom validation: {message}"));
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Number of errors counted toward summary totals.
    pub fn error_count(&self) -> usize {
        self.errors.len() + self.custom_schema_errors.as_ref().map_or(0, Vec::len)
    }

    pub fn has_findings(&self) -> bool {
        !self.errors.is_empty() || !self.warnings.is_empty() || !self.suggestions.is_empty()
    }
}
