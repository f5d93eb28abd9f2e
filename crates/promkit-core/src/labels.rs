//! Metric name / label name validation and the per-instance label set.
//!
//! Validation runs once, when a collector is constructed. Label *values* are
//! arbitrary strings and are never checked.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{PromError, Result};

/// Reserved label carrying a histogram bucket's upper bound.
pub const BUCKET_LABEL: &str = "le";
/// Reserved label carrying a summary quantile.
pub const QUANTILE_LABEL: &str = "quantile";

/// Prefix reserved for internal use.
const RESERVED_PREFIX: &str = "__";

/// `[a-zA-Z_:][a-zA-Z0-9_:]*`
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`
pub fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn validate_metric_name(name: &str) -> Result<()> {
    if !is_valid_metric_name(name) {
        return Err(PromError::InvalidArgument(format!(
            "invalid metric name: {name:?}"
        )));
    }
    Ok(())
}

pub fn validate_label_name(name: &str) -> Result<()> {
    if !is_valid_label_name(name) {
        return Err(PromError::InvalidArgument(format!(
            "invalid label name: {name:?}"
        )));
    }
    if name.starts_with(RESERVED_PREFIX) {
        return Err(PromError::InvalidArgument(format!(
            "label name {name:?} uses the reserved prefix {RESERVED_PREFIX:?}"
        )));
    }
    Ok(())
}

/// Validate a declared label-name sequence and freeze it.
///
/// `reserved` lists names owned by the metric type (`le` for histograms,
/// `quantile` for summaries).
pub fn validate_label_names(names: &[&str], reserved: &[&str]) -> Result<Arc<[String]>> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        validate_label_name(name)?;
        if reserved.contains(name) {
            return Err(PromError::InvalidArgument(format!(
                "label name {name:?} is reserved"
            )));
        }
        if !seen.insert(*name) {
            return Err(PromError::InvalidArgument(format!(
                "duplicate label name {name:?}"
            )));
        }
    }
    Ok(names.iter().map(|n| n.to_string()).collect())
}

/// Label pairs of one instance: declared names (shared by every instance of a
/// collector) zipped with this instance's values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelSet {
    names: Arc<[String]>,
    values: Vec<String>,
}

impl LabelSet {
    /// The label set of an unlabelled instance.
    pub fn empty() -> Self {
        Self {
            names: Arc::from(Vec::<String>::new()),
            values: Vec::new(),
        }
    }

    /// Bind `values` to already-validated `names`.
    pub fn new(names: Arc<[String]>, values: Vec<String>) -> Result<Self> {
        if names.len() != values.len() {
            return Err(PromError::InvalidArgument(format!(
                "expected {} label values, got {}",
                names.len(),
                values.len()
            )));
        }
        Ok(Self { names, values })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// (name, value) pairs in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .iter()
            .zip(self.values.iter())
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }
}
