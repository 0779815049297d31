// src/deployment/variables.rs

//! Deployment variable dictionary
//!
//! Names are case-insensitive and iterate in sorted order. Values may
//! reference other variables with `#{Name}`; references are expanded on read.
//! `##{` produces a literal `#{`. References that cannot be resolved stay in
//! the text verbatim and are reported by [`VariableDictionary::evaluate`].

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Nesting limit for `#{...}` expansion; also breaks reference cycles
const MAX_EXPANSION_DEPTH: usize = 16;

#[derive(Debug, Clone)]
struct Variable {
    name: String,
    value: String,
}

/// Result of expanding a template against the dictionary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub value: String,
    /// Names referenced by the template that could not be resolved
    pub unresolved: Vec<String>,
}

/// Ordered, case-insensitive string map with template expansion
#[derive(Debug, Clone, Default)]
pub struct VariableDictionary {
    entries: BTreeMap<String, Variable>,
    outputs: Vec<String>,
}

impl VariableDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.entries.insert(
            name.to_lowercase(),
            Variable {
                name,
                value: value.into(),
            },
        );
    }

    /// Set a variable and record it as an output of the deployment
    pub fn set_output(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        info!("Output variable {} = '{}'", name, value);

        if !self.outputs.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
            self.outputs.push(name.clone());
        }
        self.set(name, value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_lowercase())
    }

    /// The stored value without template expansion
    pub fn get_raw(&self, name: &str) -> Option<&str> {
        self.entries.get(&name.to_lowercase()).map(|v| v.value.as_str())
    }

    /// The expanded value of a variable
    pub fn get(&self, name: &str) -> Option<String> {
        self.get_raw(name).map(|raw| self.evaluate(raw).value)
    }

    pub fn get_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    /// The expanded value, treating empty and whitespace-only values as unset
    pub fn get_non_empty(&self, name: &str) -> Option<String> {
        self.get(name).filter(|v| !v.trim().is_empty())
    }

    /// Interpret a variable as a boolean; unset or unparseable yields `default`
    pub fn get_flag(&self, name: &str, default: bool) -> bool {
        match self.get(name) {
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => default,
            },
            None => default,
        }
    }

    pub fn set_flag(&mut self, name: impl Into<String>, value: bool) {
        self.set(name, if value { "True" } else { "False" });
    }

    /// Split a variable into trimmed, non-empty parts
    pub fn get_strings(&self, name: &str, separators: &[char]) -> Vec<String> {
        self.get(name)
            .map(|value| {
                value
                    .split(|c| separators.contains(&c))
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_path(&self, name: &str) -> Option<PathBuf> {
        self.get_non_empty(name).map(PathBuf::from)
    }

    /// Expand `#{...}` references in an arbitrary template
    ///
    /// # Examples
    ///
    /// ```
    /// use outpost::deployment::VariableDictionary;
    ///
    /// let mut variables = VariableDictionary::new();
    /// variables.set("Environment", "Production");
    /// let evaluation = variables.evaluate("/apps/#{environment}/#{Tenant}");
    /// assert_eq!(evaluation.value, "/apps/Production/#{Tenant}");
    /// assert_eq!(evaluation.unresolved, vec!["Tenant".to_string()]);
    /// ```
    pub fn evaluate(&self, template: &str) -> Evaluation {
        let mut unresolved = Vec::new();
        let value = self.expand(template, 0, &mut unresolved);
        Evaluation { value, unresolved }
    }

    fn expand(&self, template: &str, depth: usize, unresolved: &mut Vec<String>) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("#{") {
            if rest[..start].ends_with('#') {
                out.push_str(&rest[..start - 1]);
                out.push_str("#{");
                rest = &rest[start + 2..];
                continue;
            }

            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                out.push_str(&rest[start..]);
                return out;
            };

            let name = after[..end].trim();
            match self.get_raw(name) {
                Some(value) if depth < MAX_EXPANSION_DEPTH => {
                    out.push_str(&self.expand(value, depth + 1, unresolved));
                }
                _ => {
                    out.push_str(&rest[start..start + 2 + end + 1]);
                    if !unresolved.iter().any(|n| n == name) {
                        unresolved.push(name.to_string());
                    }
                }
            }
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        out
    }

    /// Variable names and raw values in sorted order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|v| (v.name.as_str(), v.value.as_str()))
    }

    /// Output variables with their current raw values
    pub fn outputs(&self) -> Vec<(String, String)> {
        self.outputs
            .iter()
            .filter_map(|name| {
                self.get_raw(name)
                    .map(|value| (name.clone(), value.to_string()))
            })
            .collect()
    }

    /// Parse a `Name=Value` assignment as given on the command line
    pub fn parse_assignment(assignment: &str) -> Result<(String, String)> {
        match assignment.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.to_string()))
            }
            _ => Err(Error::Config(format!(
                "Invalid variable assignment '{}', expected Name=Value",
                assignment
            ))),
        }
    }

    /// Load variables from a JSON object or a TOML table
    ///
    /// The format is chosen by extension (`.toml`, anything else is JSON).
    /// Scalar values are converted to their string form.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let raw: BTreeMap<String, ScalarValue> = if is_toml {
            toml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        let mut variables = Self::new();
        for (name, value) in raw {
            variables.set(name, value.into_string());
        }
        Ok(variables)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ScalarValue {
    fn into_string(self) -> String {
        match self {
            Self::Bool(b) => String::from(if b { "True" } else { "False" }),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s,
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableDictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut variables = Self::new();
        for (name, value) in iter {
            variables.set(name, value);
        }
        variables
    }
}
