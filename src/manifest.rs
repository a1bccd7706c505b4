#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result, bail};
use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::grade::results::ENTRY_KEYS;

/// Value of a tag declared on a graded test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    /// An integer tag
    Int(i64),
    /// A string tag
    Text(String),
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Text(value.to_string())
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        TagValue::Int(value)
    }
}

/// Points declaration attached to one test method.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct GradedMarker {
    /// Points awarded when the test passes
    pub points: u32,
    /// Display name; the method name is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub name:   Option<String>,
    /// Extra key/value pairs copied onto the score entry
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[builder(default)]
    pub tags:   BTreeMap<String, TagValue>,
}

/// Maps qualified test class names to the graded methods they declare.
///
/// Methods without a marker are informational and never scored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointsManifest {
    /// class name -> method name -> marker
    classes: BTreeMap<String, BTreeMap<String, GradedMarker>>,
}

impl PointsManifest {
    /// Creates an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read points manifest {}", path.display()))?;
        let manifest: Self = serde_json::from_str(&text)
            .with_context(|| format!("Could not parse points manifest {}", path.display()))?;
        manifest
            .check_tags()
            .with_context(|| format!("Invalid points manifest {}", path.display()))?;
        Ok(manifest)
    }

    /// Rejects tags that would collide with the score entry's own keys.
    fn check_tags(&self) -> Result<()> {
        for (class_name, methods) in &self.classes {
            for (method, marker) in methods {
                if let Some(key) = marker
                    .tags
                    .keys()
                    .find(|key| ENTRY_KEYS.contains(&key.as_str()))
                {
                    bail!("{class_name}#{method}: tag `{key}` would replace a score entry field");
                }
            }
        }
        Ok(())
    }

    /// Declares `marker` for `class_name#method`. A later declaration for the
    /// same method replaces the earlier one.
    pub fn declare(
        &mut self,
        class_name: impl Into<String>,
        method: impl Into<String>,
        marker: GradedMarker,
    ) -> &mut Self {
        self.classes
            .entry(class_name.into())
            .or_default()
            .insert(method.into(), marker);
        self
    }

    /// Looks up the marker declared for `class_name#method`.
    pub fn lookup(&self, class_name: &str, method: &str) -> Option<&GradedMarker> {
        self.classes.get(class_name)?.get(method)
    }

    /// True when nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.classes.values().all(BTreeMap::is_empty)
    }
}
