// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! openHAB REST item data structure definitions for JSON deserialization.

use crate::util::ConfigMap;
use crate::util::parse::parse_number;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;
use std::collections::HashMap;

/// Metadata namespace of the Google Assistant binding.
pub const GA_NAMESPACE: &str = "ga";
/// Metadata namespace holding additional device names.
pub const SYNONYMS_NAMESPACE: &str = "synonyms";

/// An openHAB item as returned by `GET /rest/items/{name}?metadata=ga,synonyms`.
///
/// Items are read-only snapshots: a state change is requested by sending a command to the hub.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub name: String,
    pub label: Option<String>,
    /// Item type including an optional dimension, e.g. `Number:Temperature`.
    #[serde(rename = "type", default)]
    pub item_type: String,
    pub group_type: Option<String>,
    #[serde(default, deserialize_with = "state_from_value")]
    pub state: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Item>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, MetadataEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MetadataEntry {
    #[serde(default, deserialize_with = "state_from_value")]
    pub value: String,
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl Item {
    pub fn is_group(&self) -> bool {
        self.item_type == "Group"
    }

    /// Effective item type: the group type for groups, without a dimension suffix.
    pub fn base_type(&self) -> &str {
        let item_type = match (&self.group_type, self.is_group()) {
            (Some(group_type), true) if !group_type.is_empty() => group_type.as_str(),
            _ => self.item_type.as_str(),
        };
        item_type.split(':').next().unwrap_or(item_type)
    }

    /// The Google Assistant metadata.
    pub fn ga(&self) -> Option<&MetadataEntry> {
        self.metadata.get(GA_NAMESPACE)
    }

    /// Google Assistant metadata value, e.g. the device type or a member role.
    pub fn ga_value(&self) -> Option<&str> {
        self.ga().map(|ga| ga.value.trim())
    }

    /// Free-form Google Assistant metadata configuration.
    pub fn config(&self) -> ConfigMap<'_> {
        ConfigMap::new(self.ga().map(|ga| &ga.config))
    }

    /// Additional names from the `synonyms` metadata namespace.
    pub fn synonyms(&self) -> Vec<String> {
        self.metadata
            .get(SYNONYMS_NAMESPACE)
            .map(|s| {
                s.value
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// The item holds a value. `NULL` and `UNDEF` denote an uninitialized item.
    pub fn has_state(&self) -> bool {
        !matches!(self.state.as_str(), "" | "NULL" | "UNDEF")
    }

    /// Numeric item state without unit suffix.
    pub fn number(&self) -> Option<f64> {
        parse_number(&self.state)
    }

    pub fn display_name(&self) -> &str {
        self.label
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.name)
    }
}

/// Reconstruct group memberships of a flat item list.
///
/// The item list endpoint doesn't nest group members. Each group gets a copy of all items
/// referencing it in their `groupNames`.
pub fn attach_members(items: Vec<Item>) -> Vec<Item> {
    let mut members: HashMap<String, Vec<Item>> = HashMap::new();
    for item in &items {
        for group in &item.group_names {
            members.entry(group.clone()).or_default().push(item.clone());
        }
    }

    items
        .into_iter()
        .map(|mut item| {
            if item.is_group() && item.members.is_empty() {
                if let Some(m) = members.remove(&item.name) {
                    item.members = m;
                }
            }
            item
        })
        .collect()
}

/// Accept strings, numbers and booleans for string fields. `null` becomes an empty string.
fn state_from_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(v) => v,
        Value::Number(v) => v.to_string(),
        Value::Bool(v) => v.to_string(),
        _ => String::new(),
    })
}
