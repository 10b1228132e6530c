// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Typed, lenient access to the free-form `config` object of item metadata.
//!
//! openHAB stores metadata configuration values as entered by the user: booleans and numbers may
//! arrive as JSON values or as strings.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigMap<'a> {
    map: Option<&'a Map<String, Value>>,
}

impl<'a> ConfigMap<'a> {
    pub fn new(map: Option<&'a Map<String, Value>>) -> Self {
        Self { map }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.and_then(|m| m.get(key)).filter(|v| !v.is_null())
    }

    /// Boolean flag. `true` and `"true"` are considered true, everything else false.
    pub fn bool(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(v)) => *v,
            Some(Value::String(v)) => v.trim().eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn str(&self, key: &str) -> Option<&'a str> {
        self.get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// String representation of a string, number or boolean value.
    pub fn string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
            Value::Number(v) => Some(v.to_string()),
            Value::Bool(v) => Some(v.to_string()),
            _ => None,
        }
    }

    pub fn f64(&self, key: &str) -> Option<f64> {
        let value = match self.get(key)? {
            Value::Number(v) => v.as_f64(),
            Value::String(v) => v.trim().parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|v| v.is_finite())
    }
}
