// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Parser for the list notation used in item configuration values.
//!
//! Lists are comma separated entries of the form `key=value1:value2`, e.g.
//! `off=OFF,heat=HEAT:comfort,cool=COOL`. An entry without `=` uses the key as its only value.

/// One `key=value1:value2` entry of a configuration list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub key: String,
    pub values: Vec<String>,
}

impl ListEntry {
    /// First value of the entry, falls back to the key.
    pub fn first_value(&self) -> &str {
        self.values.first().map(String::as_str).unwrap_or(&self.key)
    }
}

/// Parse a comma separated `key=value1:value2` list. Empty entries are skipped.
pub fn parse_list(list: &str) -> Vec<ListEntry> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let (key, values) = match entry.split_once('=') {
                Some((key, values)) => (key.trim(), values),
                None => (entry, entry),
            };
            if key.is_empty() {
                return None;
            }
            let values: Vec<String> = values
                .split(':')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect();
            Some(ListEntry {
                key: key.to_string(),
                values: if values.is_empty() {
                    vec![key.to_string()]
                } else {
                    values
                },
            })
        })
        .collect()
}

/// Parse a comma separated list of plain values.
pub fn parse_values(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a `min,max` range. Returns `None` if the range is incomplete or invalid.
pub fn parse_range(range: &str) -> Option<(f64, f64)> {
    let (min, max) = range.split_once(',')?;
    let min = min.trim().parse::<f64>().ok()?;
    let max = max.trim().parse::<f64>().ok()?;
    if min.is_finite() && max.is_finite() && min < max {
        Some((min, max))
    } else {
        None
    }
}

/// Parse the leading number of an item state, ignoring a unit suffix like `21.5 °C`.
pub fn parse_number(state: &str) -> Option<f64> {
    state
        .split_whitespace()
        .next()
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
