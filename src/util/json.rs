// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

use serde_json::{Number, Value};

/// Convert a float to a json number. Whole numbers are emitted as integers.
pub fn number(value: f64) -> Value {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::Number((value as i64).into())
    } else {
        Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Format a float like a json number: `65.0` becomes `65`, `32.5` stays `32.5`.
pub fn number_string(value: f64) -> String {
    number(value).to_string()
}
