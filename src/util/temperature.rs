// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Temperature unit conversions. Google always receives Celsius values.

use crate::util::color::round;

/// Convert Fahrenheit to Celsius, rounded to one decimal.
pub fn celsius_from_fahrenheit(fahrenheit: f64) -> f64 {
    round((fahrenheit - 32.0) * 5.0 / 9.0, 1)
}

/// Convert Celsius to Fahrenheit, rounded to a whole degree.
pub fn fahrenheit_from_celsius(celsius: f64) -> f64 {
    (celsius * 9.0 / 5.0 + 32.0).round()
}
