// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Common utility functions.

pub mod color;
mod config_value;
pub mod json;
pub mod parse;
pub mod temperature;

pub use config_value::ConfigMap;
