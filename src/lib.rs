// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Google Smart Home intent translation for openHAB items.

pub mod client;
pub mod commands;
pub mod controller;
pub mod devices;
pub mod google;
pub mod util;

pub mod configuration;
pub mod errors;
pub mod startup;

pub use controller::*;
pub use startup::*;
