// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Command line tool for Google Smart Home intents against a live openHAB server.

#![forbid(non_ascii_idents)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use openhab_ga::client::OpenhabClient;
use openhab_ga::configuration::{DEF_CONFIG_FILE, get_configuration};
use openhab_ga::google::{Challenge, Device, SyncDevice};
use openhab_ga::{APP_VERSION, execute, query_devices, sync};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

#[derive(Parser)]
#[command(
    author = "Unfolded Circle ApS",
    version = APP_VERSION,
    about = "Google Smart Home intents for openHAB items"
)]
struct Args {
    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    #[command(subcommand)]
    intent: Intent,
}

#[derive(Subcommand)]
enum Intent {
    /// Print all Google devices of the openHAB items
    Sync,
    /// Query the state of devices
    Query {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Execute a Google command on devices, e.g. `OnOff --params '{"on":true}' Lamp`
    Execute {
        command: String,
        /// Command parameters as json object
        #[arg(long, default_value = "{}")]
        params: String,
        /// Two-factor authentication PIN
        #[arg(long)]
        pin: Option<String>,
        /// Acknowledge the command
        #[arg(long)]
        ack: bool,
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[actix_rt::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg_file = match args.config.as_deref() {
        None => {
            if Path::new(DEF_CONFIG_FILE).exists() {
                info!("Loading default configuration file: {}", DEF_CONFIG_FILE);
                Some(DEF_CONFIG_FILE)
            } else {
                None
            }
        }
        Some(c) => Some(c),
    };
    let cfg = get_configuration(cfg_file).context("Failed to read configuration")?;
    info!("openHAB server: {}", cfg.hub.url);
    let client = OpenhabClient::new(&cfg.hub);

    match args.intent {
        Intent::Sync => print_json(&sync(&client).await?),
        Intent::Query { ids } => {
            let devices = google_devices(&sync(&client).await?, &ids);
            print_json(&query_devices(&client, &devices).await)
        }
        Intent::Execute {
            command,
            params,
            pin,
            ack,
            ids,
        } => {
            let params: Value =
                serde_json::from_str(&params).context("Invalid command parameters")?;
            let devices = google_devices(&sync(&client).await?, &ids);
            let challenge = Challenge { pin, ack };
            print_json(&execute(&client, &command, &params, &devices, Some(&challenge)).await)
        }
    }
}

/// Devices as Google sends them: the id and the `customData` of the SYNC response.
///
/// Unknown ids are passed without `customData` and fail in the intent handler.
fn google_devices(synced: &[SyncDevice], ids: &[String]) -> Vec<Device> {
    ids.iter()
        .map(|id| Device {
            id: id.clone(),
            custom_data: synced
                .iter()
                .find(|d| &d.id == id)
                .map(|d| d.custom_data.clone())
                .unwrap_or_default(),
        })
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
