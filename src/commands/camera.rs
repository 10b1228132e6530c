// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Camera stream request. The stream URL is the state of the camera item, no item command is sent.

use crate::commands::{CommandHandler, Context};
use crate::devices::sensor::camera_protocols;
use crate::errors::{ErrorCode, ServiceError};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetCameraStream {
    #[serde(default)]
    pub stream_to_chromecast: bool,
    #[serde(default)]
    pub supported_stream_protocols: Vec<String>,
}

impl CommandHandler for GetCameraStream {
    fn requires_item(&self, _ctx: &Context) -> bool {
        true
    }

    fn convert_value(&self, _ctx: &Context) -> Result<Option<String>, ServiceError> {
        Ok(None)
    }

    fn response_states(&self, ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        let item = ctx.item()?;
        if !item.has_state() {
            return Err(ServiceError::with_msg(
                ErrorCode::DeviceNotReady,
                format!("{} has no stream URL", item.name),
            ));
        }

        let protocols = camera_protocols(item);
        let protocol = protocols
            .iter()
            .find(|p| self.supported_stream_protocols.contains(p))
            .or(protocols.first())
            .cloned()
            .unwrap_or_default();

        let mut states = Map::new();
        states.insert("cameraStreamAccessUrl".into(), item.state.as_str().into());
        states.insert("cameraStreamProtocol".into(), protocol.into());
        if let Some(token) = item.config().string("token") {
            states.insert("cameraStreamAuthToken".into(), token.into());
        }
        Ok(states)
    }

    fn check_current_state(&self, _target: &str, _current: &str) -> Result<(), ServiceError> {
        Ok(())
    }
}
