// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Custom application error with conversions from common Rust and 3rd-party errors.
//!
//! Every failure that reaches Google is expressed as an [`ErrorCode`]. Errors without an explicit
//! code, e.g. a failed hub request, are mapped with [`ServiceError::error_code`].

use derive_more::Display;
use log::error;
use serde::Serialize;
use strum::{AsRefStr, EnumString, VariantNames};

/// Google Smart Home error codes.
///
/// See <https://developers.home.google.com/cloud-to-cloud/intents/errors-exceptions>
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    AsRefStr,
    EnumString,
    VariantNames,
    Serialize,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    // device & connectivity
    DeviceOffline,
    DeviceNotFound,
    DeviceNotReady,
    // parameters & capabilities
    ValueOutOfRange,
    NotSupported,
    FunctionNotSupported,
    // already in requested state
    AlreadyOn,
    AlreadyOff,
    AlreadyOpen,
    AlreadyClosed,
    AlreadyLocked,
    AlreadyUnlocked,
    AlreadyStarted,
    AlreadyStopped,
    AlreadyPaused,
    AlreadyArmed,
    AlreadyDisarmed,
    AlreadyDocked,
    AlreadyInState,
    TargetAlreadyReached,
    VolumeAlreadyMax,
    VolumeAlreadyMin,
    MaxSpeedReached,
    MinSpeedReached,
    // thermostat modes
    InAutoMode,
    InOffMode,
    InEcoMode,
    InDryMode,
    InFanOnlyMode,
    InHeatOrCool,
    InHeatMode,
    InCoolMode,
    // command specific
    ArmFailure,
    DisarmFailure,
    ArmLevelNeeded,
    NoAvailableApp,
    NoAvailableChannel,
    // authorization
    ChallengeNeeded,
    // generic fallback
    ActionNotAvailable,
}

/// Two-factor authentication challenge sub-types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, AsRefStr, Serialize)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum ChallengeType {
    PinNeeded,
    ChallengeFailedPinNeeded,
    AckNeeded,
}

#[derive(Debug, Display, PartialEq, Clone)]
pub enum ServiceError {
    /// Domain error with an explicit Google error code.
    #[display("{_0}: {_1}")]
    Google(ErrorCode, String),

    /// The hub answered with a non-success HTTP status.
    #[display("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[display("Connection error: {_0}")]
    Connection(String),

    #[display("Internal serialization error: {_0}")]
    SerializationError(String),

    #[display("BadRequest: {_0}")]
    BadRequest(String),

    #[display("Internal server error: {_0}")]
    InternalServerError(String),
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    /// Create an error for the given code with the code itself as message.
    pub fn code(code: ErrorCode) -> Self {
        ServiceError::Google(code, code.to_string())
    }

    /// Create an error for the given code with a diagnostic message.
    pub fn with_msg(code: ErrorCode, msg: impl Into<String>) -> Self {
        ServiceError::Google(code, msg.into())
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        ServiceError::Google(ErrorCode::NotSupported, msg.into())
    }

    /// Google error code reported for this error.
    ///
    /// Errors without an explicit code are mapped by HTTP status: 404 → `deviceNotFound`,
    /// 400 → `notSupported`, everything else → `deviceOffline`.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ServiceError::Google(code, _) => *code,
            ServiceError::Http { status: 404, .. } => ErrorCode::DeviceNotFound,
            ServiceError::Http { status: 400, .. } | ServiceError::BadRequest(_) => {
                ErrorCode::NotSupported
            }
            ServiceError::Http { .. }
            | ServiceError::Connection(_)
            | ServiceError::SerializationError(_)
            | ServiceError::InternalServerError(_) => ErrorCode::DeviceOffline,
        }
    }

    /// HTTP status code of a failed hub request.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ServiceError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        ServiceError::InternalServerError(format!("{:?}", e))
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        error!("{:?}", e);
        ServiceError::SerializationError(e.to_string())
    }
}

impl From<strum::ParseError> for ServiceError {
    fn from(e: strum::ParseError) -> Self {
        ServiceError::SerializationError(e.to_string())
    }
}

impl From<url::ParseError> for ServiceError {
    fn from(e: url::ParseError) -> Self {
        ServiceError::BadRequest(format!("Invalid item url: {e}"))
    }
}

impl From<awc::error::SendRequestError> for ServiceError {
    fn from(e: awc::error::SendRequestError) -> Self {
        ServiceError::Connection(e.to_string())
    }
}

impl From<awc::error::JsonPayloadError> for ServiceError {
    fn from(e: awc::error::JsonPayloadError) -> Self {
        ServiceError::SerializationError(e.to_string())
    }
}

impl From<awc::error::PayloadError> for ServiceError {
    fn from(e: awc::error::PayloadError) -> Self {
        ServiceError::Connection(e.to_string())
    }
}
