// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! openHAB REST API client.
//!
//! The device and command logic only depends on the [`ItemApi`] trait: fetch an item including
//! its Google metadata and send a command to an item.

use crate::configuration::HubSettings;
use crate::errors::ServiceError;
use crate::startup::USER_AGENT;
use awc::http::header::{self, ACCEPT, CONTENT_TYPE};
use log::debug;
use url::Url;

#[cfg(test)]
pub(crate) mod mock;
pub mod model;

pub use model::{Item, attach_members};

/// Item fields requested for the item list. `state` and `members` are not required for SYNC.
const LIST_FIELDS: &str = "groupNames,groupType,name,label,metadata,type,tags,state";

/// Max payload size of the item list response.
const MAX_LIST_PAYLOAD: usize = 32 * 1024 * 1024;

/// Item operations required from the home-automation hub.
#[allow(async_fn_in_trait)]
pub trait ItemApi {
    /// Fetch a single item including its Google metadata and group members.
    async fn get_item(&self, name: &str) -> Result<Item, ServiceError>;

    /// Fetch all items including their Google metadata.
    ///
    /// The returned list is flat, group members are referenced by `groupNames` only.
    async fn get_items(&self) -> Result<Vec<Item>, ServiceError>;

    /// Send a command to an item. The value is the raw command string, e.g. `ON` or `42`.
    async fn send_command(&self, name: &str, value: &str) -> Result<(), ServiceError>;
}

/// openHAB REST client based on `awc`.
pub struct OpenhabClient {
    client: awc::Client,
    base_url: Url,
    metadata: String,
}

impl OpenhabClient {
    pub fn new(settings: &HubSettings) -> Self {
        let connector = awc::Connector::new().timeout(settings.connection_timeout);
        let mut builder = awc::ClientBuilder::new()
            .add_default_header((header::USER_AGENT, USER_AGENT))
            .timeout(settings.request_timeout)
            .connector(connector);

        if let Some(token) = settings.token.as_deref().filter(|t| !t.is_empty()) {
            builder = builder.bearer_auth(token);
        } else if let Some(username) = settings.username.as_deref() {
            builder = builder.basic_auth(username, settings.password.as_deref());
        }

        Self {
            client: builder.finish(),
            base_url: settings.url.clone(),
            metadata: settings.metadata.clone(),
        }
    }

    /// Build `{base}/rest/items[/{name}]?metadata=...`.
    fn items_url(&self, name: Option<&str>) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ServiceError::BadRequest(format!("Invalid hub url: {}", self.base_url))
            })?;
            segments.pop_if_empty().extend(["rest", "items"]);
            if let Some(name) = name {
                segments.push(name);
            }
        }
        url.query_pairs_mut()
            .append_pair("metadata", &self.metadata);
        Ok(url)
    }
}

impl ItemApi for OpenhabClient {
    async fn get_item(&self, name: &str) -> Result<Item, ServiceError> {
        let url = self.items_url(Some(name))?;
        debug!("[{name}] GET {url}");
        let mut response = self
            .client
            .get(url.as_str())
            .insert_header((ACCEPT, "application/json"))
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.body().await.unwrap_or_default();
            return Err(http_error(response.status().as_u16(), &body));
        }

        Ok(response.json::<Item>().limit(MAX_LIST_PAYLOAD).await?)
    }

    async fn get_items(&self) -> Result<Vec<Item>, ServiceError> {
        let mut url = self.items_url(None)?;
        url.query_pairs_mut().append_pair("fields", LIST_FIELDS);
        debug!("GET {url}");
        let mut response = self
            .client
            .get(url.as_str())
            .insert_header((ACCEPT, "application/json"))
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.body().await.unwrap_or_default();
            return Err(http_error(response.status().as_u16(), &body));
        }

        Ok(response
            .json::<Vec<Item>>()
            .limit(MAX_LIST_PAYLOAD)
            .await?)
    }

    async fn send_command(&self, name: &str, value: &str) -> Result<(), ServiceError> {
        let mut url = self.items_url(Some(name))?;
        url.set_query(None);
        debug!("[{name}] POST {url}: {value}");
        let mut response = self
            .client
            .post(url.as_str())
            .insert_header((CONTENT_TYPE, "text/plain"))
            .send_body(value.to_string())
            .await?;

        if !response.status().is_success() {
            let body = response.body().await.unwrap_or_default();
            return Err(http_error(response.status().as_u16(), &body));
        }
        Ok(())
    }
}

fn http_error(status: u16, body: &[u8]) -> ServiceError {
    let message = String::from_utf8_lossy(body).trim().to_string();
    ServiceError::Http {
        status,
        message: if message.is_empty() {
            format!("Request failed with status {status}")
        } else {
            message
        },
    }
}
