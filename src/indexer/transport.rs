/* This file is part of DarkFi (https://dark.fi)
 *
 * Copyright (C) 2020-2026 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use async_trait::async_trait;
use log::error;
use url::Url;

use crate::{Error, Result};

/// HTTP verbs used against the indexer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An outbound indexer request
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    /// JSON body for `POST` requests
    pub body: Option<String>,
    /// Sent as the `X-API-Key` header when set
    pub api_key: Option<String>,
}

/// Status code and body text of a completed request
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport used by [`super::client::IndexerClient`]. Implementations
/// return any HTTP status as a response, and only fail on connection or
/// body read errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// [`HttpTransport`] backed by a `surf` client.
pub struct SurfTransport {
    client: surf::Client,
}

impl SurfTransport {
    pub fn new() -> Self {
        Self { client: surf::Client::new() }
    }
}

impl Default for SurfTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for SurfTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(request.url.as_str()),
            HttpMethod::Post => self
                .client
                .post(request.url.as_str())
                .header("Content-Type", "application/json")
                .body(request.body.unwrap_or_default()),
        };

        if let Some(key) = &request.api_key {
            builder = builder.header("X-API-Key", key.as_str());
        }

        let mut rep = match builder.send().await {
            Ok(v) => v,
            Err(e) => {
                let e = format!("Failed sending indexer request to {}: {}", request.url, e);
                error!(target: "indexer::transport::send", "{}", e);
                return Err(Error::NetworkError(e))
            }
        };

        let status = u16::from(rep.status());
        let body = match rep.body_string().await {
            Ok(v) => v,
            Err(e) => {
                let e = format!("Failed reading indexer response body: {}", e);
                error!(target: "indexer::transport::send", "{}", e);
                return Err(Error::NetworkError(e))
            }
        };

        Ok(HttpResponse { status, body })
    }
}
