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

//! Rate-limited client for the toncenter v2 HTTP API.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use log::{debug, error, info, warn};
use smol::lock::Mutex;
use url::Url;

use super::{
    cache::ResponseCache,
    stack::StackArg,
    transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, SurfTransport},
    types::{AddressInformation, GetMethodResult, IndexerTransaction},
};
use crate::{
    cell::parse_address,
    util::{
        async_util::sleep_for,
        json::{json_field, json_field_str, json_map, json_parse, json_str, JsonArray, JsonValue},
    },
    Error, Result,
};

/// Public mainnet endpoint
pub const MAINNET_ENDPOINT: &str = "https://toncenter.com/api/v2/";

/// Public testnet endpoint
pub const TESTNET_ENDPOINT: &str = "https://testnet.toncenter.com/api/v2/";

/// TVM exit code reported for an unknown get-method id
const EXIT_CODE_METHOD_NOT_FOUND: i64 = 11;

/// Tunables of an [`IndexerClient`]
#[derive(Clone, Debug)]
pub struct IndexerSettings {
    /// API base URL, with a trailing slash
    pub endpoint: String,
    /// Optional `X-API-Key`
    pub api_key: Option<String>,
    /// Minimal delay between two outbound requests
    pub min_request_interval: Duration,
    /// Number of retries after an HTTP 429
    pub max_retries: u32,
    /// Retry `n` sleeps `n * retry_backoff`
    pub retry_backoff: Duration,
    /// Time-to-live of cached transaction and account replies
    pub cache_ttl: Duration,
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self {
            endpoint: MAINNET_ENDPOINT.to_string(),
            api_key: None,
            min_request_interval: Duration::from_millis(2000),
            max_retries: 3,
            retry_backoff: Duration::from_millis(2000),
            cache_ttl: Duration::from_secs(60),
        }
    }
}

/// Client for the chain indexer.
///
/// Requests made through one instance are spaced by at least
/// `min_request_interval`, including retries. Transaction and account
/// replies are cached for `cache_ttl`.
pub struct IndexerClient {
    settings: IndexerSettings,
    endpoint: Url,
    transport: Arc<dyn HttpTransport>,
    last_call: Mutex<Option<Instant>>,
    cache: Mutex<ResponseCache<JsonValue>>,
}

impl IndexerClient {
    pub fn new(settings: IndexerSettings, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        let mut endpoint = settings.endpoint.clone();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        let endpoint = Url::parse(&endpoint)?;

        let cache = Mutex::new(ResponseCache::new(settings.cache_ttl));
        Ok(Self { settings, endpoint, transport, last_call: Mutex::new(None), cache })
    }

    /// Create a client using the `surf` HTTP transport.
    pub fn with_surf(settings: IndexerSettings) -> Result<Self> {
        Self::new(settings, Arc::new(SurfTransport::new()))
    }

    pub fn settings(&self) -> &IndexerSettings {
        &self.settings
    }

    /// Send `request` once `min_request_interval` has elapsed since the
    /// previous request completed. The spacing lock is held across the
    /// send, so concurrent callers are serialized too.
    async fn send_spaced(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut last_call = self.last_call.lock().await;

        if let Some(last) = *last_call {
            let elapsed = last.elapsed();
            if elapsed < self.settings.min_request_interval {
                let wait = self.settings.min_request_interval - elapsed;
                debug!(target: "indexer::client::send_spaced", "Waiting {:?} before next request", wait);
                sleep_for(wait).await;
            }
        }

        debug!(target: "indexer::client::send_spaced", "--> {:?} {}", request.method, request.url);
        let rep = self.transport.send(request.clone()).await;
        *last_call = Some(Instant::now());
        rep
    }

    /// Send one request, retrying on HTTP 429, and unwrap the
    /// `{ok, result, error}` envelope.
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(&str, &str)],
        body: Option<JsonValue>,
    ) -> Result<JsonValue> {
        let mut url = self.endpoint.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let body = match body {
            Some(b) => Some(b.stringify()?),
            None => None,
        };

        let request = HttpRequest { method, url, body, api_key: self.settings.api_key.clone() };

        let mut retries = 0;
        loop {
            let rep = self.send_spaced(&request).await?;

            if rep.status == 429 {
                if retries >= self.settings.max_retries {
                    error!(
                        target: "indexer::client::request",
                        "Rate limit persisted after {} retries for {}", retries, path,
                    );
                    return Err(Error::RateLimited)
                }

                retries += 1;
                let backoff = self.settings.retry_backoff * retries;
                warn!(
                    target: "indexer::client::request",
                    "Rate limit hit, retrying in {:?} ({}/{})", backoff, retries, self.settings.max_retries,
                );
                sleep_for(backoff).await;
                continue
            }

            if !rep.is_success() {
                error!(target: "indexer::client::request", "HTTP error {} for {}", rep.status, path);
                return Err(Error::HttpStatus(rep.status))
            }

            return parse_envelope(&rep.body)
        }
    }

    /// Call a get-method on a contract.
    pub async fn run_get_method(
        &self,
        address: &str,
        method: &str,
        args: &[StackArg],
    ) -> Result<GetMethodResult> {
        let address = address.trim();
        parse_address(address)?;

        info!(target: "indexer::client::run_get_method", "Calling {} on {}", method, address);

        let stack = JsonArray(args.iter().map(JsonValue::try_from).collect::<Result<Vec<_>>>()?);
        let body =
            json_map([("address", json_str(address)), ("method", json_str(method)), ("stack", stack)]);

        let result = match self.request(HttpMethod::Post, "runGetMethod", &[], Some(body)).await {
            Ok(v) => v,
            Err(Error::IndexerError(e)) if e.contains("method not found") => {
                return Err(Error::GetMethodNotFound(method.to_string()))
            }
            Err(e) => return Err(e),
        };

        let result = GetMethodResult::try_from(&result)?;
        match result.exit_code {
            0 | 1 => Ok(result),
            EXIT_CODE_METHOD_NOT_FOUND => Err(Error::GetMethodNotFound(method.to_string())),
            code => Err(Error::IndexerError(format!("{} exited with code {}", method, code))),
        }
    }

    /// Call several get-methods one after another. Every method gets its
    /// own result and a failure does not stop the remaining calls.
    pub async fn run_get_methods_sequentially(
        &self,
        address: &str,
        methods: &[&str],
    ) -> Vec<Result<GetMethodResult>> {
        let mut results = Vec::with_capacity(methods.len());
        for method in methods {
            let res = self.run_get_method(address, method, &[]).await;
            if let Err(e) = &res {
                warn!(target: "indexer::client::run_get_methods_sequentially", "{} failed: {}", method, e);
            }
            results.push(res);
        }
        results
    }

    /// Fetch the latest transactions of an account, newest first.
    pub async fn get_transactions(&self, address: &str, limit: u32) -> Result<Vec<IndexerTransaction>> {
        let address = address.trim();
        parse_address(address)?;

        let query = format!("tx_{}", limit);
        let limit = limit.to_string();
        let params = [("address", address), ("limit", limit.as_str())];
        let result = self.cached(address, &query, "getTransactions", &params).await?;

        match &result {
            JsonArray(txs) => Ok(txs.iter().map(IndexerTransaction::from).collect()),
            _ => Err(Error::UnexpectedIndexerReply("getTransactions result is not an array".to_string())),
        }
    }

    /// Fetch balance and state of an account.
    pub async fn get_address_information(&self, address: &str) -> Result<AddressInformation> {
        let address = address.trim();
        parse_address(address)?;

        let result =
            self.cached(address, "contract", "getAddressInformation", &[("address", address)]).await?;

        if !result.is_object() {
            return Err(Error::UnexpectedIndexerReply(
                "getAddressInformation result is not an object".to_string(),
            ))
        }

        Ok(AddressInformation::from(&result))
    }

    async fn cached(
        &self,
        address: &str,
        query: &str,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<JsonValue> {
        if let Some(v) = self.cache.lock().await.get(address, query) {
            return Ok(v)
        }

        let result = self.request(HttpMethod::Get, path, params, None).await?;
        self.cache.lock().await.insert(address, query, result.clone());
        Ok(result)
    }

    /// Drop all cached replies and forget the last request time.
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
        *self.last_call.lock().await = None;
        debug!(target: "indexer::client::clear_cache", "Cache cleared");
    }
}

/// Unwrap a toncenter `{ok, result, error}` reply.
fn parse_envelope(body: &str) -> Result<JsonValue> {
    let rep = match json_parse(body) {
        Ok(v) => v,
        Err(e) => {
            let snippet: String = body.chars().take(64).collect();
            let e = format!("Non-JSON indexer response ({}): {}", e, snippet);
            error!(target: "indexer::client::parse_envelope", "{}", e);
            return Err(Error::IndexerError(e))
        }
    };

    if let Some(JsonValue::Boolean(false)) = json_field(&rep, "ok") {
        let msg = json_field_str(&rep, "error").unwrap_or("Unknown error from TON Center");
        return Err(Error::IndexerError(msg.to_string()))
    }

    match json_field(&rep, "result") {
        Some(v) => Ok(v.clone()),
        None => Err(Error::UnexpectedIndexerReply("reply has no result field".to_string())),
    }
}
