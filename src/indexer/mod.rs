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

//! Access to the chain indexer (toncenter v2 HTTP API).

/// Get-method stack items and decoding
pub mod stack;
pub use stack::{decode_number, decode_stack_string, decode_string, StackArg, StackItem};

/// HTTP transport abstraction
pub mod transport;
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, SurfTransport};

/// TTL response cache
pub mod cache;

/// Indexer reply types
pub mod types;
pub use types::{AddressInformation, GetMethodResult, InboundMessage, IndexerTransaction};

/// Rate-limited indexer client
pub mod client;
pub use client::{IndexerClient, IndexerSettings};
