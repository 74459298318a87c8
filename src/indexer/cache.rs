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

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use log::debug;

/// Cache key: the account address and the query it was fetched for
pub type CacheKey = (String, String);

/// In-memory response cache with a fixed time-to-live.
///
/// Entries older than the TTL are treated as absent and evicted lazily.
#[derive(Debug)]
pub struct ResponseCache<T> {
    ttl: Duration,
    entries: HashMap<CacheKey, (Instant, T)>,
}

impl<T: Clone> ResponseCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: HashMap::new() }
    }

    /// Fetch a fresh entry, evicting it if it has expired.
    pub fn get(&mut self, address: &str, query: &str) -> Option<T> {
        self.get_at(address, query, Instant::now())
    }

    fn get_at(&mut self, address: &str, query: &str, now: Instant) -> Option<T> {
        let key = (address.to_string(), query.to_string());
        let (inserted, value) = self.entries.get(&key)?;

        if now.duration_since(*inserted) < self.ttl {
            debug!(target: "indexer::cache::get", "Cache hit for {}/{}", address, query);
            return Some(value.clone())
        }

        self.entries.remove(&key);
        None
    }

    pub fn insert(&mut self, address: &str, query: &str, value: T) {
        self.insert_at(address, query, value, Instant::now())
    }

    fn insert_at(&mut self, address: &str, query: &str, value: T, now: Instant) {
        self.entries.insert((address.to_string(), query.to_string()), (now, value));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_expiry() {
        let mut cache = ResponseCache::new(Duration::from_secs(60));
        let t0 = Instant::now();

        cache.insert_at("EQa", "tx_10", 1u32, t0);
        assert_eq!(cache.get_at("EQa", "tx_10", t0 + Duration::from_secs(59)), Some(1));
        assert_eq!(cache.get_at("EQa", "tx_20", t0), None);
        assert_eq!(cache.get_at("EQb", "tx_10", t0), None);

        assert_eq!(cache.get_at("EQa", "tx_10", t0 + Duration::from_secs(60)), None);
        assert!(cache.is_empty());

        cache.insert("EQa", "info", 2);
        assert_eq!(cache.get("EQa", "info"), Some(2));
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
