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

use std::{path::Path, time::Duration};

use serde::Deserialize;
use structopt::StructOpt;

use loyaltylayer::{
    indexer::{client::{MAINNET_ENDPOINT, TESTNET_ENDPOINT}, IndexerSettings},
    loyalty::{catalog::DEFAULT_CONTRACT_ADDRESS, ServiceSettings},
    util::path::spawn_config,
    Result,
};

pub const CONFIG_FILE: &str = "loyaltyctl.toml";
pub const CONFIG_FILE_CONTENTS: &str = include_str!("../loyaltyctl.toml");

/// loyaltyctl cli
#[derive(Clone, Debug, StructOpt)]
#[structopt(name = "loyaltyctl")]
pub struct Args {
    /// Sets a custom config file
    #[structopt(short, long)]
    pub config: Option<String>,

    /// Indexer API endpoint
    #[structopt(long)]
    pub endpoint: Option<String>,

    /// Indexer API key
    #[structopt(long)]
    pub api_key: Option<String>,

    /// Use the testnet endpoint
    #[structopt(long)]
    pub testnet: bool,

    /// Factory contract address
    #[structopt(long)]
    pub factory: Option<String>,

    /// Serve demo businesses when the listing is empty
    #[structopt(long)]
    pub fallback: bool,

    /// Sets Datastore Path
    #[structopt(long)]
    pub datastore: Option<String>,

    /// Wallet address used for customer operations
    #[structopt(short, long)]
    pub wallet: Option<String>,

    /// Print transaction requests without recording them locally
    #[structopt(long)]
    pub dry_run: bool,

    /// Increase verbosity (-vvv supported)
    #[structopt(short, parse(from_occurrences))]
    pub verbose: u8,

    #[structopt(short, long)]
    /// Set log file to output into
    pub log: Option<String>,

    #[structopt(subcommand)]
    pub command: Subcmd,
}

#[derive(Clone, Debug, StructOpt)]
pub enum Subcmd {
    /// Build a loyalty:// link for a business
    Link {
        name: String,
        contract: String,
        #[structopt(default_value = "general")]
        category: String,
    },

    /// Join a business from a link or name
    Join { link: String },

    /// Print the bare join request for a contract
    JoinPayload { contract: String },

    /// Register with a joined business
    Register { business: String },

    /// Register a new business with the factory contract
    RegisterBusiness {
        name: String,
        description: String,
        #[structopt(default_value = "general")]
        category: String,
    },

    /// Daily check-in
    CheckIn { business: String },

    /// Pay an amount in TON
    Pay { business: String, amount: String },

    /// Buy a catalog action
    Purchase { business: String, action: String },

    /// Tip a staff member an amount in TON
    Tip { business: String, staff: String, amount: String },

    /// Redeem a reward
    Redeem { business: String, reward: String },

    /// Reconcile a local record with the chain
    Sync { business: String },

    /// Show the on-chain standing of the wallet with a contract
    Snapshot { contract: String },

    /// Show the preset tip amounts
    Tips,

    /// Show balance and state of a contract
    Contract { address: String },

    /// Read business metadata from its contract
    Metadata { address: String },

    /// List registered businesses
    Businesses,

    /// List the businesses joined by the wallet
    Customers,
}

/// Settings read from the config file
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub testnet: bool,
    pub min_request_interval_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub cache_ttl_secs: u64,
    pub factory_address: Option<String>,
    pub fallback_contract: String,
    pub fallback_enabled: bool,
    pub merge_policy: String,
    pub tx_limit: u32,
    pub datastore: String,
    pub wallet: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            testnet: false,
            min_request_interval_ms: 2000,
            max_retries: 3,
            retry_backoff_ms: 2000,
            cache_ttl_secs: 60,
            factory_address: None,
            fallback_contract: DEFAULT_CONTRACT_ADDRESS.to_string(),
            fallback_enabled: false,
            merge_policy: "keep-max".to_string(),
            tx_limit: 15,
            datastore: "~/.local/share/loyaltylayer/db".to_string(),
            wallet: None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load the config file, writing the bundled template first if it
    /// does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        spawn_config(path, CONFIG_FILE_CONTENTS.as_bytes())?;
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Apply command-line overrides.
    pub fn merge_args(mut self, args: &Args) -> Self {
        if let Some(endpoint) = &args.endpoint {
            self.endpoint = Some(endpoint.clone());
        }
        if let Some(api_key) = &args.api_key {
            self.api_key = Some(api_key.clone());
        }
        if let Some(factory) = &args.factory {
            self.factory_address = Some(factory.clone());
        }
        if let Some(datastore) = &args.datastore {
            self.datastore = datastore.clone();
        }
        if let Some(wallet) = &args.wallet {
            self.wallet = Some(wallet.clone());
        }
        self.testnet |= args.testnet;
        self.fallback_enabled |= args.fallback;

        self.endpoint = non_empty(self.endpoint);
        self.api_key = non_empty(self.api_key);
        self.factory_address = non_empty(self.factory_address);
        self.wallet = non_empty(self.wallet);
        self
    }

    pub fn indexer_settings(&self) -> IndexerSettings {
        let default_endpoint = if self.testnet { TESTNET_ENDPOINT } else { MAINNET_ENDPOINT };
        IndexerSettings {
            endpoint: self.endpoint.clone().unwrap_or_else(|| default_endpoint.to_string()),
            api_key: self.api_key.clone(),
            min_request_interval: Duration::from_millis(self.min_request_interval_ms),
            max_retries: self.max_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
        }
    }

    pub fn service_settings(&self) -> Result<ServiceSettings> {
        Ok(ServiceSettings {
            factory_address: self.factory_address.clone(),
            fallback_contract: self.fallback_contract.clone(),
            fallback_enabled: self.fallback_enabled,
            merge_policy: self.merge_policy.parse()?,
            tx_limit: self.tx_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_template_parses() {
        let config: Config = toml::from_str(CONFIG_FILE_CONTENTS).unwrap();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.tx_limit, 15);
        assert_eq!(config.indexer_settings().endpoint, MAINNET_ENDPOINT);
        assert!(config.service_settings().is_ok());
    }

    #[test]
    fn args_override_file() {
        let config: Config = toml::from_str(
            r#"
            testnet = true
            merge_policy = "trust-chain"
            factory_address = ""
            wallet = "EQfile"
            "#,
        )
        .unwrap();

        let args = Args::from_iter(&["loyaltyctl", "--wallet", "EQcli", "--fallback", "businesses"]);
        let config = config.merge_args(&args);

        assert_eq!(config.wallet.as_deref(), Some("EQcli"));
        assert_eq!(config.factory_address, None);
        assert!(config.fallback_enabled);
        assert_eq!(config.indexer_settings().endpoint, TESTNET_ENDPOINT);

        let settings = config.service_settings().unwrap();
        assert_eq!(settings.merge_policy, loyaltylayer::loyalty::MergePolicy::TrustChain);
    }
}
