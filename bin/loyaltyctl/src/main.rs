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

use std::sync::Arc;

use log::{error, info};
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use sled_overlay::sled;
use structopt::StructOpt;

use loyaltylayer::{
    indexer::IndexerClient,
    loyalty::{
        catalog::TIP_PRESETS,
        deeplink::{business_link, business_share_url},
        Business, CustomerRecord, LoyaltyService,
    },
    store::LocalStore,
    util::{
        json::JsonValue,
        parse::{from_nano, to_nano},
        path::{expand_path, get_config_path},
    },
    Error, Result,
};

mod config;
mod wallet;

use crate::{
    config::{Args, Config, Subcmd, CONFIG_FILE},
    wallet::PrintWallet,
};

fn get_log_level(verbosity_level: u8) -> LevelFilter {
    match verbosity_level {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn init_logger(args: &Args) -> Result<()> {
    let log_level = get_log_level(args.verbose);
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![];
    loggers.push(TermLogger::new(
        log_level,
        log_config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ));

    if let Some(log_path) = &args.log {
        let log_file = std::fs::File::create(expand_path(log_path)?)?;
        loggers.push(WriteLogger::new(LevelFilter::Debug, log_config, log_file));
    }

    CombinedLogger::init(loggers)?;
    Ok(())
}

fn print_json(value: &JsonValue) -> Result<()> {
    println!("{}", value.format()?);
    Ok(())
}

fn print_record(record: &CustomerRecord) -> Result<()> {
    print_json(&JsonValue::from(record))
}

fn print_business(business: &Business) {
    println!("{} [{}]", business.name, business.id);
    println!("  {}", business.description);
    println!("  category: {}  contract: {}", business.category, business.contract_address);
    println!("  share: {}", business_share_url(&business.id));
}

async fn realmain(args: Args, config: Config) -> Result<()> {
    let db = sled::open(expand_path(&config.datastore)?)?;
    let store = LocalStore::new(&db)?;
    let indexer = Arc::new(IndexerClient::with_surf(config.indexer_settings())?);
    let wallet = Arc::new(PrintWallet::new(config.wallet.clone(), args.dry_run));
    let service = LoyaltyService::new(indexer, store, wallet, config.service_settings()?);

    match args.command {
        Subcmd::Link { name, contract, category } => {
            println!("{}", business_link(&name, &contract, &category));
        }

        Subcmd::Join { link } => {
            let (business, record) = service.join(&link)?;
            print_business(&business);
            print_record(&record)?;
        }

        Subcmd::JoinPayload { contract } => {
            print_json(&JsonValue::try_from(&service.join_payload(&contract)?)?)?;
        }

        Subcmd::Register { business } => print_record(&service.register(&business).await?)?,

        Subcmd::RegisterBusiness { name, description, category } => {
            service.register_business(&name, &description, &category).await?;
            println!("Registration request for {} sent", name);
        }

        Subcmd::CheckIn { business } => print_record(&service.check_in(&business).await?)?,

        Subcmd::Pay { business, amount } => {
            print_record(&service.pay(&business, to_nano(&amount)?).await?)?
        }

        Subcmd::Purchase { business, action } => {
            print_record(&service.purchase(&business, &action).await?)?
        }

        Subcmd::Tip { business, staff, amount } => {
            print_record(&service.tip(&business, &staff, to_nano(&amount)?).await?)?
        }

        Subcmd::Redeem { business, reward } => {
            print_record(&service.redeem(&business, &reward).await?)?
        }

        Subcmd::Sync { business } => {
            let report = service.sync(&business).await?;
            if let Some(div) = report.outcome.divergence {
                println!("Chain reports {} points, keeping local {}", div.chain, div.local);
            }
            if !report.outcome.changed {
                println!("Already in sync");
            }
            print_record(&report.record)?;
        }

        Subcmd::Snapshot { contract } => {
            let Some(wallet) = &config.wallet else { return Err(Error::WalletNotConnected) };
            let snapshot = service.snapshot(wallet, &contract).await?;
            println!("Registered:   {}", snapshot.is_registered);
            println!("Visits:       {}", snapshot.total_visits);
            println!("Points:       {}", snapshot.points);
            match snapshot.last_activity {
                Some(ts) => println!("Last active:  {}", ts),
                None => println!("Last active:  never"),
            }
        }

        Subcmd::Tips => {
            for (ton, label) in TIP_PRESETS {
                println!("{:>3} TON  {}", ton, label);
            }
        }

        Subcmd::Contract { address } => {
            let info = service.contract_info(&address).await?;
            println!("State:    {}", info.state);
            println!("Balance:  {} TON", from_nano(info.balance));
            if let Some(lt) = info.last_transaction_lt {
                println!("Last tx:  lt {}", lt);
            }
        }

        Subcmd::Metadata { address } => {
            let meta = service.business_metadata(&address).await?;
            println!("Name:        {}", meta.name);
            println!("Description: {}", meta.description);
            println!("Category:    {}", meta.category);
        }

        Subcmd::Businesses => {
            for business in service.list_businesses().await? {
                print_business(&business);
            }
        }

        Subcmd::Customers => {
            let Some(wallet) = &config.wallet else { return Err(Error::WalletNotConnected) };
            for (business, record) in service.store().joined_businesses(wallet)? {
                println!(
                    "{} [{}]: {} points, {} visits, {} tier, spent {} TON",
                    business.name,
                    business.id,
                    record.points,
                    record.total_visits,
                    record.tier,
                    from_nano(record.total_spent),
                );
            }
        }
    }

    db.flush_async().await?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::from_args();
    init_logger(&args)?;

    let config_path = get_config_path(args.config.clone(), CONFIG_FILE)?;
    let config = Config::load(&config_path)?.merge_args(&args);
    info!(target: "loyaltyctl", "Using config {:?}", config_path);

    match smol::block_on(realmain(args, config)) {
        Ok(()) => Ok(()),
        Err(e) => {
            if !e.is_user_error() {
                error!(target: "loyaltyctl", "{}", e);
            }
            eprintln!("{}", e.status_message());
            Err(e)
        }
    }
}
