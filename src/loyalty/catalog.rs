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

//! Built-in category templates and demo data.

use super::model::{Action, Business, Reward};
use crate::util::parse::NANO_PER_TON;

/// Contract used when a link or stored business carries none
pub const DEFAULT_CONTRACT_ADDRESS: &str = "EQBWArzgGY3kDWzaq_kW-pcKUI4B4sZWuosyLQdc3LXlYZPv";

/// Description given to businesses joined through a link
pub const LINK_DESCRIPTION: &str = "Join our loyalty program and earn rewards!";

/// Description given to businesses with missing metadata
pub const DEFAULT_DESCRIPTION: &str = "Loyalty Program";

/// Name given when nothing better can be derived
pub const DEFAULT_BUSINESS_NAME: &str = "Business Loyalty";

/// Preset tip amounts in whole TON, with their labels
pub const TIP_PRESETS: [(u64, &str); 4] =
    [(1, "Thanks! 🎉"), (5, "Great Service! ⭐"), (10, "Excellent! 🌟"), (20, "Outstanding! 💫")];

fn reward(id: &str, name: &str, points: u64, description: &str) -> Reward {
    Reward {
        id: id.to_string(),
        name: name.to_string(),
        points,
        description: description.to_string(),
    }
}

/// Catalog actions cost their point value in whole TON.
fn action(id: &str, name: &str, ton: u64) -> Action {
    Action { id: id.to_string(), name: name.to_string(), amount: ton * NANO_PER_TON, points: ton }
}

/// Rewards and purchase actions for a business category. Matching is
/// case-insensitive; unknown categories get the general template.
pub fn template_for(category: &str) -> (Vec<Reward>, Vec<Action>) {
    match category.trim().to_lowercase().as_str() {
        "cafe" => (
            vec![
                reward("free-coffee", "Free Coffee", 50, "Any medium coffee"),
                reward("pastry", "Free Pastry", 75, "Any pastry from display"),
                reward("breakfast-combo", "Breakfast Combo", 150, "Coffee + Sandwich"),
            ],
            vec![
                action("coffee-purchase", "Coffee Purchase", 5),
                action("breakfast-purchase", "Breakfast Purchase", 15),
            ],
        ),

        "restaurant" => (
            vec![
                reward("free-appetizer", "Free Appetizer", 100, "Complimentary starter"),
                reward("dessert", "Free Dessert", 150, "Any dessert from menu"),
                reward("main-course", "Free Main Course", 300, "One main course item"),
            ],
            vec![action("lunch", "Lunch", 20), action("dinner", "Dinner", 50)],
        ),

        "retail" => (
            vec![
                reward("discount-10", "10% Discount", 100, "10% off your next purchase"),
                reward("free-gift", "Free Gift", 250, "Complimentary gift item"),
                reward("premium-item", "Premium Item", 400, "Upgrade to premium item"),
            ],
            vec![
                action("small-shop", "Small Purchase", 10),
                action("medium-shop", "Medium Purchase", 30),
            ],
        ),

        _ => (
            vec![
                reward("welcome-bonus", "Welcome Bonus", 100, "Welcome to our loyalty program!"),
                reward("free-item", "Free Item", 200, "Redeem for a free item"),
                reward("discount-10", "10% Discount", 300, "Get 10% off your next purchase"),
                reward("vip-treatment", "VIP Treatment", 500, "Exclusive VIP benefits"),
            ],
            vec![
                action("small-purchase", "Small Purchase", 5),
                action("medium-purchase", "Medium Purchase", 15),
                action("large-purchase", "Large Purchase", 25),
            ],
        ),
    }
}

/// Build a business from its metadata, filling rewards and actions from
/// the category template.
pub fn business_from_template(
    id: &str,
    name: &str,
    description: &str,
    category: &str,
    contract_address: &str,
) -> Business {
    let (rewards, actions) = template_for(category);
    Business {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        contract_address: contract_address.to_string(),
        rewards,
        actions,
    }
}

/// Demo businesses shown when the factory listing is unavailable.
pub fn demo_businesses(contract_address: &str) -> Vec<Business> {
    [
        (
            "ton-coffee-1",
            "Ton Coffee House",
            "Specialty coffee with TON blockchain rewards",
            "Food & Beverage",
        ),
        (
            "crypto-tech-1",
            "Crypto Tech Store",
            "Latest gadgets accepting cryptocurrency payments",
            "Electronics",
        ),
        ("blockchain-books-1", "Blockchain Bookshop", "Books on crypto and blockchain technology", "Retail"),
        (
            "defi-restaurant-1",
            "DeFi Restaurant",
            "Fine dining with decentralized finance themes",
            "Food & Beverage",
        ),
        ("nft-gallery-1", "NFT Art Gallery", "Digital art exhibitions and NFT displays", "Arts & Entertainment"),
    ]
    .iter()
    .map(|(id, name, desc, cat)| business_from_template(id, name, desc, cat, contract_address))
    .collect()
}
