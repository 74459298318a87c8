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

//! Business deep links.
//!
//! Three inputs are understood:
//! * `loyalty://business/<name>/<contract>[/<category>]`
//! * `https://<host>/business/<name>[/<category>]`
//! * any other non-empty text, taken as the business name

use log::debug;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use super::{
    catalog::{business_from_template, DEFAULT_BUSINESS_NAME, LINK_DESCRIPTION},
    model::Business,
};
use crate::{Error, Result};

/// Scheme and path prefix of native links
pub const LINK_PREFIX: &str = "loyalty://business/";

/// Host used for shareable web links
pub const SHARE_HOST: &str = "loyalty.ton";

/// Category used when a link names none
pub const DEFAULT_CATEGORY: &str = "general";

/// Characters left unescaped in a link segment, as `encodeURIComponent` does
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// The business a link points to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusinessLink {
    pub name: String,
    pub contract_address: String,
    pub category: String,
}

impl BusinessLink {
    /// Turn the link into a business with a fresh id and the category
    /// template. `millis` is the current unix time in milliseconds.
    pub fn into_business(self, millis: u128) -> Business {
        let id = business_id(&self.name, millis);
        let name = display_name(&self.name);
        business_from_template(&id, &name, LINK_DESCRIPTION, &self.category, &self.contract_address)
    }
}

fn decode_segment(segment: &str) -> String {
    match percent_decode_str(segment).decode_utf8() {
        Ok(s) => s.into_owned(),
        Err(e) => {
            debug!(target: "loyalty::deeplink::decode_segment", "Keeping raw segment: {}", e);
            segment.to_string()
        }
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

/// Parse a deep link, web link or plain business name.
pub fn parse_link(input: &str, fallback_contract: &str) -> Result<BusinessLink> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::InvalidDeepLink("empty link".to_string()))
    }

    if let Some(rest) = input.strip_prefix(LINK_PREFIX) {
        let mut parts = rest.split('/');
        let name = parts.next().map(decode_segment);
        let contract = parts.next().map(str::to_string);
        let category = parts.next().map(decode_segment);

        return Ok(BusinessLink {
            name: non_empty_or(name, DEFAULT_BUSINESS_NAME),
            contract_address: non_empty_or(contract, fallback_contract),
            category: non_empty_or(category, DEFAULT_CATEGORY),
        })
    }

    if let Some(link) = parse_web_link(input, fallback_contract) {
        return Ok(link)
    }

    Ok(BusinessLink {
        name: input.to_string(),
        contract_address: fallback_contract.to_string(),
        category: DEFAULT_CATEGORY.to_string(),
    })
}

fn parse_web_link(input: &str, fallback_contract: &str) -> Option<BusinessLink> {
    let url = Url::parse(input).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None
    }

    let mut segments = url.path_segments()?.skip_while(|s| *s != "business");
    segments.next()?;
    let name = segments.next().filter(|s| !s.is_empty())?;
    let category = segments.next().map(decode_segment);

    Some(BusinessLink {
        name: decode_segment(name),
        contract_address: fallback_contract.to_string(),
        category: non_empty_or(category, DEFAULT_CATEGORY),
    })
}

/// Slug a business name into an id: lowercase, whitespace runs become
/// `-`, anything outside `[a-z0-9-]` is dropped, then `-<millis>`.
pub fn business_id(name: &str, millis: u128) -> String {
    let lower = name.to_lowercase();
    let slug: String = lower
        .split_whitespace()
        .map(|w| w.chars().filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        .map(String::from_iter)
        .collect::<Vec<_>>()
        .join("-");
    format!("{}-{}", slug, millis)
}

/// Build a native `loyalty://` link.
pub fn business_link(name: &str, contract_address: &str, category: &str) -> String {
    format!(
        "{}{}/{}/{}",
        LINK_PREFIX,
        utf8_percent_encode(name, SEGMENT),
        contract_address.trim(),
        utf8_percent_encode(category, SEGMENT)
    )
}

/// Build the shareable web link of a business id.
pub fn business_share_url(business_id: &str) -> String {
    format!("https://{}/business/{}", SHARE_HOST, utf8_percent_encode(business_id, SEGMENT))
}

/// Remove a trailing `-<digits>` group.
fn strip_number_suffix(s: &str) -> &str {
    match s.rsplit_once('-') {
        Some((head, tail)) if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) => head,
        _ => s,
    }
}

/// Remove a trailing `-<digits>-<alphanumeric>` group.
fn strip_number_tag_suffix(s: &str) -> &str {
    let Some((head, tag)) = s.rsplit_once('-') else { return s };
    if tag.is_empty() || !tag.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return s
    }
    match strip_number_suffix(head) {
        stripped if stripped.len() < head.len() => stripped,
        _ => s,
    }
}

/// Remove the first `business-`, ignoring case.
fn remove_business_marker(s: &str) -> String {
    match s.to_ascii_lowercase().find("business-") {
        Some(pos) => format!("{}{}", &s[..pos], &s[pos + "business-".len()..]),
        None => s.to_string(),
    }
}

/// Display name for a name taken from a link: drops id decorations.
pub fn display_name(name: &str) -> String {
    let name = strip_number_suffix(name);
    let name = remove_business_marker(name);
    strip_number_tag_suffix(&name).to_string()
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn format_word(word: &str) -> String {
    match word {
        "cafe" => "Café".to_string(),
        "ccd" => "CCD".to_string(),
        "ton" => "TON".to_string(),
        _ => title_case(word),
    }
}

/// Recover a human readable name from a business id or share link.
pub fn format_business_name(business_id: &str) -> String {
    let marker = format!("{}/business/", SHARE_HOST);
    if let Some(pos) = business_id.find(&marker) {
        let rest = &business_id[pos + marker.len()..];
        let part = decode_segment(rest.split('/').next().unwrap_or_default());
        let name = display_name(&part);
        let formatted: Vec<String> = name.split('-').map(title_case).collect();
        return formatted.join(" ")
    }

    let mut clean = business_id.strip_prefix("business-").unwrap_or(business_id);
    clean = strip_number_suffix(clean);
    clean = strip_number_tag_suffix(clean);
    for prefix in ["demo-", "test-", "ccd-"] {
        clean = clean.strip_prefix(prefix).unwrap_or(clean);
    }

    if clean.is_empty() || clean == "-" {
        return DEFAULT_BUSINESS_NAME.to_string()
    }

    let clean = decode_segment(clean);
    let formatted: Vec<String> =
        clean.split('-').filter(|p| !p.is_empty()).map(format_word).collect();

    if formatted.is_empty() {
        return DEFAULT_BUSINESS_NAME.to_string()
    }
    formatted.join(" ")
}
