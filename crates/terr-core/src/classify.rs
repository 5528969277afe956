//! Domain constants and pure classifier functions (C1).
//!
//! Nothing here can fail: every function is total over its input type. Ambiguous or
//! missing data resolves to a documented default (SMB tier, unknown region) rather than
//! an `Option`-threading error path: these are display/lookup fallbacks, not solve
//! inputs that need validation.

use crate::{Account, TeamTier};
use std::collections::HashMap;

/// First positive value of `(arr_primary, arr_fallback, arr_legacy)`, else 0 (§4.1).
pub fn effective_arr(account: &Account) -> f64 {
    [account.arr_primary, account.arr_fallback, account.arr_legacy]
        .into_iter()
        .flatten()
        .find(|v| *v > 0.0)
        .unwrap_or(0.0)
}

/// `arr_primary > 0`, deliberately ignoring the fallback chain (§4.1).
pub fn is_customer(account: &Account) -> bool {
    account.arr_primary.map(|v| v > 0.0).unwrap_or(false)
}

/// SMB for null/≤99 employees, Growth ≤499, MM ≤1499, else ENT (§4.1).
///
/// Null resolves to SMB for display purposes only; scoring treats a null tier as
/// "unknown" rather than SMB (see `terr_algo`'s team-alignment scorer, §4.3.3).
pub fn classify_team_tier(employees: Option<u64>) -> TeamTier {
    match employees {
        None => TeamTier::Smb,
        Some(n) if n <= 99 => TeamTier::Smb,
        Some(n) if n <= 499 => TeamTier::Growth,
        Some(n) if n <= 1499 => TeamTier::Mm,
        Some(_) => TeamTier::Ent,
    }
}

fn normalize_territory_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Known spelling variants for the built-in region hierarchy, consulted after explicit
/// `territory_mappings` fail to match (§4.1).
fn builtin_alias(key: &str) -> Option<&'static str> {
    match key {
        "us" | "usa" | "united states" | "us-east" | "us-west" | "north america" | "na" => {
            Some("AMER-NA")
        }
        "latam" | "latin america" | "south america" | "brazil" | "mexico" => Some("AMER-LATAM"),
        "uk" | "united kingdom" | "ireland" | "northern europe" | "nordics" => Some("EMEA-NORTH"),
        "france" | "germany" | "benelux" | "southern europe" | "spain" | "italy" => {
            Some("EMEA-SOUTH")
        }
        "middle east" | "africa" | "uae" | "south africa" => Some("EMEA-MEA"),
        "japan" | "korea" | "anz" | "australia" | "new zealand" => Some("APAC-DEVELOPED"),
        "india" | "sea" | "southeast asia" | "china" | "greater china" => Some("APAC-EMERGING"),
        _ => None,
    }
}

/// Explicit mapping first, then the built-in alias matcher, else `None` (§4.1).
pub fn region_of(
    territory_raw: Option<&str>,
    territory_mappings: &HashMap<String, String>,
) -> Option<String> {
    let raw = territory_raw?;
    let key = normalize_territory_key(raw);
    for (k, v) in territory_mappings {
        if normalize_territory_key(k) == key {
            return Some(v.clone());
        }
    }
    builtin_alias(&key).map(|s| s.to_string())
}

/// The fixed macro-region hierarchy: every canonical region rolls up to one of
/// AMER / EMEA / APAC (§4.1).
fn region_macro(region: &str) -> Option<&'static str> {
    match region {
        "AMER-NA" | "AMER-LATAM" => Some("AMER"),
        "EMEA-NORTH" | "EMEA-SOUTH" | "EMEA-MEA" => Some("EMEA"),
        "APAC-DEVELOPED" | "APAC-EMERGING" => Some("APAC"),
        _ => None,
    }
}

/// Macro-region of `region`, or `None` if `region` is not in the known hierarchy (§4.1).
pub fn region_parent(region: &str) -> Option<&'static str> {
    region_macro(region)
}

/// Two regions are siblings iff they share a macro-region and are not identical (§4.1).
pub fn are_siblings(region_a: &str, region_b: &str) -> bool {
    if region_a == region_b {
        return false;
    }
    match (region_macro(region_a), region_macro(region_b)) {
        (Some(ma), Some(mb)) => ma == mb,
        _ => false,
    }
}
