use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::normalize::to_iso;

pub const GROW_ID_PREFIX: &str = "g-";
pub const SUPPLY_ID_PREFIX: &str = "s-";
const HASH_LEN: usize = 8;

/// Generate a grow ID from its strain and creation time.
/// Format: `g-{first 8 hex chars of SHA256}`. On collision with an existing
/// id a counter is mixed in until the result is unique.
pub fn generate_grow_id<'a, I>(strain: &str, created_at: DateTime<Utc>, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let base = format!("grow:{}:{}", strain.trim(), to_iso(&created_at));
    unique_id(GROW_ID_PREFIX, &base, existing)
}

/// Generate a supply ID from its name and creation time. Same scheme as
/// grows, with an `s-` prefix.
pub fn generate_supply_id<'a, I>(name: &str, created_at: DateTime<Utc>, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let base = format!("supply:{}:{}", name.trim().to_lowercase(), to_iso(&created_at));
    unique_id(SUPPLY_ID_PREFIX, &base, existing)
}

fn unique_id<'a, I>(prefix: &str, base: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: std::collections::HashSet<&str> = existing.into_iter().collect();
    let mut salt = 0u32;
    loop {
        let key = if salt == 0 {
            base.to_string()
        } else {
            format!("{base}:{salt}")
        };
        let id = format!("{prefix}{}", &hex_digest(&key)[..HASH_LEN]);
        if !taken.contains(id.as_str()) {
            return id;
        }
        salt += 1;
    }
}

fn hex_digest(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
