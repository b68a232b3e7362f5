use crate::error::{MycoError, Result};
use crate::id::GROW_ID_PREFIX;
use crate::types::Grow;

/// Resolve an identifier to a grow within a list.
/// Accepts: full ID (g-1a2b3c4d), bare hash (1a2b3c4d), or prefix (1a2 / g-1a2).
/// Legacy ids without the `g-` prefix match exactly or by prefix too.
pub fn resolve_grow_id<'a>(grows: &'a [Grow], identifier: &str) -> Result<(usize, &'a Grow)> {
    let needle = identifier.trim();
    if needle.is_empty() {
        return Err(MycoError::MissingGrowId);
    }
    let hash = needle.strip_prefix(GROW_ID_PREFIX).unwrap_or(needle);
    let full_id = format!("{GROW_ID_PREFIX}{hash}");

    if let Some(found) = grows
        .iter()
        .enumerate()
        .find(|(_, g)| g.id == full_id || g.id == needle)
    {
        return Ok(found);
    }

    let matches: Vec<(usize, &Grow)> = grows
        .iter()
        .enumerate()
        .filter(|(_, g)| g.has_id() && (g.id.starts_with(&full_id) || g.id.starts_with(needle)))
        .collect();

    match matches.len() {
        1 => Ok(matches[0]),
        0 => Err(MycoError::GrowNotFound(needle.to_string())),
        n => {
            let ids: Vec<&str> = matches.iter().map(|(_, g)| g.id.as_str()).collect();
            Err(MycoError::AmbiguousId {
                id: needle.to_string(),
                count: n,
                ids: ids.join(", "),
            })
        }
    }
}
