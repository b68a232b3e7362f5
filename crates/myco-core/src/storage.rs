use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::{MycoError, Result};
use crate::lifecycle::GrowPatch;
use crate::lock::with_file_lock;
use crate::normalize::name_key;
use crate::resolve::resolve_grow_id;
use crate::supply::{self, Consumption};
use crate::types::{Grow, RecipeItem, Strain, Supply};

/// Read a JSONL file, turning each non-blank line into a `T` via `parse`.
/// Returns an empty vec if the file doesn't exist.
fn read_jsonl<T>(file_path: &Path, parse: impl Fn(Value) -> Result<T>) -> Result<Vec<T>> {
    let content = match fs::read_to_string(file_path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut out = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let raw: Value = serde_json::from_str(trimmed).map_err(|e| {
            MycoError::ValidationError(format!(
                "{}:{}: {e}",
                file_path.display(),
                lineno + 1
            ))
        })?;
        out.push(parse(raw)?);
    }

    tracing::debug!(path = %file_path.display(), count = out.len(), "read");
    Ok(out)
}

/// Atomically replace a JSONL file (temp file + rename).
fn write_jsonl<T: Serialize>(file_path: &Path, items: &[T]) -> Result<()> {
    let dir = file_path.parent().unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    for item in items {
        let line = serde_json::to_string(item)?;
        writeln!(tmp, "{line}")?;
    }
    tmp.flush()?;
    tmp.persist(file_path).map_err(std::io::Error::other)?;

    tracing::debug!(path = %file_path.display(), count = items.len(), "wrote");
    Ok(())
}

fn append_jsonl<T: Serialize>(file_path: &Path, item: &T) -> Result<()> {
    let mut line = serde_json::to_string(item)?;
    line.push('\n');
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(file_path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

// ── Grows ──────────────────────────────────────────────────────────────────

/// Read all grows. Legacy field names are migrated as each line is parsed.
pub fn read_grows(file_path: &Path) -> Result<Vec<Grow>> {
    read_jsonl(file_path, Grow::from_value)
}

pub fn write_grows(file_path: &Path, grows: &[Grow]) -> Result<()> {
    write_jsonl(file_path, grows)
}

/// Append a new grow under the file lock. Rejects duplicate or empty ids.
pub fn append_grow(file_path: &Path, grow: &Grow) -> Result<()> {
    if !grow.has_id() {
        return Err(MycoError::MissingGrowId);
    }
    with_file_lock(file_path, || {
        let existing = read_grows(file_path)?;
        if existing.iter().any(|g| g.id == grow.id) {
            return Err(MycoError::ValidationError(format!(
                "grow id {} already exists",
                grow.id
            )));
        }
        append_jsonl(file_path, grow)
    })
}

/// Result of a locked read-modify-write on one grow.
#[derive(Debug, Clone)]
pub struct Patched {
    /// The grow as stored after the transaction.
    pub grow: Grow,
    /// What was written; `None` when the operation was a no-op.
    pub patch: Option<GrowPatch>,
}

/// Resolve `identifier`, hand the current snapshot to `op`, and write back
/// whatever patch it returns. The whole cycle runs under the file lock so
/// concurrent array edits (flushes, notes) and stage-date merges see each
/// other's writes.
pub fn apply_patch<F>(file_path: &Path, identifier: &str, op: F) -> Result<Patched>
where
    F: FnOnce(&Grow) -> Result<Option<GrowPatch>>,
{
    with_file_lock(file_path, || {
        let mut grows = read_grows(file_path)?;
        let (idx, current) = resolve_grow_id(&grows, identifier)?;
        let patch = op(current)?;
        let Some(patch) = patch else {
            tracing::debug!(id = %current.id, "no change");
            return Ok(Patched {
                grow: current.clone(),
                patch: None,
            });
        };

        let grow = &mut grows[idx];
        patch.apply(grow);
        let updated = grow.clone();
        write_grows(file_path, &grows)?;
        tracing::debug!(
            id = %updated.id,
            stage = %updated.stage,
            status = %updated.status,
            "grow updated"
        );
        Ok(Patched {
            grow: updated,
            patch: Some(patch),
        })
    })
}

/// Remove a grow. Returns the deleted record.
pub fn delete_grow(file_path: &Path, identifier: &str) -> Result<Grow> {
    with_file_lock(file_path, || {
        let mut grows = read_grows(file_path)?;
        let (idx, _) = resolve_grow_id(&grows, identifier)?;
        let removed = grows.remove(idx);
        write_grows(file_path, &grows)?;
        tracing::debug!(id = %removed.id, "grow deleted");
        Ok(removed)
    })
}

// ── Strains ────────────────────────────────────────────────────────────────

pub fn read_strains(file_path: &Path) -> Result<Vec<Strain>> {
    read_jsonl(file_path, |raw| Ok(serde_json::from_value(raw)?))
}

pub fn write_strains(file_path: &Path, strains: &[Strain]) -> Result<()> {
    write_jsonl(file_path, strains)
}

fn find_strain(strains: &[Strain], name: &str) -> Option<usize> {
    let want = name_key(name);
    strains.iter().position(|s| name_key(&s.name) == want)
}

/// Add a strain. Names are unique case-insensitively.
pub fn add_strain(file_path: &Path, strain: &Strain) -> Result<()> {
    with_file_lock(file_path, || {
        let strains = read_strains(file_path)?;
        if find_strain(&strains, &strain.name).is_some() {
            return Err(MycoError::StrainAlreadyExists(strain.name.trim().to_string()));
        }
        append_jsonl(file_path, strain)
    })
}

/// Apply `edit` to the named strain and return the updated record.
pub fn update_strain<F>(file_path: &Path, name: &str, edit: F) -> Result<Strain>
where
    F: FnOnce(&mut Strain),
{
    with_file_lock(file_path, || {
        let mut strains = read_strains(file_path)?;
        let idx = find_strain(&strains, name)
            .ok_or_else(|| MycoError::StrainNotFound(name.to_string()))?;
        edit(&mut strains[idx]);
        let updated = strains[idx].clone();
        if strains
            .iter()
            .enumerate()
            .any(|(i, s)| i != idx && name_key(&s.name) == name_key(&updated.name))
        {
            return Err(MycoError::StrainAlreadyExists(updated.name));
        }
        write_strains(file_path, &strains)?;
        Ok(updated)
    })
}

pub fn remove_strain(file_path: &Path, name: &str) -> Result<Strain> {
    with_file_lock(file_path, || {
        let mut strains = read_strains(file_path)?;
        let idx = find_strain(&strains, name)
            .ok_or_else(|| MycoError::StrainNotFound(name.to_string()))?;
        let removed = strains.remove(idx);
        write_strains(file_path, &strains)?;
        Ok(removed)
    })
}

// ── Supplies ───────────────────────────────────────────────────────────────

pub fn read_supplies(file_path: &Path) -> Result<Vec<Supply>> {
    read_jsonl(file_path, |raw| Ok(serde_json::from_value(raw)?))
}

pub fn write_supplies(file_path: &Path, supplies: &[Supply]) -> Result<()> {
    write_jsonl(file_path, supplies)
}

fn ensure_unique_supply(
    supplies: &[Supply],
    candidate: &Supply,
    skip: Option<usize>,
) -> Result<()> {
    let name = name_key(&candidate.name);
    let clash = supplies.iter().enumerate().any(|(i, s)| {
        Some(i) != skip && (s.id == candidate.id || name_key(&s.name) == name)
    });
    if clash {
        return Err(MycoError::SupplyAlreadyExists(candidate.name.trim().to_string()));
    }
    Ok(())
}

/// Add a supply. Ids and names are unique, names case-insensitively.
pub fn add_supply(file_path: &Path, supply: &Supply) -> Result<()> {
    supply::validate_supply(supply)?;
    with_file_lock(file_path, || {
        let supplies = read_supplies(file_path)?;
        ensure_unique_supply(&supplies, supply, None)?;
        append_jsonl(file_path, supply)
    })
}

/// Apply `edit` to the supply matching `ident` (id or name) and return the
/// updated record.
pub fn update_supply<F>(file_path: &Path, ident: &str, edit: F) -> Result<Supply>
where
    F: FnOnce(&mut Supply),
{
    with_file_lock(file_path, || {
        let mut supplies = read_supplies(file_path)?;
        let idx = supply::find_supply(&supplies, ident)
            .ok_or_else(|| MycoError::SupplyNotFound(ident.to_string()))?;
        edit(&mut supplies[idx]);
        let updated = supplies[idx].clone();
        supply::validate_supply(&updated)?;
        ensure_unique_supply(&supplies, &updated, Some(idx))?;
        write_supplies(file_path, &supplies)?;
        Ok(updated)
    })
}

pub fn remove_supply(file_path: &Path, ident: &str) -> Result<Supply> {
    with_file_lock(file_path, || {
        let mut supplies = read_supplies(file_path)?;
        let idx = supply::find_supply(&supplies, ident)
            .ok_or_else(|| MycoError::SupplyNotFound(ident.to_string()))?;
        let removed = supplies.remove(idx);
        write_supplies(file_path, &supplies)?;
        Ok(removed)
    })
}

/// Draw a recipe's catalogued items from stock under the supplies lock.
pub fn consume_supplies(
    file_path: &Path,
    items: &[RecipeItem],
    now: DateTime<Utc>,
) -> Result<Vec<Consumption>> {
    with_file_lock(file_path, || {
        let mut supplies = read_supplies(file_path)?;
        let applied = supply::consume(&mut supplies, items, now);
        if !applied.is_empty() {
            write_supplies(file_path, &supplies)?;
        }
        Ok(applied)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle;
    use crate::types::Stage;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn grow(id: &str, stage: &str) -> Grow {
        Grow {
            id: id.to_string(),
            strain: "GT".to_string(),
            grow_type: "Agar".to_string(),
            stage: stage.to_string(),
            status: "Active".to_string(),
            ..Grow::default()
        }
    }

    #[test]
    fn read_nonexistent_returns_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nonexistent.jsonl");
        assert!(read_grows(&path).unwrap().is_empty());
        assert!(read_strains(&path).unwrap().is_empty());
    }

    #[test]
    fn append_and_read() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("grows.jsonl");
        append_grow(&path, &grow("g-1", "Inoculated")).unwrap();
        append_grow(&path, &grow("g-2", "Fruiting")).unwrap();

        let grows = read_grows(&path).unwrap();
        assert_eq!(grows.len(), 2);
        assert_eq!(grows[1].stage, "Fruiting");
    }

    #[test]
    fn duplicate_and_blank_ids_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("grows.jsonl");
        append_grow(&path, &grow("g-1", "Inoculated")).unwrap();
        assert!(append_grow(&path, &grow("g-1", "Inoculated")).is_err());
        assert!(matches!(
            append_grow(&path, &grow("", "Inoculated")),
            Err(MycoError::MissingGrowId)
        ));
    }

    #[test]
    fn bad_line_reports_location() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("grows.jsonl");
        fs::write(&path, "{\"id\":\"g-1\"}\n\nnot json\n").unwrap();
        let err = read_grows(&path).unwrap_err().to_string();
        assert!(err.contains(":3:"), "{err}");
    }

    #[test]
    fn legacy_lines_migrate_on_read() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("grows.jsonl");
        let legacy = r#"{"id":"old","growType":"Grain Jar","abbr":"GT1","stage":"fruiting","stageDates":{"fruiting":"2024-02-01"},"harvest":{"flushes":[{"wet":"120","dry":12}]}}"#;
        fs::write(&path, format!("{legacy}\n")).unwrap();

        let grows = read_grows(&path).unwrap();
        assert_eq!(grows[0].grow_type, "Grain Jar");
        assert_eq!(grows[0].abbreviation.as_deref(), Some("GT1"));
        assert!(grows[0].stage_date(Stage::Fruiting).is_some());
        assert_eq!(grows[0].flushes[0].wet, 120.0);
    }

    #[test]
    fn unknown_fields_survive_rewrite() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("grows.jsonl");
        fs::write(
            &path,
            "{\"id\":\"g-1\",\"stage\":\"Inoculated\",\"status\":\"Active\",\"type\":\"Agar\",\"jarCount\":4}\n",
        )
        .unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        apply_patch(&path, "g-1", |g| lifecycle::advance(g, None, now)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"jarCount\":4"), "{content}");
    }

    #[test]
    fn apply_patch_writes_and_reports() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("grows.jsonl");
        write_grows(&path, &[grow("g-aaaa1111", "Inoculated"), grow("g-bbbb2222", "Fruiting")])
            .unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        let out = apply_patch(&path, "aaaa", |g| lifecycle::advance(g, None, now)).unwrap();
        assert!(out.patch.is_some());
        assert_eq!(out.grow.stage, "Colonizing");

        let stored = read_grows(&path).unwrap();
        assert_eq!(stored[0].stage, "Colonizing");
        assert_eq!(stored[0].stage_date(Stage::Colonizing), Some(now));
        assert_eq!(stored[1].stage, "Fruiting");
    }

    #[test]
    fn noop_patch_leaves_file_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("grows.jsonl");
        write_grows(&path, &[grow("g-1", "Consumed")]).unwrap();
        let before = fs::read_to_string(&path).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        let out = apply_patch(&path, "g-1", |g| lifecycle::advance(g, None, now)).unwrap();
        assert!(out.patch.is_none());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn sequential_flush_adds_accumulate() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("grows.jsonl");
        write_grows(&path, &[grow("g-1", "Fruiting")]).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        for _ in 0..3 {
            apply_patch(&path, "g-1", |g| lifecycle::add_flush(g, now).map(Some)).unwrap();
        }
        assert_eq!(read_grows(&path).unwrap()[0].flushes.len(), 3);
    }

    #[test]
    fn failed_op_propagates() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("grows.jsonl");
        let mut bulk = grow("g-1", "Fruiting");
        bulk.grow_type = "Bulk".to_string();
        write_grows(&path, &[bulk]).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        let err = apply_patch(&path, "g-1", |g| lifecycle::toggle_store_grow(g, now).map(Some))
            .unwrap_err();
        assert!(matches!(err, MycoError::StoreNotAllowed { .. }));
        assert_eq!(read_grows(&path).unwrap()[0].status, "Active");
    }

    #[test]
    fn delete_removes_one() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("grows.jsonl");
        write_grows(&path, &[grow("g-1", "Fruiting"), grow("g-2", "Fruiting")]).unwrap();
        let removed = delete_grow(&path, "g-1").unwrap();
        assert_eq!(removed.id, "g-1");
        assert_eq!(read_grows(&path).unwrap().len(), 1);
    }

    #[test]
    fn strain_crud() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("strains.jsonl");
        let gt = Strain {
            name: "Golden Teacher".to_string(),
            scientific_name: Some("Psilocybe cubensis".to_string()),
            ..Strain::default()
        };
        add_strain(&path, &gt).unwrap();
        assert!(matches!(
            add_strain(&path, &Strain { name: "golden teacher".into(), ..Strain::default() }),
            Err(MycoError::StrainAlreadyExists(_))
        ));

        let updated = update_strain(&path, "GOLDEN TEACHER", |s| {
            s.description = Some("Classic".into());
        })
        .unwrap();
        assert_eq!(updated.description.as_deref(), Some("Classic"));

        remove_strain(&path, "Golden Teacher").unwrap();
        assert!(read_strains(&path).unwrap().is_empty());
        assert!(matches!(
            remove_strain(&path, "Golden Teacher"),
            Err(MycoError::StrainNotFound(_))
        ));
    }

    #[test]
    fn rename_cannot_collide_in_non_ascii_case() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("strains.jsonl");
        for name in ["Ähre", "Blue Meanie"] {
            add_strain(&path, &Strain { name: name.into(), ..Strain::default() }).unwrap();
        }
        assert!(matches!(
            update_strain(&path, "Blue Meanie", |s| s.name = "ähre".into()),
            Err(MycoError::StrainAlreadyExists(_))
        ));
        assert_eq!(read_strains(&path).unwrap()[1].name, "Blue Meanie");
    }

    fn supply(id: &str, name: &str, quantity: f64) -> Supply {
        Supply {
            id: id.to_string(),
            name: name.to_string(),
            cost: 0.5,
            quantity,
            unit: "g".to_string(),
            ..Supply::default()
        }
    }

    #[test]
    fn supply_crud() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("supplies.jsonl");
        add_supply(&path, &supply("s-1", "Gypsum", 100.0)).unwrap();
        assert!(matches!(
            add_supply(&path, &supply("s-2", "GYPSUM", 1.0)),
            Err(MycoError::SupplyAlreadyExists(_))
        ));
        assert!(matches!(
            add_supply(&path, &supply("s-3", "Perlite", -1.0)),
            Err(MycoError::ValidationError(_))
        ));

        let updated = update_supply(&path, "gypsum", |s| s.cost = 0.75).unwrap();
        assert_eq!(updated.cost, 0.75);
        assert_eq!(read_supplies(&path).unwrap()[0].cost, 0.75);

        assert_eq!(remove_supply(&path, "s-1").unwrap().name, "Gypsum");
        assert!(matches!(
            remove_supply(&path, "s-1"),
            Err(MycoError::SupplyNotFound(_))
        ));
    }

    #[test]
    fn consumption_is_written_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("supplies.jsonl");
        write_supplies(&path, &[supply("s-1", "Rye", 1000.0)]).unwrap();
        let items = [RecipeItem {
            supply_id: Some("s-1".into()),
            amount: Some(400.0),
            ..RecipeItem::default()
        }];
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let applied = consume_supplies(&path, &items, now).unwrap();
        assert_eq!(applied[0].after, 600.0);
        assert_eq!(read_supplies(&path).unwrap()[0].quantity, 600.0);
    }
}
