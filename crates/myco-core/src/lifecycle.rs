//! Stage and status transitions for a single grow.
//!
//! Every operation here is pure: it takes a snapshot of a [`Grow`] plus the
//! current time and returns a [`GrowPatch`] describing the partial update to
//! write. Nothing in this module touches storage. Operations that have
//! nothing to do return `Ok(None)`; precondition failures return a named
//! [`MycoError`] and never a payload.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};

use crate::error::{MycoError, Result};
use crate::normalize::to_iso;
use crate::types::{Flush, Grow, RecipeItem, Stage, StageNote, StagePhoto, Status};

// ── Patch payload ──────────────────────────────────────────────────────────

/// A partial update to one grow. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrowPatch {
    pub stage: Option<String>,
    /// Stage-date entries to set. Entries not listed are never touched.
    pub stage_dates: BTreeMap<String, DateTime<Utc>>,
    pub status: Option<String>,
    pub archived: Option<bool>,
    pub is_archived: Option<bool>,
    /// `Some(None)` clears the field.
    pub archived_at: Option<Option<DateTime<Utc>>>,
    /// Whole-array replacement.
    pub flushes: Option<Vec<Flush>>,
    pub stage_notes: Option<Vec<StageNote>>,
    pub stage_photos: Option<Vec<StagePhoto>>,
    pub strain: Option<String>,
    pub abbreviation: Option<String>,
    pub grow_type: Option<String>,
    pub cost: Option<f64>,
    pub recipe_name: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl GrowPatch {
    fn touched(now: DateTime<Utc>) -> Self {
        Self {
            updated_at: Some(now),
            ..Self::default()
        }
    }

    /// Merge this patch into `grow`.
    pub fn apply(&self, grow: &mut Grow) {
        if let Some(ref stage) = self.stage {
            grow.stage = stage.clone();
        }
        for (stage, at) in &self.stage_dates {
            grow.stage_dates.insert(stage.clone(), *at);
        }
        if let Some(ref status) = self.status {
            grow.status = status.clone();
        }
        if let Some(archived) = self.archived {
            grow.archived = Some(archived);
        }
        if let Some(is_archived) = self.is_archived {
            grow.is_archived = Some(is_archived);
        }
        if let Some(archived_at) = self.archived_at {
            grow.archived_at = archived_at;
        }
        if let Some(ref flushes) = self.flushes {
            grow.flushes = flushes.clone();
        }
        if let Some(ref notes) = self.stage_notes {
            grow.stage_notes = notes.clone();
        }
        if let Some(ref photos) = self.stage_photos {
            grow.stage_photos = photos.clone();
        }
        if let Some(ref strain) = self.strain {
            grow.strain = strain.clone();
        }
        if let Some(ref abbreviation) = self.abbreviation {
            grow.abbreviation = Some(abbreviation.clone()).filter(|a| !a.is_empty());
        }
        if let Some(ref grow_type) = self.grow_type {
            grow.grow_type = grow_type.clone();
        }
        if let Some(cost) = self.cost {
            grow.cost = Some(cost);
        }
        if let Some(ref recipe_name) = self.recipe_name {
            grow.recipe_name = Some(recipe_name.clone()).filter(|r| !r.is_empty());
        }
        if let Some(updated_at) = self.updated_at {
            grow.updated_at = Some(updated_at);
        }
    }

    /// Render as a merge-patch document. Stage dates use dotted keys
    /// (`"stageDates.Colonizing"`) so a document store can set them without
    /// replacing the whole map.
    pub fn to_json(&self) -> Result<Value> {
        let mut out = Map::new();
        if let Some(ref stage) = self.stage {
            out.insert("stage".into(), json!(stage));
        }
        for (stage, at) in &self.stage_dates {
            out.insert(format!("stageDates.{stage}"), json!(to_iso(at)));
        }
        if let Some(ref status) = self.status {
            out.insert("status".into(), json!(status));
        }
        if let Some(archived) = self.archived {
            out.insert("archived".into(), json!(archived));
        }
        if let Some(is_archived) = self.is_archived {
            out.insert("isArchived".into(), json!(is_archived));
        }
        if let Some(archived_at) = self.archived_at {
            out.insert("archivedAt".into(), json!(archived_at.as_ref().map(to_iso)));
        }
        if let Some(ref flushes) = self.flushes {
            out.insert("flushes".into(), serde_json::to_value(flushes)?);
        }
        if let Some(ref notes) = self.stage_notes {
            out.insert("stageNotes".into(), serde_json::to_value(notes)?);
        }
        if let Some(ref photos) = self.stage_photos {
            out.insert("stagePhotos".into(), serde_json::to_value(photos)?);
        }
        if let Some(ref strain) = self.strain {
            out.insert("strain".into(), json!(strain));
        }
        if let Some(ref abbreviation) = self.abbreviation {
            out.insert("abbreviation".into(), json!(abbreviation));
        }
        if let Some(ref grow_type) = self.grow_type {
            out.insert("type".into(), json!(grow_type));
        }
        if let Some(cost) = self.cost {
            out.insert("cost".into(), json!(cost));
        }
        if let Some(ref recipe_name) = self.recipe_name {
            out.insert("recipeName".into(), json!(recipe_name));
        }
        if let Some(ref updated_at) = self.updated_at {
            out.insert("updatedAt".into(), json!(to_iso(updated_at)));
        }
        Ok(Value::Object(out))
    }
}

// ── Pure transitions ───────────────────────────────────────────────────────

/// The single next stage after `current`, or `None` when there is nowhere
/// to go (last stage, contaminated, or unrecognized).
pub fn advance_stage(current: &str) -> Option<Stage> {
    Stage::normalize(current).next()
}

/// `Archived` becomes `Active`; anything else becomes `Archived`.
pub fn toggle_archive(status: &str) -> Status {
    match Status::normalize(status) {
        Status::Archived => Status::Active,
        _ => Status::Archived,
    }
}

/// `Stored` becomes `Active`; anything else becomes `Stored`. Only Agar and
/// LC cultures may be stored.
pub fn toggle_store(status: &str, grow_type: &str) -> Result<Status> {
    let kind = crate::types::GrowType::normalize(grow_type);
    if !kind.is_storable() {
        return Err(MycoError::StoreNotAllowed {
            grow_type: kind.to_string(),
        });
    }
    Ok(match Status::normalize(status) {
        Status::Stored => Status::Active,
        _ => Status::Stored,
    })
}

// ── Grow-level operations ──────────────────────────────────────────────────

fn ensure_id(grow: &Grow) -> Result<()> {
    if !grow.has_id() {
        return Err(MycoError::MissingGrowId);
    }
    Ok(())
}

fn validate_amount(what: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(MycoError::ValidationError(format!(
            "{what} must be a finite, non-negative number (got {value})"
        )));
    }
    Ok(())
}

/// Move a grow to its next stage ("Stage+"). Records the stage date at `at`
/// when given, otherwise `now`.
pub fn advance(
    grow: &Grow,
    at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Option<GrowPatch>> {
    ensure_id(grow)?;
    let Some(next) = advance_stage(&grow.stage) else {
        tracing::debug!(id = %grow.id, stage = %grow.stage, "no stage to advance to");
        return Ok(None);
    };
    Ok(Some(stage_patch(next, at.unwrap_or(now), now)))
}

/// Manual stage edit. Unlike [`advance`] this may jump anywhere, but still
/// records the date the new stage was entered.
pub fn set_stage(
    grow: &Grow,
    stage: Stage,
    at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Option<GrowPatch>> {
    ensure_id(grow)?;
    if stage == Stage::Other {
        return Err(MycoError::ValidationError(
            "\"Other\" is not a stage that can be set explicitly".to_string(),
        ));
    }
    if grow.stage == stage.as_str() && at.is_none() {
        return Ok(None);
    }
    Ok(Some(stage_patch(stage, at.unwrap_or(now), now)))
}

fn stage_patch(stage: Stage, entered: DateTime<Utc>, now: DateTime<Utc>) -> GrowPatch {
    let mut patch = GrowPatch::touched(now);
    patch.stage = Some(stage.as_str().to_string());
    patch.stage_dates.insert(stage.as_str().to_string(), entered);
    patch
}

/// Status change with the legacy archive flags kept consistent.
fn status_patch(grow: &Grow, status: Status, now: DateTime<Utc>) -> GrowPatch {
    let archiving = status == Status::Archived;
    let mut patch = GrowPatch::touched(now);
    patch.status = Some(status.as_str().to_string());
    patch.archived = Some(archiving);
    patch.archived_at = Some(archiving.then_some(now));
    if !archiving && grow.is_archived == Some(true) {
        patch.is_archived = Some(false);
    }
    patch
}

/// Archive or unarchive a grow.
pub fn toggle_archive_grow(grow: &Grow, now: DateTime<Utc>) -> Result<GrowPatch> {
    ensure_id(grow)?;
    Ok(status_patch(grow, toggle_archive(&grow.status), now))
}

/// Store or unstore a culture.
pub fn toggle_store_grow(grow: &Grow, now: DateTime<Utc>) -> Result<GrowPatch> {
    ensure_id(grow)?;
    let next = toggle_store(&grow.status, &grow.grow_type)?;
    Ok(status_patch(grow, next, now))
}

/// Done harvesting: archive without touching stage or flush history.
pub fn finish_harvest(grow: &Grow, now: DateTime<Utc>) -> Result<GrowPatch> {
    ensure_id(grow)?;
    Ok(status_patch(grow, Status::Archived, now))
}

/// Append an empty flush.
pub fn add_flush(grow: &Grow, now: DateTime<Utc>) -> Result<GrowPatch> {
    ensure_id(grow)?;
    let mut flushes = grow.flushes.clone();
    flushes.push(Flush::zero(Some(now)));
    let mut patch = GrowPatch::touched(now);
    patch.flushes = Some(flushes);
    Ok(patch)
}

/// Fields to merge into one flush.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushPatch {
    pub wet: Option<f64>,
    pub dry: Option<f64>,
    pub date: Option<DateTime<Utc>>,
}

/// Merge `changes` into `flushes[index]`, padding with empty flushes when
/// `index` is past the end. Other entries are copied unchanged.
pub fn update_flush(
    grow: &Grow,
    index: usize,
    changes: &FlushPatch,
    now: DateTime<Utc>,
) -> Result<GrowPatch> {
    ensure_id(grow)?;
    if let Some(wet) = changes.wet {
        validate_amount("wet weight", wet)?;
    }
    if let Some(dry) = changes.dry {
        validate_amount("dry weight", dry)?;
    }

    let mut flushes = grow.flushes.clone();
    while flushes.len() <= index {
        flushes.push(Flush::zero(Some(now)));
    }
    let target = &mut flushes[index];
    if let Some(wet) = changes.wet {
        target.wet = wet;
    }
    if let Some(dry) = changes.dry {
        target.dry = dry;
    }
    if let Some(date) = changes.date {
        target.date = Some(date);
    }

    let mut patch = GrowPatch::touched(now);
    patch.flushes = Some(flushes);
    Ok(patch)
}

/// Attach a note under `stage` (the grow's current stage when `None`).
pub fn add_note(
    grow: &Grow,
    stage: Option<Stage>,
    text: &str,
    now: DateTime<Utc>,
) -> Result<GrowPatch> {
    ensure_id(grow)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(MycoError::ValidationError("note text is empty".to_string()));
    }
    let mut notes = grow.stage_notes.clone();
    notes.push(StageNote {
        stage: stage.unwrap_or_else(|| grow.stage_kind()).to_string(),
        text: text.to_string(),
        created_at: Some(now),
    });
    let mut patch = GrowPatch::touched(now);
    patch.stage_notes = Some(notes);
    Ok(patch)
}

/// Attach a photo reference (path or URL) under `stage`.
pub fn add_photo(
    grow: &Grow,
    stage: Option<Stage>,
    path: &str,
    caption: Option<&str>,
    now: DateTime<Utc>,
) -> Result<GrowPatch> {
    ensure_id(grow)?;
    let path = path.trim();
    if path.is_empty() {
        return Err(MycoError::ValidationError("photo path is empty".to_string()));
    }
    let mut photos = grow.stage_photos.clone();
    photos.push(StagePhoto {
        stage: stage.unwrap_or_else(|| grow.stage_kind()).to_string(),
        path: path.to_string(),
        caption: caption.map(str::trim).filter(|c| !c.is_empty()).map(String::from),
        created_at: Some(now),
    });
    let mut patch = GrowPatch::touched(now);
    patch.stage_photos = Some(photos);
    Ok(patch)
}

/// Plain field edits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldEdits {
    pub strain: Option<String>,
    pub abbreviation: Option<String>,
    pub grow_type: Option<String>,
    pub cost: Option<f64>,
    pub recipe_name: Option<String>,
}

pub fn edit_fields(
    grow: &Grow,
    edits: &FieldEdits,
    now: DateTime<Utc>,
) -> Result<Option<GrowPatch>> {
    ensure_id(grow)?;
    if let Some(cost) = edits.cost {
        if !cost.is_finite() || cost < 0.0 {
            return Err(MycoError::InvalidCost(cost));
        }
    }
    if let Some(ref grow_type) = edits.grow_type {
        let kind = crate::types::GrowType::normalize(grow_type);
        if grow.status_kind() == Status::Stored && !kind.is_storable() {
            return Err(MycoError::StoreNotAllowed {
                grow_type: kind.to_string(),
            });
        }
    }
    if let Some(ref strain) = edits.strain {
        if strain.trim().is_empty() {
            return Err(MycoError::ValidationError("strain cannot be empty".to_string()));
        }
    }
    if *edits == FieldEdits::default() {
        return Ok(None);
    }

    let mut patch = GrowPatch::touched(now);
    patch.strain = edits.strain.as_ref().map(|s| s.trim().to_string());
    patch.abbreviation = edits.abbreviation.as_ref().map(|s| s.trim().to_string());
    patch.grow_type = edits
        .grow_type
        .as_ref()
        .map(|t| crate::types::GrowType::normalize(t).to_string());
    patch.cost = edits.cost;
    patch.recipe_name = edits.recipe_name.as_ref().map(|s| s.trim().to_string());
    Ok(Some(patch))
}

// ── Creation ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct NewGrow {
    pub strain: String,
    pub grow_type: String,
    pub abbreviation: Option<String>,
    pub cost: Option<f64>,
    pub inoculated: Option<DateTime<Utc>>,
    pub recipe_name: Option<String>,
    pub recipe_items: Vec<RecipeItem>,
}

/// Build a fresh grow: stage `Inoculated`, status `Active`, created now.
pub fn new_grow(id: String, input: NewGrow, now: DateTime<Utc>) -> Result<Grow> {
    if id.trim().is_empty() {
        return Err(MycoError::MissingGrowId);
    }
    let strain = input.strain.trim().to_string();
    if strain.is_empty() {
        return Err(MycoError::ValidationError("strain cannot be empty".to_string()));
    }
    if let Some(cost) = input.cost {
        if !cost.is_finite() || cost < 0.0 {
            return Err(MycoError::InvalidCost(cost));
        }
    }

    let inoculated = input.inoculated.unwrap_or(now);
    let grow_type = if input.grow_type.trim().is_empty() {
        crate::types::GrowType::Other
    } else {
        crate::types::GrowType::normalize(&input.grow_type)
    };

    Ok(Grow {
        id,
        strain,
        abbreviation: input
            .abbreviation
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty()),
        grow_type: grow_type.to_string(),
        stage: Stage::Inoculated.to_string(),
        status: Status::Active.to_string(),
        stage_dates: BTreeMap::from([(Stage::Inoculated.to_string(), inoculated)]),
        cost: input.cost,
        created_at: Some(now),
        updated_at: Some(now),
        inoculation_date: input.inoculated,
        recipe_name: input.recipe_name,
        recipe_items: input.recipe_items,
        ..Grow::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn grow(id: &str, stage: &str, grow_type: &str, status: &str) -> Grow {
        Grow {
            id: id.to_string(),
            stage: stage.to_string(),
            grow_type: grow_type.to_string(),
            status: status.to_string(),
            ..Grow::default()
        }
    }

    #[test]
    fn advance_walks_the_flow() {
        let flow = [
            ("Inoculated", Stage::Colonizing),
            ("colonizing", Stage::Colonized),
            ("Colonized", Stage::Fruiting),
            ("fruit", Stage::Harvested),
            ("Harvested", Stage::Consumed),
        ];
        for (current, expected) in flow {
            assert_eq!(advance_stage(current), Some(expected), "from {current}");
        }
    }

    #[test]
    fn advance_is_noop_at_terminal_stages() {
        for current in ["Consumed", "Contaminated", "Other", "", "pinning"] {
            assert_eq!(advance_stage(current), None, "from {current:?}");
        }
        let g = grow("g1", "Consumed", "Bulk", "Active");
        assert_eq!(advance(&g, None, now()).unwrap(), None);
    }

    #[test]
    fn toggle_archive_two_valued_cycle() {
        assert_eq!(toggle_archive("Archived"), Status::Active);
        assert_eq!(toggle_archive("Active"), Status::Archived);
        assert_eq!(toggle_archive("Stored"), Status::Archived);
        assert_eq!(toggle_archive("whatever"), Status::Archived);
        let once = toggle_archive("whatever");
        assert_eq!(toggle_archive(once.as_str()), Status::Active);
    }

    #[test]
    fn toggle_store_rejects_bulk_regardless_of_status() {
        for status in ["Active", "Stored", "Archived", ""] {
            let err = toggle_store(status, "Bulk").unwrap_err();
            assert!(matches!(err, MycoError::StoreNotAllowed { .. }));
            assert_eq!(
                err.to_string(),
                "Cannot store a Bulk-type grow. Only Agar and LC cultures can be stored."
            );
        }
    }

    #[test]
    fn toggle_store_rejects_types_that_only_contain_lc() {
        for grow_type in ["Bulk tub (CVG + calcium)", "Mulch bed", "Monotub w/ calcium carbonate"] {
            assert!(matches!(
                toggle_store("Active", grow_type),
                Err(MycoError::StoreNotAllowed { .. })
            ));
        }
    }

    #[test]
    fn toggle_store_cycles_for_cultures() {
        assert_eq!(toggle_store("Active", "Agar").unwrap(), Status::Stored);
        assert_eq!(toggle_store("Stored", "liquid culture").unwrap(), Status::Active);
    }

    #[test]
    fn missing_id_is_rejected_before_any_payload() {
        let g = grow("  ", "Inoculated", "Agar", "Active");
        assert!(matches!(advance(&g, None, now()), Err(MycoError::MissingGrowId)));
        assert!(matches!(toggle_archive_grow(&g, now()), Err(MycoError::MissingGrowId)));
        assert!(matches!(toggle_store_grow(&g, now()), Err(MycoError::MissingGrowId)));
        assert!(matches!(add_flush(&g, now()), Err(MycoError::MissingGrowId)));
        assert!(matches!(finish_harvest(&g, now()), Err(MycoError::MissingGrowId)));
    }

    #[test]
    fn agar_grow_end_to_end() {
        let mut g = grow("g1", "Inoculated", "Agar", "Active");

        let patch = advance(&g, None, now()).unwrap().unwrap();
        patch.apply(&mut g);
        assert_eq!(g.stage, "Colonizing");
        assert_eq!(g.stage_date(Stage::Colonizing), Some(now()));
        assert_eq!(g.stage_date(Stage::Inoculated), None);

        toggle_store_grow(&g, now()).unwrap().apply(&mut g);
        assert_eq!(g.status, "Stored");

        toggle_store_grow(&g, now()).unwrap().apply(&mut g);
        assert_eq!(g.status, "Active");
    }

    #[test]
    fn advance_with_explicit_date_keeps_other_entries() {
        let earlier = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let explicit = Utc.with_ymd_and_hms(2024, 4, 20, 0, 0, 0).unwrap();
        let mut g = grow("g1", "Colonized", "Bulk", "Active");
        g.stage_dates.insert("Inoculated".into(), earlier);

        let patch = advance(&g, Some(explicit), now()).unwrap().unwrap();
        assert_eq!(patch.stage_dates.len(), 1);
        patch.apply(&mut g);
        assert_eq!(g.stage_date(Stage::Fruiting), Some(explicit));
        assert_eq!(g.stage_date(Stage::Inoculated), Some(earlier));
    }

    #[test]
    fn patch_json_uses_dotted_stage_keys() {
        let g = grow("g1", "Inoculated", "Agar", "Active");
        let patch = advance(&g, None, now()).unwrap().unwrap();
        let doc = patch.to_json().unwrap();
        assert_eq!(doc["stage"], "Colonizing");
        assert_eq!(doc["stageDates.Colonizing"], "2024-05-01T12:00:00.000Z");
        assert!(doc.get("status").is_none());
    }

    #[test]
    fn archive_toggle_keeps_flags_consistent() {
        let mut g = grow("g1", "Fruiting", "Bulk", "Active");
        toggle_archive_grow(&g, now()).unwrap().apply(&mut g);
        assert_eq!(g.status, "Archived");
        assert_eq!(g.archived, Some(true));
        assert_eq!(g.archived_at, Some(now()));

        g.is_archived = Some(true);
        toggle_archive_grow(&g, now()).unwrap().apply(&mut g);
        assert_eq!(g.status, "Active");
        assert_eq!(g.archived, Some(false));
        assert_eq!(g.is_archived, Some(false));
        assert_eq!(g.archived_at, None);
    }

    #[test]
    fn finish_harvest_archives_without_touching_history() {
        let mut g = grow("g1", "Fruiting", "Bulk", "Active");
        g.flushes = vec![Flush {
            wet: 200.0,
            dry: 20.0,
            ..Flush::default()
        }];
        finish_harvest(&g, now()).unwrap().apply(&mut g);
        assert_eq!(g.status, "Archived");
        assert_eq!(g.stage, "Fruiting");
        assert_eq!(g.flushes.len(), 1);
    }

    #[test]
    fn flush_append_then_update_preserves_others() {
        let mut g = grow("g1", "Fruiting", "Bulk", "Active");
        g.flushes = vec![Flush {
            wet: 150.0,
            dry: 15.0,
            ..Flush::default()
        }];
        let first = g.flushes[0].clone();

        add_flush(&g, now()).unwrap().apply(&mut g);
        assert_eq!(g.flushes.len(), 2);
        assert_eq!(g.flushes[1].wet, 0.0);
        assert_eq!(g.flushes[1].created_at, Some(now()));

        let changes = FlushPatch {
            wet: Some(90.0),
            ..FlushPatch::default()
        };
        update_flush(&g, 1, &changes, now()).unwrap().apply(&mut g);
        assert_eq!(g.flushes[0], first);
        assert_eq!(g.flushes[1].wet, 90.0);
        assert_eq!(g.flushes[1].dry, 0.0);
    }

    #[test]
    fn update_flush_past_end_pads() {
        let mut g = grow("g1", "Fruiting", "Bulk", "Active");
        let changes = FlushPatch {
            dry: Some(4.5),
            ..FlushPatch::default()
        };
        update_flush(&g, 2, &changes, now()).unwrap().apply(&mut g);
        assert_eq!(g.flushes.len(), 3);
        assert_eq!(g.flushes[2].dry, 4.5);
    }

    #[test]
    fn update_flush_rejects_negative_weights() {
        let g = grow("g1", "Fruiting", "Bulk", "Active");
        let changes = FlushPatch {
            wet: Some(-1.0),
            ..FlushPatch::default()
        };
        assert!(update_flush(&g, 0, &changes, now()).is_err());
    }

    #[test]
    fn manual_stage_set_can_skip() {
        let mut g = grow("g1", "Inoculated", "Bulk", "Active");
        set_stage(&g, Stage::Fruiting, None, now())
            .unwrap()
            .unwrap()
            .apply(&mut g);
        assert_eq!(g.stage, "Fruiting");
        assert!(g.stage_date(Stage::Fruiting).is_some());
        assert_eq!(set_stage(&g, Stage::Fruiting, None, now()).unwrap(), None);
        assert!(set_stage(&g, Stage::Other, None, now()).is_err());
    }

    #[test]
    fn notes_default_to_current_stage() {
        let mut g = grow("g1", "colonizing", "Grain", "Active");
        add_note(&g, None, "  looks healthy ", now()).unwrap().apply(&mut g);
        add_note(&g, Some(Stage::Inoculated), "used 2cc", now())
            .unwrap()
            .apply(&mut g);
        assert_eq!(g.stage_notes.len(), 2);
        assert_eq!(g.stage_notes[0].stage, "Colonizing");
        assert_eq!(g.stage_notes[0].text, "looks healthy");
        assert_eq!(g.stage_notes[1].stage, "Inoculated");
        assert!(add_note(&g, None, "   ", now()).is_err());
    }

    #[test]
    fn photos_attach_under_stage() {
        let mut g = grow("g1", "Fruiting", "Bulk", "Active");
        add_photo(&g, None, "photos/pins.jpg", Some("first pins"), now())
            .unwrap()
            .apply(&mut g);
        assert_eq!(g.stage_photos[0].stage, "Fruiting");
        assert_eq!(g.stage_photos[0].caption.as_deref(), Some("first pins"));
    }

    #[test]
    fn edits_validate_cost_and_storable_type() {
        let g = grow("g1", "Inoculated", "Agar", "Stored");
        let bad_cost = FieldEdits {
            cost: Some(-3.0),
            ..FieldEdits::default()
        };
        assert!(matches!(
            edit_fields(&g, &bad_cost, now()),
            Err(MycoError::InvalidCost(_))
        ));
        let to_bulk = FieldEdits {
            grow_type: Some("bulk".into()),
            ..FieldEdits::default()
        };
        assert!(matches!(
            edit_fields(&g, &to_bulk, now()),
            Err(MycoError::StoreNotAllowed { .. })
        ));
        assert_eq!(edit_fields(&g, &FieldEdits::default(), now()).unwrap(), None);
    }

    #[test]
    fn new_grow_starts_inoculated_and_active() {
        let input = NewGrow {
            strain: " Golden Teacher ".into(),
            grow_type: "monotub".into(),
            cost: Some(42.5),
            ..NewGrow::default()
        };
        let g = new_grow("g-1234abcd".into(), input, now()).unwrap();
        assert_eq!(g.strain, "Golden Teacher");
        assert_eq!(g.grow_type, "Bulk");
        assert_eq!(g.stage_kind(), Stage::Inoculated);
        assert_eq!(g.status_kind(), Status::Active);
        assert_eq!(g.created_at, Some(now()));
        assert_eq!(g.stage_date(Stage::Inoculated), Some(now()));
    }

    #[test]
    fn new_grow_rejects_blank_strain_and_id() {
        let input = NewGrow {
            strain: "GT".into(),
            ..NewGrow::default()
        };
        assert!(new_grow(String::new(), input, now()).is_err());
        assert!(new_grow("g-1".into(), NewGrow::default(), now()).is_err());
    }
}
