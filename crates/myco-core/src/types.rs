use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::normalize;

// ── Enums ──────────────────────────────────────────────────────────────────

/// Cultivation phase of a grow.
///
/// Stored as free text; [`Stage::normalize`] is the only place that text is
/// interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    Inoculated,
    Colonizing,
    Colonized,
    Fruiting,
    Harvested,
    Consumed,
    Contaminated,
    Other,
}

impl Stage {
    /// The linear progression offered by "advance".
    pub const FLOW: [Stage; 6] = [
        Stage::Inoculated,
        Stage::Colonizing,
        Stage::Colonized,
        Stage::Fruiting,
        Stage::Harvested,
        Stage::Consumed,
    ];

    pub fn normalize(text: &str) -> Self {
        let s = text.trim().to_lowercase();
        if s.starts_with("inoc") {
            Self::Inoculated
        } else if s.contains("colonizing") {
            Self::Colonizing
        } else if s.contains("colonized") {
            Self::Colonized
        } else if s.contains("fruit") {
            Self::Fruiting
        } else if s.contains("harvest") {
            Self::Harvested
        } else if s.contains("consum") {
            Self::Consumed
        } else if s.contains("contam") {
            Self::Contaminated
        } else {
            Self::Other
        }
    }

    /// Next stage in [`Stage::FLOW`], if any.
    pub fn next(self) -> Option<Self> {
        let idx = Self::FLOW.iter().position(|s| *s == self)?;
        Self::FLOW.get(idx + 1).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inoculated => "Inoculated",
            Self::Colonizing => "Colonizing",
            Self::Colonized => "Colonized",
            Self::Fruiting => "Fruiting",
            Self::Harvested => "Harvested",
            Self::Consumed => "Consumed",
            Self::Contaminated => "Contaminated",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Active,
    Archived,
    Stored,
    Contaminated,
}

impl Status {
    /// Unknown text counts as `Active`.
    pub fn normalize(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "archived" => Self::Archived,
            "stored" => Self::Stored,
            "contaminated" => Self::Contaminated,
            _ => Self::Active,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Archived => "Archived",
            Self::Stored => "Stored",
            Self::Contaminated => "Contaminated",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrowType {
    Agar,
    #[serde(rename = "LC")]
    Lc,
    #[serde(rename = "Grain Jar")]
    GrainJar,
    Bulk,
    Other,
}

impl GrowType {
    pub fn normalize(text: &str) -> Self {
        let s = text.trim().to_lowercase();
        let words: Vec<&str> = s.split(|c: char| !c.is_alphanumeric()).collect();
        if s.contains("agar") {
            Self::Agar
        } else if s.contains("bulk") || words.iter().any(|w| w.ends_with("tub")) {
            Self::Bulk
        } else if s.contains("liquid") || words.contains(&"lc") {
            Self::Lc
        } else if s.contains("grain") {
            Self::GrainJar
        } else if words.iter().any(|w| *w == "bag" || *w == "bags") {
            Self::Bulk
        } else {
            Self::Other
        }
    }

    /// Cultures that can be put into storage.
    pub fn is_storable(&self) -> bool {
        matches!(self, Self::Agar | Self::Lc)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agar => "Agar",
            Self::Lc => "LC",
            Self::GrainJar => "Grain Jar",
            Self::Bulk => "Bulk",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for GrowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Supporting Types ───────────────────────────────────────────────────────

/// One harvest event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Flush {
    #[serde(deserialize_with = "normalize::number_or_zero")]
    pub wet: f64,
    #[serde(deserialize_with = "normalize::number_or_zero")]
    pub dry: f64,
    #[serde(
        deserialize_with = "normalize::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        deserialize_with = "normalize::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<DateTime<Utc>>,
}

impl Flush {
    pub fn zero(created_at: Option<DateTime<Utc>>) -> Self {
        Self {
            created_at,
            ..Self::default()
        }
    }

    /// When the flush was picked: explicit date, else creation time.
    pub fn when(&self) -> Option<DateTime<Utc>> {
        self.date.or(self.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipeItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supply_id: Option<String>,
    #[serde(
        deserialize_with = "normalize::lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecipeItem {
    /// Display name: explicit name, then the referenced supply's name, then
    /// the raw supply reference.
    pub fn label(&self, supplies: &[Supply]) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        let Some(supply_id) = self.supply_id.as_deref().filter(|s| !s.trim().is_empty()) else {
            return "Unknown".to_string();
        };
        supplies
            .iter()
            .find(|s| s.id == supply_id && !s.name.trim().is_empty())
            .map_or(supply_id, |s| s.name.as_str())
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageNote {
    pub stage: String,
    pub text: String,
    #[serde(default, deserialize_with = "normalize::lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagePhoto {
    pub stage: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, deserialize_with = "normalize::lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

// ── Grow ───────────────────────────────────────────────────────────────────

/// One cultivation batch.
///
/// Free-text `stage`, `status` and `type` are kept as stored; use
/// [`Grow::stage_kind`], [`Grow::status_kind`] and [`Grow::grow_kind`] to
/// read them. Keys this struct does not know about land in `extra` and are
/// written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Grow {
    pub id: String,
    pub strain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    #[serde(rename = "type")]
    pub grow_type: String,
    pub stage: String,
    pub status: String,
    #[serde(
        deserialize_with = "normalize::lenient_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub stage_dates: BTreeMap<String, DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flushes: Vec<Flush>,
    #[serde(
        deserialize_with = "normalize::lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub cost: Option<f64>,
    #[serde(
        deserialize_with = "normalize::lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub wet_yield: Option<f64>,
    #[serde(
        deserialize_with = "normalize::lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub dry_yield: Option<f64>,

    #[serde(
        deserialize_with = "normalize::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        deserialize_with = "normalize::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(
        deserialize_with = "normalize::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub inoculated_at: Option<DateTime<Utc>>,
    #[serde(
        deserialize_with = "normalize::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub inoculation_date: Option<DateTime<Utc>>,
    #[serde(
        rename = "created_on",
        deserialize_with = "normalize::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(
        deserialize_with = "normalize::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(
        deserialize_with = "normalize::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub archived_at: Option<DateTime<Utc>>,

    // Legacy marker flags
    #[serde(
        deserialize_with = "normalize::lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub archived: Option<bool>,
    #[serde(
        deserialize_with = "normalize::lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_archived: Option<bool>,
    #[serde(
        deserialize_with = "normalize::lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub consumed: Option<bool>,
    #[serde(
        deserialize_with = "normalize::lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_consumed: Option<bool>,
    #[serde(
        deserialize_with = "normalize::lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub contaminated: Option<bool>,
    #[serde(
        deserialize_with = "normalize::lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_contaminated: Option<bool>,
    #[serde(
        deserialize_with = "normalize::lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub finished: Option<bool>,
    #[serde(
        deserialize_with = "normalize::lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub active: Option<bool>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recipe_items: Vec<RecipeItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stage_notes: Vec<StageNote>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stage_photos: Vec<StagePhoto>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Grow {
    /// Deserialize a raw record, folding legacy aliases in first.
    pub fn from_value(mut raw: Value) -> Result<Self> {
        migrate_legacy_fields(&mut raw);
        Ok(serde_json::from_value(raw)?)
    }

    pub fn stage_kind(&self) -> Stage {
        Stage::normalize(&self.stage)
    }

    pub fn status_kind(&self) -> Status {
        Status::normalize(&self.status)
    }

    pub fn grow_kind(&self) -> GrowType {
        GrowType::normalize(&self.grow_type)
    }

    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }

    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(6) {
            Some((idx, _)) => &self.id[..idx],
            None => &self.id,
        }
    }

    /// Display label: abbreviation, then strain, then a short id.
    pub fn label(&self) -> String {
        [self.abbreviation.as_deref(), Some(self.strain.as_str())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or_else(|| self.short_id())
            .to_string()
    }

    pub fn stage_date(&self, stage: Stage) -> Option<DateTime<Utc>> {
        self.stage_dates.get(stage.as_str()).copied()
    }
}

/// Fold legacy field aliases into their canonical keys. The first present
/// alias wins; canonical keys that already hold a value are left alone.
pub fn migrate_legacy_fields(raw: &mut Value) {
    let Some(obj) = raw.as_object_mut() else {
        return;
    };

    adopt_alias(obj, "type", &["growType"]);
    adopt_alias(obj, "abbreviation", &["abbr"]);
    adopt_alias(obj, "inoculationDate", &["inoc"]);
    adopt_alias(obj, "archivedAt", &["archived_on", "archivedOn"]);

    if !obj.get("flushes").is_some_and(Value::is_array) {
        let nested = obj
            .get("harvest")
            .and_then(|h| h.get("flushes"))
            .filter(|f| f.is_array())
            .cloned();
        if let Some(flushes) = nested {
            obj.insert("flushes".to_string(), flushes);
        }
    }

    // Stage-date keys are canonicalized so lookups by `Stage::as_str` work.
    if let Some(Value::Object(dates)) = obj.get_mut("stageDates") {
        let keys: Vec<String> = dates.keys().cloned().collect();
        for key in keys {
            let canonical = Stage::normalize(&key);
            if canonical == Stage::Other || canonical.as_str() == key {
                continue;
            }
            if let Some(value) = dates.remove(&key) {
                dates
                    .entry(canonical.as_str().to_string())
                    .or_insert(value);
            }
        }
    }
}

fn adopt_alias(obj: &mut Map<String, Value>, canonical: &str, aliases: &[&str]) {
    let present = obj
        .get(canonical)
        .is_some_and(|v| !v.is_null() && v.as_str().is_none_or(|s| !s.is_empty()));
    if present {
        return;
    }
    for alias in aliases {
        if !obj.get(*alias).is_some_and(|v| !v.is_null()) {
            continue;
        }
        if let Some(v) = obj.remove(*alias) {
            obj.insert(canonical.to_string(), v);
        }
        return;
    }
}

// ── Strain ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Strain {
    pub name: String,
    #[serde(rename = "scientificName", skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<String>,
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Supply ─────────────────────────────────────────────────────────────────

/// A catalogued consumable. `cost` is the price per `unit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Supply {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "normalize::number_or_zero")]
    pub cost: f64,
    #[serde(deserialize_with = "normalize::number_or_zero")]
    pub quantity: f64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unit: String,
    #[serde(
        deserialize_with = "normalize::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Supply {
    /// Discrete units are consumed whole.
    pub fn is_count_unit(&self) -> bool {
        matches!(
            self.unit.trim().to_lowercase().as_str(),
            "count" | "plate" | "jar" | "dish" | "item"
        )
    }
}

// ── Config ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    pub enabled: bool,
    /// Time of day (UTC, `HH:MM`) at which reminders fall due.
    pub digest_time: String,
    /// Days a grow may sit in a stage before a reminder fires. Only
    /// `Inoculated` and `Fruiting` are consulted; zero disables.
    pub stage_max_days: BTreeMap<String, u32>,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            digest_time: "09:00".to_string(),
            stage_max_days: BTreeMap::from([
                (Stage::Inoculated.as_str().to_string(), 0),
                (Stage::Fruiting.as_str().to_string(), 0),
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MycoConfig {
    pub version: String,
    pub currency: String,
    pub reminders: ReminderSettings,
}

impl Default for MycoConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            currency: "$".to_string(),
            reminders: ReminderSettings::default(),
        }
    }
}
