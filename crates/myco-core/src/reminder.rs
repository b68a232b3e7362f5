//! Stage reminders: "has this culture taken?" checks after inoculation and
//! harvest-window nudges after fruiting starts.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::is_active_grow;
use crate::error::{MycoError, Result};
use crate::types::{Grow, ReminderSettings, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReminderKind {
    InoculationCheck,
    HarvestWindow,
}

impl ReminderKind {
    fn id_prefix(self) -> &'static str {
        match self {
            Self::InoculationCheck => "inoculation",
            Self::HarvestWindow => "harvest",
        }
    }

    fn stage(self) -> Stage {
        match self {
            Self::InoculationCheck => Stage::Inoculated,
            Self::HarvestWindow => Stage::Fruiting,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reminder {
    /// `{kind}:{growId}:{YYYY-MM-DDTHH:MM}`, stable across runs.
    pub id: String,
    pub kind: ReminderKind,
    pub grow_id: String,
    pub label: String,
    pub due_at: DateTime<Utc>,
    pub message: String,
}

fn digest_time(settings: &ReminderSettings) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(&settings.digest_time, "%H:%M").map_err(|_| {
        MycoError::ValidationError(format!(
            "reminders.digest_time must be HH:MM, got \"{}\"",
            settings.digest_time
        ))
    })
}

fn threshold(settings: &ReminderSettings, kind: ReminderKind) -> Option<u64> {
    settings
        .stage_max_days
        .get(kind.stage().as_str())
        .copied()
        .filter(|days| *days > 0)
        .map(u64::from)
}

fn due_at(base: DateTime<Utc>, days: u64, at: NaiveTime) -> Option<DateTime<Utc>> {
    let day = base.date_naive().checked_add_days(Days::new(days))?;
    Some(Utc.from_utc_datetime(&day.and_time(at)))
}

fn build(grow: &Grow, kind: ReminderKind, due: DateTime<Utc>, days: u64) -> Reminder {
    let label = grow.label();
    let message = match kind {
        ReminderKind::InoculationCheck => {
            format!(
                "{label}: {days} days since inoculation. Check for colonization or contamination."
            )
        }
        ReminderKind::HarvestWindow => {
            format!("{label}: {days} days in fruiting. Harvest window is open.")
        }
    };
    Reminder {
        id: format!(
            "{}:{}:{}",
            kind.id_prefix(),
            grow.id,
            due.format("%Y-%m-%dT%H:%M")
        ),
        kind,
        grow_id: grow.id.clone(),
        label,
        due_at: due,
        message,
    }
}

/// Every reminder scheduled for one grow, due or not.
pub fn schedule(grow: &Grow, settings: &ReminderSettings) -> Result<Vec<Reminder>> {
    if !settings.enabled || !grow.has_id() {
        return Ok(Vec::new());
    }
    let at = digest_time(settings)?;
    let mut out = Vec::new();

    if let Some(days) = threshold(settings, ReminderKind::InoculationCheck) {
        if grow.stage_kind() == Stage::Inoculated {
            if let Some(due) = grow
                .inoculation_date
                .or(grow.created_at)
                .and_then(|base| due_at(base, days, at))
            {
                out.push(build(grow, ReminderKind::InoculationCheck, due, days));
            }
        }
    }
    if let Some(days) = threshold(settings, ReminderKind::HarvestWindow) {
        if grow.stage_kind() == Stage::Fruiting {
            if let Some(due) = grow
                .stage_date(Stage::Fruiting)
                .and_then(|base| due_at(base, days, at))
            {
                out.push(build(grow, ReminderKind::HarvestWindow, due, days));
            }
        }
    }
    Ok(out)
}

/// Reminders for active grows that are due at `now` and not yet fired,
/// oldest first.
pub fn due_reminders(
    grows: &[Grow],
    settings: &ReminderSettings,
    now: DateTime<Utc>,
    fired: &FiredReminders,
) -> Result<Vec<Reminder>> {
    let mut due = Vec::new();
    for grow in grows.iter().filter(|g| is_active_grow(g)) {
        for reminder in schedule(grow, settings)? {
            if reminder.due_at <= now && !fired.contains(&reminder.id) {
                due.push(reminder);
            }
        }
    }
    due.sort_by(|a, b| a.due_at.cmp(&b.due_at).then_with(|| a.id.cmp(&b.id)));
    tracing::debug!(count = due.len(), "reminders due");
    Ok(due)
}

/// Ids of reminders already delivered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FiredReminders {
    ids: BTreeSet<String>,
}

impl FiredReminders {
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Ok(Self::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, format!("{content}\n"))?;
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn mark(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn settings(inoc: u32, fruit: u32) -> ReminderSettings {
        ReminderSettings {
            enabled: true,
            digest_time: "09:00".to_string(),
            stage_max_days: BTreeMap::from([
                ("Inoculated".to_string(), inoc),
                ("Fruiting".to_string(), fruit),
            ]),
        }
    }

    fn grow(id: &str, stage: &str) -> Grow {
        Grow {
            id: id.to_string(),
            strain: "GT".to_string(),
            stage: stage.to_string(),
            status: "Active".to_string(),
            ..Grow::default()
        }
    }

    #[test]
    fn inoculation_check_falls_due_at_digest_time() {
        let mut g = grow("g-1", "Inoculated");
        g.created_at = Some(at(2024, 1, 1, 18));
        let s = settings(14, 0);

        let fired = FiredReminders::default();
        assert!(due_reminders(&[g.clone()], &s, at(2024, 1, 15, 8), &fired).unwrap().is_empty());

        let due = due_reminders(&[g], &s, at(2024, 1, 15, 9), &fired).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, "inoculation:g-1:2024-01-15T09:00");
        assert_eq!(due[0].kind, ReminderKind::InoculationCheck);
    }

    #[test]
    fn inoculation_date_beats_created_at() {
        let mut g = grow("g-1", "Inoculated");
        g.created_at = Some(at(2024, 1, 10, 0));
        g.inoculation_date = Some(at(2024, 1, 1, 0));
        let planned = schedule(&g, &settings(3, 0)).unwrap();
        assert_eq!(planned[0].due_at, at(2024, 1, 4, 9));
    }

    #[test]
    fn harvest_window_from_fruiting_date() {
        let mut g = grow("g-2", "Fruiting");
        g.stage_dates.insert("Fruiting".into(), at(2024, 2, 1, 12));
        let fired = FiredReminders::default();
        let due = due_reminders(&[g], &settings(0, 7), at(2024, 2, 9, 0), &fired).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, "harvest:g-2:2024-02-08T09:00");
    }

    #[test]
    fn zero_threshold_and_disabled_config_yield_nothing() {
        let mut g = grow("g-1", "Inoculated");
        g.created_at = Some(at(2024, 1, 1, 0));
        let far = at(2030, 1, 1, 0);
        let fired = FiredReminders::default();

        assert!(due_reminders(&[g.clone()], &settings(0, 0), far, &fired).unwrap().is_empty());

        let mut off = settings(5, 5);
        off.enabled = false;
        assert!(due_reminders(&[g], &off, far, &fired).unwrap().is_empty());
    }

    #[test]
    fn inactive_grows_are_skipped() {
        let mut g = grow("g-1", "Fruiting");
        g.status = "Archived".to_string();
        g.stage_dates.insert("Fruiting".into(), at(2024, 2, 1, 0));
        let fired = FiredReminders::default();
        let due = due_reminders(&[g], &settings(0, 1), at(2030, 1, 1, 0), &fired).unwrap();
        assert!(due.is_empty());
    }

    #[test]
    fn fired_reminders_do_not_repeat() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("reminders-fired.json");
        let mut g = grow("g-1", "Inoculated");
        g.created_at = Some(at(2024, 1, 1, 0));
        let s = settings(1, 0);
        let now = at(2024, 1, 3, 0);

        let mut fired = FiredReminders::load(&path).unwrap();
        let due = due_reminders(&[g.clone()], &s, now, &fired).unwrap();
        assert_eq!(due.len(), 1);
        assert!(fired.mark(due[0].id.clone()));
        fired.save(&path).unwrap();

        let fired = FiredReminders::load(&path).unwrap();
        assert_eq!(fired.len(), 1);
        assert!(due_reminders(&[g], &s, now, &fired).unwrap().is_empty());
    }

    #[test]
    fn bad_digest_time_is_an_error() {
        let mut s = settings(1, 0);
        s.digest_time = "nine".to_string();
        let mut g = grow("g-1", "Inoculated");
        g.created_at = Some(at(2024, 1, 1, 0));
        assert!(matches!(schedule(&g, &s), Err(MycoError::ValidationError(_))));
    }
}
