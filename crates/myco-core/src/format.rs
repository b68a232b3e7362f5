use chrono::{DateTime, Utc};

use crate::analytics::{AnalyticsReport, yield_totals};
use crate::reminder::Reminder;
use crate::types::{Grow, Stage, Supply};

// ── Helpers ────────────────────────────────────────────────────────────────

pub fn format_money(amount: f64, currency: &str) -> String {
    format!("{currency}{amount:.2}")
}

pub fn format_grams(grams: f64) -> String {
    format!("{} g", grams.round() as i64)
}

pub fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Calendar month bucket, `YYYY-MM`.
pub fn month_key(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

pub fn format_time_ago(at: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(*at);

    let mins = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();

    if mins < 1 {
        "just now".to_string()
    } else if mins < 60 {
        format!("{mins}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else {
        format!("{days}d ago")
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() { "-" } else { s }
}

// ── Grows ──────────────────────────────────────────────────────────────────

/// One line per grow: id, label, type, stage, status, cost, yield.
pub fn format_grow_row(grow: &Grow, currency: &str) -> String {
    let totals = yield_totals(grow);
    let mut line = format!(
        "[{}] {}  {}  {} / {}",
        grow.id,
        truncate(&grow.label(), 24),
        or_dash(&grow.grow_type),
        or_dash(&grow.stage),
        or_dash(&grow.status),
    );
    if let Some(cost) = grow.cost {
        line.push_str(&format!("  {}", format_money(cost, currency)));
    }
    if totals.wet > 0.0 || totals.dry > 0.0 {
        line.push_str(&format!(
            "  {} wet / {} dry",
            format_grams(totals.wet),
            format_grams(totals.dry)
        ));
    }
    line
}

pub fn format_grow_list(grows: &[&Grow], currency: &str) -> String {
    if grows.is_empty() {
        return "No grows found. Run `myco new --strain <name>` to start one.".to_string();
    }
    let mut lines: Vec<String> = grows.iter().map(|g| format_grow_row(g, currency)).collect();
    lines.push(String::new());
    lines.push(format!("{} grow(s)", grows.len()));
    lines.join("\n")
}

fn timeline(grow: &Grow) -> Vec<(String, DateTime<Utc>)> {
    let mut entries: Vec<(String, DateTime<Utc>)> = Stage::FLOW
        .iter()
        .chain([Stage::Contaminated].iter())
        .filter_map(|s| grow.stage_date(*s).map(|d| (s.to_string(), d)))
        .collect();
    for (key, at) in &grow.stage_dates {
        if !entries.iter().any(|(k, _)| k == key) {
            entries.push((key.clone(), *at));
        }
    }
    entries
}

/// Multi-section detail view of one grow.
pub fn format_grow_detail(
    grow: &Grow,
    supplies: &[Supply],
    currency: &str,
    now: DateTime<Utc>,
) -> String {
    let title = format!("{} [{}]", grow.label(), grow.id);
    let underline = "=".repeat(title.chars().count());
    let mut lines = vec![title, underline];
    lines.push(format!("  Strain:  {}", or_dash(&grow.strain)));
    lines.push(format!("  Type:    {}", or_dash(&grow.grow_type)));
    lines.push(format!("  Stage:   {}", or_dash(&grow.stage)));
    lines.push(format!("  Status:  {}", or_dash(&grow.status)));
    if let Some(cost) = grow.cost {
        lines.push(format!("  Cost:    {}", format_money(cost, currency)));
    }
    if let Some(ref recipe) = grow.recipe_name {
        lines.push(format!("  Recipe:  {recipe}"));
    }
    if let Some(ref updated) = grow.updated_at {
        lines.push(format!("  Updated: {}", format_time_ago(updated, now)));
    }

    let stages = timeline(grow);
    if !stages.is_empty() {
        lines.push(String::new());
        lines.push("Timeline".to_string());
        for (stage, at) in stages {
            lines.push(format!("  {stage:<13} {}", format_date(&at)));
        }
    }

    if !grow.flushes.is_empty() {
        lines.push(String::new());
        lines.push("Flushes".to_string());
        for (i, f) in grow.flushes.iter().enumerate() {
            let when = f.when().map(|d| format_date(&d)).unwrap_or_default();
            lines.push(format!(
                "  #{:<3} {:>8} wet  {:>8} dry  {when}",
                i + 1,
                format_grams(f.wet),
                format_grams(f.dry)
            ));
        }
        let totals = yield_totals(grow);
        lines.push(format!(
            "  total {:>8} wet  {:>8} dry",
            format_grams(totals.wet),
            format_grams(totals.dry)
        ));
    }

    if !grow.recipe_items.is_empty() {
        lines.push(String::new());
        lines.push("Recipe items".to_string());
        for item in &grow.recipe_items {
            let amount = item.amount.map(|a| format!(" x{a}")).unwrap_or_default();
            lines.push(format!("  - {}{amount}", item.label(supplies)));
        }
    }

    if !grow.stage_notes.is_empty() {
        lines.push(String::new());
        lines.push("Notes".to_string());
        for note in &grow.stage_notes {
            let when = note.created_at.map(|d| format_date(&d)).unwrap_or_default();
            lines.push(format!("  [{}] {} {when}", note.stage, note.text));
        }
    }

    if !grow.stage_photos.is_empty() {
        lines.push(String::new());
        lines.push("Photos".to_string());
        for photo in &grow.stage_photos {
            let caption = photo
                .caption
                .as_ref()
                .map(|c| format!(" \"{c}\""))
                .unwrap_or_default();
            lines.push(format!("  [{}] {}{caption}", photo.stage, photo.path));
        }
    }

    lines.join("\n")
}

// ── Analytics ──────────────────────────────────────────────────────────────

fn section(lines: &mut Vec<String>, header: &str, body: Vec<String>) {
    if body.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(header.to_string());
    lines.extend(body.into_iter().map(|l| format!("  {l}")));
}

fn days(n: Option<f64>) -> String {
    n.map(|d| format!("{d:.1}d")).unwrap_or_else(|| "-".to_string())
}

pub fn format_analytics(report: &AnalyticsReport, currency: &str) -> String {
    let o = &report.overview;
    let mut lines = vec!["Grow Analytics".to_string(), "==============".to_string()];
    lines.push(format!("  Active grows:    {}", o.total_active));
    lines.push(format!("  Strains:         {}", o.unique_strains));
    lines.push(format!(
        "  Running cost:    {}",
        format_money(o.running_cost, currency)
    ));
    lines.push(format!("  Average age:     {}d", o.avg_age_days));

    section(
        &mut lines,
        "Stage distribution",
        report
            .stage_distribution
            .iter()
            .map(|s| format!("{:<14} {}", s.name, s.count))
            .collect(),
    );
    section(
        &mut lines,
        "Average yield per strain",
        report
            .avg_yield_per_strain
            .iter()
            .map(|s| {
                format!(
                    "{:<24} {} wet / {} dry  ({} grows)",
                    s.name,
                    format_grams(s.avg_wet),
                    format_grams(s.avg_dry),
                    s.count
                )
            })
            .collect(),
    );
    section(
        &mut lines,
        "Cost per grow",
        report
            .cost_per_grow
            .iter()
            .map(|c| format!("{:<24} {}", c.name, format_money(c.cost, currency)))
            .collect(),
    );
    section(
        &mut lines,
        "Supply usage",
        report
            .supply_usage
            .iter()
            .map(|s| format!("{:<24} {}", s.name, s.count))
            .collect(),
    );
    section(
        &mut lines,
        "Recipe usage",
        report
            .recipe_usage
            .iter()
            .map(|r| {
                format!(
                    "{:<24} {}x  avg {}",
                    r.name,
                    r.count,
                    format_money(r.avg_cost, currency)
                )
            })
            .collect(),
    );
    section(
        &mut lines,
        "Stage transitions",
        report
            .stage_transitions
            .iter()
            .map(|m| format!("{}  {}", m.month, m.count))
            .collect(),
    );
    section(
        &mut lines,
        "Contamination rate",
        report
            .contamination_rate
            .iter()
            .map(|c| {
                format!(
                    "{:<24} {:.0}% ({}/{})",
                    c.name, c.rate, c.contaminated, c.total
                )
            })
            .collect(),
    );
    section(
        &mut lines,
        "Median days between stages (inoc>colonized / colonized>fruiting / fruiting>harvest)",
        report
            .time_to_stage
            .iter()
            .map(|t| {
                format!(
                    "{:<24} {} / {} / {}",
                    t.name,
                    days(t.inoculated_to_colonized),
                    days(t.colonized_to_fruiting),
                    days(t.fruiting_to_harvested)
                )
            })
            .collect(),
    );
    section(
        &mut lines,
        "Throughput (started / harvested)",
        report
            .throughput
            .iter()
            .map(|t| format!("{}  {} / {}", t.month, t.started, t.harvested))
            .collect(),
    );
    section(
        &mut lines,
        "Harvests",
        report
            .harvest_yields
            .iter()
            .map(|h| {
                format!(
                    "{:<24} {} wet / {} dry",
                    h.name,
                    format_grams(h.wet),
                    format_grams(h.dry)
                )
            })
            .collect(),
    );

    lines.join("\n")
}

// ── Reminders ──────────────────────────────────────────────────────────────

pub fn format_reminders(reminders: &[Reminder], now: DateTime<Utc>) -> String {
    if reminders.is_empty() {
        return "No reminders due.".to_string();
    }
    reminders
        .iter()
        .map(|r| {
            format!(
                "- [{}] {} (due {})",
                r.grow_id,
                r.message,
                format_time_ago(&r.due_at, now)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{AnalyticsOptions, analyze};
    use crate::types::{Flush, RecipeItem, StageNote};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn sample() -> Grow {
        let mut g = Grow {
            id: "g-1a2b3c4d".to_string(),
            strain: "Golden Teacher".to_string(),
            abbreviation: Some("GT1".to_string()),
            grow_type: "Bulk".to_string(),
            stage: "Fruiting".to_string(),
            status: "Active".to_string(),
            cost: Some(12.5),
            ..Grow::default()
        };
        g.stage_dates
            .insert("Inoculated".into(), Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap());
        g.stage_dates
            .insert("Fruiting".into(), Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap());
        g.flushes = vec![Flush {
            wet: 250.4,
            dry: 25.0,
            ..Flush::default()
        }];
        g.stage_notes = vec![StageNote {
            stage: "Fruiting".into(),
            text: "pins everywhere".into(),
            created_at: None,
        }];
        g
    }

    #[test]
    fn money_and_grams() {
        assert_eq!(format_money(12.5, "$"), "$12.50");
        assert_eq!(format_money(0.0, "€"), "€0.00");
        assert_eq!(format_grams(250.6), "251 g");
    }

    #[test]
    fn dates_and_months() {
        let at = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 0).unwrap();
        assert_eq!(format_date(&at), "2024-02-29");
        assert_eq!(month_key(&at), "2024-02");
    }

    #[test]
    fn time_ago_buckets() {
        let n = now();
        assert_eq!(format_time_ago(&n, n), "just now");
        assert_eq!(format_time_ago(&(n - Duration::minutes(5)), n), "5m ago");
        assert_eq!(format_time_ago(&(n - Duration::hours(3)), n), "3h ago");
        assert_eq!(format_time_ago(&(n - Duration::days(2)), n), "2d ago");
    }

    #[test]
    fn row_shows_label_stage_and_yield() {
        let row = format_grow_row(&sample(), "$");
        assert!(row.starts_with("[g-1a2b3c4d] GT1"));
        assert!(row.contains("Fruiting / Active"));
        assert!(row.contains("$12.50"));
        assert!(row.contains("250 g wet / 25 g dry"));
    }

    #[test]
    fn empty_list_hint() {
        assert!(format_grow_list(&[], "$").contains("myco new"));
    }

    #[test]
    fn detail_has_sections_in_order() {
        let out = format_grow_detail(&sample(), &[], "$", now());
        let timeline = out.find("Timeline").unwrap();
        let flushes = out.find("Flushes").unwrap();
        let notes = out.find("Notes").unwrap();
        assert!(timeline < flushes && flushes < notes);
        assert!(out.find("Inoculated").unwrap() < out.find("Fruiting      2024-05-10").unwrap());
        assert!(out.contains("pins everywhere"));
    }

    #[test]
    fn detail_names_catalogued_items() {
        let mut g = sample();
        g.recipe_items = vec![RecipeItem {
            supply_id: Some("s-rye".into()),
            amount: Some(2.0),
            ..RecipeItem::default()
        }];
        let supplies = [Supply {
            id: "s-rye".into(),
            name: "Rye berries".into(),
            ..Supply::default()
        }];
        let out = format_grow_detail(&g, &supplies, "$", now());
        assert!(out.contains("  - Rye berries x2"));
    }

    #[test]
    fn analytics_text_includes_overview() {
        let mut g = sample();
        g.recipe_name = Some("CVG".into());
        let report = analyze(&[g], &[], &[], &AnalyticsOptions::default(), now());
        let out = format_analytics(&report, "$");
        assert!(out.contains("Active grows:    1"));
        assert!(out.contains("Running cost:    $12.50"));
        assert!(out.contains("Fruiting"));
        assert!(out.contains("Recipe usage"));
        assert!(out.contains("avg $12.50"));
    }

    #[test]
    fn no_reminders_message() {
        assert_eq!(format_reminders(&[], now()), "No reminders due.");
    }
}
