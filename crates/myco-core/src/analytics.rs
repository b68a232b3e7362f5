//! Active/inactive classification and grouped summary statistics.
//!
//! Everything in here is a pure function over a slice of grows. Month
//! buckets are UTC calendar months (`YYYY-MM`).

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::format::month_key;
use crate::types::{Grow, Stage, Status, Supply};

const ACTIVE_STAGES: [Stage; 4] = [
    Stage::Inoculated,
    Stage::Colonizing,
    Stage::Colonized,
    Stage::Fruiting,
];

const SUPPLY_USAGE_LIMIT: usize = 10;

// ── Classification ─────────────────────────────────────────────────────────

fn lower(s: &str) -> String {
    s.trim().to_lowercase()
}

fn is_archived_marked(g: &Grow) -> bool {
    g.archived == Some(true)
        || g.is_archived == Some(true)
        || g.archived_at.is_some()
        || lower(&g.stage) == "archived"
        || g.status_kind() == Status::Archived
}

fn is_consumed_marked(g: &Grow) -> bool {
    g.consumed == Some(true)
        || g.is_consumed == Some(true)
        || lower(&g.status) == "consumed"
        || lower(&g.stage) == "consumed"
}

/// Explicit contamination markers on either field.
pub fn is_contaminated(g: &Grow) -> bool {
    g.contaminated == Some(true)
        || g.is_contaminated == Some(true)
        || g.status_kind() == Status::Contaminated
        || lower(&g.stage) == "contaminated"
}

fn is_finished_marked(g: &Grow) -> bool {
    let stage = lower(&g.stage);
    g.finished == Some(true) || stage == "harvested" || stage == "finished"
}

/// Whether a grow is still in progress.
///
/// Precedence is fixed: any negative marker wins, then an explicit
/// `active: true`, then the stage decides.
pub fn is_active_grow(g: &Grow) -> bool {
    if is_archived_marked(g)
        || is_consumed_marked(g)
        || is_contaminated(g)
        || is_finished_marked(g)
        || g.active == Some(false)
    {
        return false;
    }
    if g.active == Some(true) {
        return true;
    }
    ACTIVE_STAGES.contains(&g.stage_kind())
}

/// Split into (active, inactive), preserving order.
pub fn partition_grows(grows: &[Grow]) -> (Vec<&Grow>, Vec<&Grow>) {
    grows.iter().partition(|g| is_active_grow(g))
}

/// Merge separately loaded active and archived lists by id. An archived copy
/// replaces a non-archived one with the same id.
pub fn merge_grows(grows: &[Grow], archived: &[Grow]) -> Vec<Grow> {
    if archived.is_empty() {
        return grows.to_vec();
    }
    let mut order: Vec<String> = Vec::new();
    let mut by_id: HashMap<String, Grow> = HashMap::new();
    for g in grows.iter().chain(archived) {
        match by_id.get(&g.id) {
            None => {
                order.push(g.id.clone());
                by_id.insert(g.id.clone(), g.clone());
            }
            Some(prev) if g.archived == Some(true) && prev.archived != Some(true) => {
                by_id.insert(g.id.clone(), g.clone());
            }
            Some(_) => {}
        }
    }
    order.into_iter().filter_map(|id| by_id.remove(&id)).collect()
}

// ── Filtering ──────────────────────────────────────────────────────────────

/// Date a grow started, by priority.
pub fn reference_date(g: &Grow) -> Option<DateTime<Utc>> {
    g.stage_date(Stage::Inoculated)
        .or(g.inoculated_at)
        .or(g.inoculation_date)
        .or(g.created_at)
        .or(g.created_on)
        .or(g.start_date)
}

/// Strain and inclusive date-range filter.
#[derive(Debug, Clone, Default)]
pub struct GrowFilter {
    pub strain: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl GrowFilter {
    fn from_bound(&self) -> Option<DateTime<Utc>> {
        self.from
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| Utc.from_utc_datetime(&dt))
    }

    fn to_bound(&self) -> Option<DateTime<Utc>> {
        self.to
            .and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999))
            .map(|dt| Utc.from_utc_datetime(&dt))
    }

    pub fn matches(&self, g: &Grow) -> bool {
        if let Some(ref want) = self.strain {
            if g.strain.trim() != want.trim() {
                return false;
            }
        }
        let from = self.from_bound();
        let to = self.to_bound();
        if from.is_none() && to.is_none() {
            return true;
        }
        let Some(d) = reference_date(g) else {
            return false;
        };
        from.is_none_or(|f| d >= f) && to.is_none_or(|t| d <= t)
    }
}

// ── Aggregations ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct YieldTotals {
    pub wet: f64,
    pub dry: f64,
}

/// Sum of all flushes. Legacy scalar yields fill in a component only when
/// the flush sum for it is zero.
pub fn yield_totals(g: &Grow) -> YieldTotals {
    let mut t = g
        .flushes
        .iter()
        .fold(YieldTotals::default(), |mut acc, f| {
            acc.wet += f.wet;
            acc.dry += f.dry;
            acc
        });
    if t.wet == 0.0 {
        t.wet = g.wet_yield.unwrap_or(0.0);
    }
    if t.dry == 0.0 {
        t.dry = g.dry_yield.unwrap_or(0.0);
    }
    t
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: usize,
}

/// Grows per stage, in stage order. A blank stage is labelled `Active`.
pub fn stage_distribution(grows: &[&Grow]) -> Vec<NamedCount> {
    let mut counts: BTreeMap<(Stage, String), usize> = BTreeMap::new();
    for g in grows {
        let raw = g.stage.trim();
        let key = if raw.is_empty() {
            (Stage::Other, "Active".to_string())
        } else {
            match g.stage_kind() {
                Stage::Other => (Stage::Other, raw.to_string()),
                kind => (kind, kind.to_string()),
            }
        };
        *counts.entry(key).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((_, name), count)| NamedCount { name, count })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrainYield {
    pub name: String,
    pub avg_wet: f64,
    pub avg_dry: f64,
    /// Grows that produced anything; zero-yield grows are not counted.
    pub count: usize,
}

pub fn avg_yield_per_strain(grows: &[&Grow]) -> Vec<StrainYield> {
    let mut stats: BTreeMap<String, (f64, f64, usize)> = BTreeMap::new();
    for g in grows {
        let key = g.strain.trim();
        if key.is_empty() {
            continue;
        }
        let entry = stats.entry(key.to_string()).or_default();
        let t = yield_totals(g);
        if t.wet != 0.0 || t.dry != 0.0 {
            entry.0 += t.wet;
            entry.1 += t.dry;
            entry.2 += 1;
        }
    }
    stats
        .into_iter()
        .map(|(name, (wet, dry, count))| StrainYield {
            name,
            avg_wet: if count > 0 { wet / count as f64 } else { 0.0 },
            avg_dry: if count > 0 { dry / count as f64 } else { 0.0 },
            count,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowCost {
    pub id: String,
    pub name: String,
    pub cost: f64,
}

pub fn cost_per_grow(grows: &[&Grow]) -> Vec<GrowCost> {
    grows
        .iter()
        .map(|g| GrowCost {
            id: g.id.clone(),
            name: g.label(),
            cost: g.cost.unwrap_or(0.0),
        })
        .collect()
}

/// Most frequently used recipe items across grows, top ten.
/// Items that reference a catalogued supply are counted under its name.
pub fn supply_usage(grows: &[&Grow], supplies: &[Supply]) -> Vec<NamedCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for g in grows {
        for item in &g.recipe_items {
            *counts.entry(item.label(supplies)).or_default() += 1;
        }
    }
    let mut ranked: Vec<NamedCount> = counts
        .into_iter()
        .map(|(name, count)| NamedCount { name, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(SUPPLY_USAGE_LIMIT);
    ranked
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeUsage {
    pub name: String,
    pub count: usize,
    pub total_cost: f64,
    pub avg_cost: f64,
}

/// How often each named recipe was used, with its average grow cost.
/// Grows without a recipe name are skipped.
pub fn recipe_usage(grows: &[&Grow]) -> Vec<RecipeUsage> {
    let mut acc: HashMap<&str, (usize, f64)> = HashMap::new();
    for g in grows {
        let Some(name) = recipe_key(g) else {
            continue;
        };
        let entry = acc.entry(name).or_default();
        entry.0 += 1;
        entry.1 += g.cost.unwrap_or(0.0);
    }
    let mut rows: Vec<RecipeUsage> = acc
        .into_iter()
        .map(|(name, (count, total))| RecipeUsage {
            name: name.to_string(),
            count,
            total_cost: round2(total),
            avg_cost: round2(total / count as f64),
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    rows
}

fn recipe_key(g: &Grow) -> Option<&str> {
    g.recipe_name.as_deref().map(str::trim).filter(|n| !n.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthCount {
    pub month: String,
    pub count: usize,
}

/// Every recorded stage date, bucketed by month, oldest first.
pub fn stage_transitions(grows: &[&Grow]) -> Vec<MonthCount> {
    let mut per_month: BTreeMap<String, usize> = BTreeMap::new();
    for g in grows {
        for date in g.stage_dates.values() {
            *per_month.entry(month_key(date)).or_default() += 1;
        }
    }
    per_month
        .into_iter()
        .map(|(month, count)| MonthCount { month, count })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_active: usize,
    pub unique_strains: usize,
    /// Rounded to cents.
    pub running_cost: f64,
    /// Mean age in whole days over grows with a known start date.
    pub avg_age_days: i64,
}

pub fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

pub fn overview(active: &[&Grow], now: DateTime<Utc>) -> Overview {
    let unique_strains: BTreeSet<&str> = active
        .iter()
        .map(|g| match g.strain.trim() {
            "" => "Unknown",
            s => s,
        })
        .collect();
    let running_cost: f64 = active.iter().map(|g| g.cost.unwrap_or(0.0)).sum();
    let ages: Vec<f64> = active
        .iter()
        .filter_map(|g| reference_date(g))
        .map(|d| (now - d).num_milliseconds() as f64 / 86_400_000.0)
        .collect();
    let avg_age_days = if ages.is_empty() {
        0
    } else {
        (ages.iter().sum::<f64>() / ages.len() as f64).round() as i64
    };
    Overview {
        total_active: active.len(),
        unique_strains: unique_strains.len(),
        running_cost: round2(running_cost),
        avg_age_days,
    }
}

// ── Secondary breakdowns ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContaminationRate {
    pub name: String,
    pub total: usize,
    pub contaminated: usize,
    /// Percentage, 0–100.
    pub rate: f64,
}

/// Share of contaminated grows per strain, worst first.
/// What [`contamination_rate`] groups grows by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContaminationGroup {
    #[default]
    Strain,
    Recipe,
}

pub fn contamination_rate(grows: &[&Grow], group: ContaminationGroup) -> Vec<ContaminationRate> {
    let mut totals: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for g in grows {
        let key = match group {
            ContaminationGroup::Strain => match g.strain.trim() {
                "" => "Unknown",
                s => s,
            },
            ContaminationGroup::Recipe => recipe_key(g).unwrap_or("No recipe"),
        }
        .to_string();
        let entry = totals.entry(key).or_default();
        entry.0 += 1;
        if is_contaminated(g) {
            entry.1 += 1;
        }
    }
    let mut rows: Vec<ContaminationRate> = totals
        .into_iter()
        .map(|(name, (total, bad))| ContaminationRate {
            name,
            total,
            contaminated: bad,
            rate: if total > 0 {
                bad as f64 / total as f64 * 100.0
            } else {
                0.0
            },
        })
        .collect();
    rows.sort_by(|a, b| b.rate.total_cmp(&a.rate).then_with(|| a.name.cmp(&b.name)));
    rows
}

fn harvest_date(g: &Grow) -> Option<DateTime<Utc>> {
    g.stage_date(Stage::Harvested)
        .or_else(|| g.flushes.last().and_then(|f| f.when()))
}

fn diff_days(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    ((b - a).num_milliseconds() as f64 / 86_400_000.0).round().max(0.0)
}

fn median(mut xs: Vec<f64>) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    xs.sort_by(f64::total_cmp);
    let m = xs.len() / 2;
    Some(if xs.len() % 2 == 1 {
        xs[m]
    } else {
        (xs[m - 1] + xs[m]) / 2.0
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageTiming {
    pub name: String,
    pub inoculated_to_colonized: Option<f64>,
    pub colonized_to_fruiting: Option<f64>,
    pub fruiting_to_harvested: Option<f64>,
}

/// Median days between stage milestones, per strain.
pub fn time_to_stage(grows: &[&Grow]) -> Vec<StageTiming> {
    let mut buckets: BTreeMap<String, [Vec<f64>; 3]> = BTreeMap::new();
    for g in grows {
        let inoc = reference_date(g);
        let colon = g.stage_date(Stage::Colonized);
        let fruit = g.stage_date(Stage::Fruiting);
        let harvest = harvest_date(g);
        let key = match g.strain.trim() {
            "" => "Unknown".to_string(),
            s => s.to_string(),
        };
        let bucket = buckets.entry(key).or_default();
        if let (Some(a), Some(b)) = (inoc, colon) {
            bucket[0].push(diff_days(a, b));
        }
        if let (Some(a), Some(b)) = (colon, fruit) {
            bucket[1].push(diff_days(a, b));
        }
        if let (Some(a), Some(b)) = (fruit, harvest) {
            bucket[2].push(diff_days(a, b));
        }
    }
    buckets
        .into_iter()
        .map(|(name, [ic, cf, fh])| StageTiming {
            name,
            inoculated_to_colonized: median(ic),
            colonized_to_fruiting: median(cf),
            fruiting_to_harvested: median(fh),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Throughput {
    pub month: String,
    pub started: usize,
    pub harvested: usize,
}

/// Grows started vs harvested per month.
pub fn throughput(grows: &[&Grow]) -> Vec<Throughput> {
    let mut months: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for g in grows {
        if let Some(d) = reference_date(g) {
            months.entry(month_key(&d)).or_default().0 += 1;
        }
        if let Some(d) = harvest_date(g) {
            months.entry(month_key(&d)).or_default().1 += 1;
        }
    }
    months
        .into_iter()
        .map(|(month, (started, harvested))| Throughput {
            month,
            started,
            harvested,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarvestYield {
    pub id: String,
    pub name: String,
    pub wet: f64,
    pub dry: f64,
}

/// Wet/dry totals of finished grows that produced something.
pub fn harvest_yields(grows: &[&Grow]) -> Vec<HarvestYield> {
    grows
        .iter()
        .filter(|g| g.stage_kind() == Stage::Harvested || g.archived == Some(true))
        .filter_map(|g| {
            let t = yield_totals(g);
            (t.wet != 0.0 || t.dry != 0.0).then(|| HarvestYield {
                id: g.id.clone(),
                name: match g.strain.trim() {
                    "" => g.label(),
                    s => s.to_string(),
                },
                wet: t.wet,
                dry: t.dry,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldCostPoint {
    pub name: String,
    pub cost: f64,
    /// Dry weight when known, else wet.
    pub grams: f64,
}

pub fn yield_vs_cost(grows: &[&Grow]) -> Vec<YieldCostPoint> {
    grows
        .iter()
        .map(|g| {
            let t = yield_totals(g);
            YieldCostPoint {
                name: g.label(),
                cost: g.cost.unwrap_or(0.0),
                grams: if t.dry != 0.0 { t.dry } else { t.wet },
            }
        })
        .collect()
}

// ── Report ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct AnalyticsOptions {
    pub filter: GrowFilter,
    /// Run the per-grow breakdowns over inactive grows too. The overview and
    /// stage distribution always cover active grows only.
    pub include_inactive: bool,
    pub contamination_group: ContaminationGroup,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub overview: Overview,
    pub stage_distribution: Vec<NamedCount>,
    pub avg_yield_per_strain: Vec<StrainYield>,
    pub cost_per_grow: Vec<GrowCost>,
    pub supply_usage: Vec<NamedCount>,
    pub recipe_usage: Vec<RecipeUsage>,
    pub stage_transitions: Vec<MonthCount>,
    pub contamination_rate: Vec<ContaminationRate>,
    pub time_to_stage: Vec<StageTiming>,
    pub throughput: Vec<Throughput>,
    pub harvest_yields: Vec<HarvestYield>,
    pub yield_vs_cost: Vec<YieldCostPoint>,
}

pub fn analyze(
    grows: &[Grow],
    archived: &[Grow],
    supplies: &[Supply],
    options: &AnalyticsOptions,
    now: DateTime<Utc>,
) -> AnalyticsReport {
    let all = merge_grows(grows, archived);
    let filter = &options.filter;

    let active: Vec<&Grow> = all
        .iter()
        .filter(|g| is_active_grow(g) && filter.matches(g))
        .collect();
    let scoped: Vec<&Grow> = all
        .iter()
        .filter(|g| (options.include_inactive || is_active_grow(g)) && filter.matches(g))
        .collect();

    tracing::debug!(
        total = all.len(),
        active = active.len(),
        scoped = scoped.len(),
        "computing analytics"
    );

    AnalyticsReport {
        overview: overview(&active, now),
        stage_distribution: stage_distribution(&active),
        avg_yield_per_strain: avg_yield_per_strain(&scoped),
        cost_per_grow: cost_per_grow(&scoped),
        supply_usage: supply_usage(&scoped, supplies),
        recipe_usage: recipe_usage(&scoped),
        stage_transitions: stage_transitions(&scoped),
        contamination_rate: contamination_rate(&scoped, options.contamination_group),
        time_to_stage: time_to_stage(&scoped),
        throughput: throughput(&scoped),
        harvest_yields: harvest_yields(&scoped),
        yield_vs_cost: yield_vs_cost(&scoped),
    }
}
