pub mod analytics;
pub mod attach;
pub mod delete;
pub mod edit;
pub mod flush;
pub mod init;
pub mod list;
pub mod new;
pub mod remind;
pub mod show;
pub mod stage;
pub mod status;
pub mod strain;
pub mod supply;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, Utc};

use myco_core::error::MycoError;
use myco_core::lifecycle::GrowPatch;
use myco_core::normalize::parse_str;
use myco_core::storage::{self, Patched};
use myco_core::types::{Grow, Stage};

use crate::context::RuntimeContext;
use crate::output::*;

pub(crate) fn parse_datetime_arg(flag: &str, value: &str) -> Result<DateTime<Utc>> {
    match parse_str(value) {
        Some(dt) => Ok(dt),
        None => bail!(
            "--{flag}: could not parse \"{value}\" as a date (use YYYY-MM-DD or RFC 3339)"
        ),
    }
}

pub(crate) fn parse_day_arg(flag: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("--{flag}: expected YYYY-MM-DD, got \"{value}\""))
}

/// Parse a user-supplied stage name into a known stage.
pub(crate) fn parse_stage_arg(value: &str) -> Result<Stage> {
    match Stage::normalize(value) {
        Stage::Other => Err(MycoError::ValidationError(format!(
            "unknown stage \"{value}\" (expected one of Inoculated, Colonizing, Colonized, Fruiting, Harvested, Consumed, Contaminated)"
        ))
        .into()),
        stage => Ok(stage),
    }
}

/// Run one lifecycle operation against a stored grow under the data-file lock.
pub(crate) fn patch_grow<F>(ctx: &RuntimeContext, id: &str, op: F) -> Result<Patched>
where
    F: FnOnce(&Grow) -> myco_core::error::Result<Option<GrowPatch>>,
{
    ctx.load_config()?;
    Ok(storage::apply_patch(&ctx.grows_path(), id, op)?)
}

/// Print the outcome of [`patch_grow`] in either output mode.
pub(crate) fn report_patch(
    ctx: &RuntimeContext,
    command: &str,
    patched: &Patched,
    changed_msg: &str,
    unchanged_msg: &str,
) -> Result<()> {
    let grow = &patched.grow;
    if ctx.json {
        let update = patched.patch.as_ref().map(GrowPatch::to_json).transpose()?;
        output_json(&serde_json::json!({
            "success": true,
            "command": command,
            "id": grow.id,
            "changed": patched.patch.is_some(),
            "update": update,
            "grow": grow,
        }));
    } else if patched.patch.is_some() {
        print_success(changed_msg);
    } else {
        print_warning(unchanged_msg);
    }
    Ok(())
}
