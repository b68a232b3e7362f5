use anyhow::Result;
use chrono::Utc;

use crate::cli::EditArgs;
use crate::context::RuntimeContext;
use myco_core::config;
use myco_core::lifecycle::{self, FieldEdits};

use super::{patch_grow, report_patch};

pub fn run(ctx: &RuntimeContext, args: &EditArgs) -> Result<()> {
    if let Some(ref strain) = args.strain {
        config::validate_strain_name(strain)?;
    }
    let edits = FieldEdits {
        strain: args.strain.clone(),
        abbreviation: args.abbr.clone(),
        grow_type: args.grow_type.clone(),
        cost: args.cost,
        recipe_name: args.recipe.clone(),
    };
    let now = Utc::now();

    let patched = patch_grow(ctx, &args.id, |g| lifecycle::edit_fields(g, &edits, now))?;
    report_patch(
        ctx,
        "edit",
        &patched,
        &format!("Updated {}.", patched.grow.label()),
        "Nothing to change; pass at least one field flag.",
    )
}
