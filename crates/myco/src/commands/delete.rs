use anyhow::Result;

use crate::cli::IdArgs;
use crate::context::RuntimeContext;
use crate::output::*;
use myco_core::storage;

pub fn run(ctx: &RuntimeContext, args: &IdArgs) -> Result<()> {
    ctx.load_config()?;
    let removed = storage::delete_grow(&ctx.grows_path(), &args.id)?;

    if ctx.json {
        output_json(&serde_json::json!({
            "success": true,
            "command": "delete",
            "id": removed.id,
        }));
    } else {
        print_success(&format!("Deleted grow {} ({}).", removed.id, removed.label()));
    }

    Ok(())
}
