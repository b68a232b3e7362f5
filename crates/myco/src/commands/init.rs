use anyhow::Result;

use crate::context::RuntimeContext;
use crate::output::*;

pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let already = myco_core::config::get_myco_dir(&ctx.cwd).is_dir();
    myco_core::config::init_myco_dir(&ctx.cwd)?;

    if ctx.json {
        output_json(&serde_json::json!({
            "success": true,
            "command": "init",
            "created": !already,
        }));
    } else if already {
        print_warning(".myco/ already exists; missing files were restored.");
    } else {
        print_success("Initialized .myco/ directory.");
    }

    Ok(())
}
