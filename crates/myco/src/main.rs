mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::RuntimeContext;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("MYCO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);
    let ctx = RuntimeContext::from_global_args(&cli.global);

    let result = match &cli.command {
        Commands::Init => commands::init::run(&ctx),
        Commands::New(args) => commands::new::run(&ctx, args),
        Commands::List(args) => commands::list::run(&ctx, args),
        Commands::Show(args) => commands::show::run(&ctx, args),
        Commands::Advance(args) => commands::stage::advance(&ctx, args),
        Commands::Stage(args) => commands::stage::set(&ctx, args),
        Commands::Archive(args) => commands::status::archive(&ctx, args),
        Commands::Store(args) => commands::status::store(&ctx, args),
        Commands::Harvest(args) => commands::status::harvest(&ctx, args),
        Commands::Flush(args) => commands::flush::run(&ctx, args),
        Commands::Note(args) => commands::attach::note(&ctx, args),
        Commands::Photo(args) => commands::attach::photo(&ctx, args),
        Commands::Edit(args) => commands::edit::run(&ctx, args),
        Commands::Delete(args) => commands::delete::run(&ctx, args),
        Commands::Strain(args) => commands::strain::run(&ctx, args),
        Commands::Supply(args) => commands::supply::run(&ctx, args),
        Commands::Analytics(args) => commands::analytics::run(&ctx, args),
        Commands::Remind(args) => commands::remind::run(&ctx, args),
    };

    if let Err(e) = result {
        if ctx.json {
            output::output_json_error(cli.command.name(), &format!("{e:#}"));
        } else {
            output::print_error(&format!("Error: {e:#}"));
        }
        std::process::exit(1);
    }
}
