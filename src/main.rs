use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use std::io;
use std::process;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use vmsync::cli::{Cli, Commands};
use vmsync::commands::{clean::CleanOptions, setup::SetupOptions};
use vmsync::remote::ToolExit;
use vmsync::{VmsyncContext, commands, output};

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        // A failed external tool hands its own exit code back to the shell
        let code = e
            .chain()
            .find_map(|cause| cause.downcast_ref::<ToolExit>())
            .map_or(1, ToolExit::exit_code);
        process::exit(code);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    output::set_verbosity(output::verbosity_from_flags(cli.verbose, cli.quiet));

    if let Commands::Completion { shell } = cli.command {
        print_completions(shell, &mut Cli::command());
        return Ok(());
    }

    let ctx = if matches!(cli.command, Commands::Setup { .. }) {
        // setup provisions the current directory, never a parent project
        let cwd = std::env::current_dir()?;
        let mut ctx = VmsyncContext::discover(&cwd)?;
        ctx.project_root = cwd;
        ctx
    } else {
        VmsyncContext::new()?
    };

    match cli.command {
        Commands::Setup {
            host,
            remote_dir,
            port,
            name,
            force,
        } => commands::setup::execute(
            &ctx,
            &SetupOptions {
                host,
                remote_dir,
                port,
                name,
                force,
            },
        )?,
        Commands::Add { paths, force } => commands::add::execute(&ctx, &paths, force)?,
        Commands::Remove { paths } => commands::remove::execute(&ctx, &paths)?,
        Commands::AddExcluded { patterns } => commands::exclude::add(&ctx, &patterns)?,
        Commands::RemoveExcluded { patterns } => commands::exclude::remove(&ctx, &patterns)?,
        Commands::Status { short } => commands::status::execute(&ctx, short)?,
        Commands::LsFiles => commands::ls_files::execute(&ctx)?,
        Commands::Push { dry_run, delete } => commands::push::execute(&ctx, dry_run, delete)?,
        Commands::Clean {
            dry_run,
            force,
            keep_remote,
            local_only,
        } => commands::clean::execute(
            &ctx,
            CleanOptions {
                dry_run,
                force,
                keep_remote,
                local_only,
            },
        )?,
        Commands::Config {
            key,
            value,
            unset,
            list,
        } => commands::config::execute(&ctx, key.as_deref(), value.as_deref(), unset, list)?,
        Commands::Completion { .. } => {}
    }

    Ok(())
}

/// Initialize logging; `RUST_LOG` overrides the verbosity flag
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vmsync=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
