// SPDX-License-Identifier: MIT

use anyhow::Context;
use clap::{Parser, Subcommand};
use rimplan::{
    log_info, log_normal, log_verbose,
    manifest::Manifest,
    report,
    utils::{LogLevel, init_tracing, set_log_level},
};
use rimslice::TargetAttrs;
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(name = "rimplan", version, about = "VTOC slice planner", long_about = None)]
struct Cli {
    /// Print every step, and library debug events
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print errors and results
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a manifest, finalize the layout and print the target attributes
    Plan {
        /// Manifest path
        #[arg(short, long, default_value = "manifest.toml")]
        manifest: PathBuf,

        /// Write attributes to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Finalize and report, but don't export attributes
        #[arg(long)]
        dry_run: bool,
    },
    /// Apply a manifest's actions and print the remaining free space
    Free {
        /// Manifest path
        #[arg(short, long, default_value = "manifest.toml")]
        manifest: PathBuf,
    },
}

fn load(path: &Path) -> anyhow::Result<Manifest> {
    let manifest = Manifest::from_file(path)?;
    manifest.validate()?;
    log_info!("Loaded manifest: {}", path.display());
    log_verbose!("{manifest}");
    Ok(manifest)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = LogLevel::from_flags(cli.verbose, cli.quiet);
    set_log_level(level);
    init_tracing(level);

    match cli.command {
        Commands::Plan {
            manifest,
            output,
            dry_run,
        } => {
            let manifest = load(&manifest)?;
            let mut session = manifest.open_session()?;
            manifest.apply_actions(&mut session)?;

            session
                .finalize(manifest.install.slice)
                .context("finalizing slice layout")?;
            let (install_slot, disk) = session.device_target_info()?;
            log_info!("Install target: {disk} slice {install_slot}");
            report::print_table(&session);
            report::print_outcome(&session, install_slot);

            if dry_run {
                log_normal!("Dry run mode: no attributes exported.");
                return Ok(());
            }

            let mut attrs = TargetAttrs::new();
            session.export_target_attrs(&mut attrs)?;
            let text = report::render_attrs(&attrs)?;
            match output {
                Some(path) => {
                    fs::write(&path, text)
                        .with_context(|| format!("writing {}", path.display()))?;
                    log_info!("Attributes written to: {}", path.display());
                }
                None => println!("{text}"),
            }
        }
        Commands::Free { manifest } => {
            let manifest = load(&manifest)?;
            let mut session = manifest.open_session()?;
            manifest.apply_actions(&mut session)?;

            log_verbose!("Sorted slices:\n{}", session.sorted_regions());
            let free = session.free_space()?;
            report::print_free(&free);
        }
    }

    Ok(())
}
