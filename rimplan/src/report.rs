// SPDX-License-Identifier: MIT

use colored::Colorize;
use rimslice::region::FreeSpaceTable;
use rimslice::{SliceSession, TargetAttrs};

use crate::utils::pretty_sectors;

pub fn print_table(session: &SliceSession) {
    println!("{}", session.table());
}

pub fn print_free(free: &FreeSpaceTable) {
    if free.is_empty() {
        println!("  {}", "no free space left in partition".yellow());
        return;
    }
    println!("{free}");
    println!(
        "  {} free in {} region(s)",
        pretty_sectors(free.total_free()).bold(),
        free.len()
    );
}

/// One status line for the finalized layout.
pub fn print_outcome(session: &SliceSession, install_slot: u8) {
    let layout = if session.uses_default_layout() {
        "default layout".cyan()
    } else {
        "explicit layout".cyan()
    };
    println!(
        "{} {} on {}, install slice {}",
        "ok".green().bold(),
        layout,
        session.disk_name().bold(),
        install_slot
    );
    if session.swap_failed() {
        println!(
            "{} slice 1 could not be used as swap",
            "warning".yellow().bold()
        );
    }
}

/// Target attributes as TOML.
pub fn render_attrs(attrs: &TargetAttrs) -> anyhow::Result<String> {
    Ok(toml::to_string(attrs)?)
}
