// SPDX-License-Identifier: MIT

//! Install manifest: the target disk, the slices discovery found on it and
//! the edits to apply.

pub mod action;
pub mod disk;
pub mod error;
pub mod size;

pub use action::*;
pub use disk::*;
pub use error::*;
pub use size::*;

use anyhow::Context;
use rimslice::{NDKMAP, SessionOptions, SliceSession, utils::sep_u64};
use serde::Deserialize;
use std::{fs, path::Path};

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InstallSpec {
    #[serde(default = "default_true")]
    pub automated: bool,
    #[serde(default)]
    pub swap: Option<SwapSize>,
    /// Install slice id.
    #[serde(default)]
    pub slice: u8,
}

impl Default for InstallSpec {
    fn default() -> Self {
        Self {
            automated: true,
            swap: None,
            slice: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub disk: DiskSpec,
    #[serde(default)]
    pub install: InstallSpec,
    /// The enclosing fdisk partition is being deleted.
    #[serde(default)]
    pub invalidate: bool,
    #[serde(default)]
    pub slices: Vec<SliceSpec>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Manifest {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing manifest {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.disk.name.trim().is_empty() {
            return Err(ManifestError::InvalidConfig("disk name is empty").into());
        }
        if self.disk.total_sectors == 0 {
            return Err(ManifestError::InvalidConfig("disk has no sectors").into());
        }
        let in_range = |id: u8| (id as usize) < NDKMAP;
        if !in_range(self.install.slice) {
            return Err(ManifestError::SliceOutOfRange("install", self.install.slice).into());
        }
        if let Some(s) = self.slices.iter().find(|s| !in_range(s.id)) {
            return Err(ManifestError::SliceOutOfRange("discovered slice", s.id).into());
        }
        if let Some(a) = self.actions.iter().find(|a| !in_range(a.id())) {
            return Err(ManifestError::SliceOutOfRange("action", a.id()).into());
        }
        Ok(())
    }

    pub fn options(&self) -> SessionOptions {
        SessionOptions::new()
            .automated(self.install.automated)
            .with_swap_mb(self.install.swap.map_or(0, |s| s.0))
            .legacy_partition_table(self.disk.legacy_partition_table)
    }

    /// Seeds a session with the discovered slices.
    pub fn open_session(&self) -> anyhow::Result<SliceSession> {
        let slots: Vec<_> = self.slices.iter().map(SliceSpec::to_slot).collect();
        let mut session = SliceSession::with_slices(self.disk.geometry(), self.options(), &slots)
            .context("seeding slice table")?;
        if self.invalidate {
            session.invalidate();
        }
        Ok(session)
    }

    /// Applies every action in order, stopping at the first failure.
    pub fn apply_actions(&self, session: &mut SliceSession) -> anyhow::Result<()> {
        for (i, action) in self.actions.iter().enumerate() {
            crate::log_verbose!("Action #{i}: {action}");
            action
                .apply(session)
                .with_context(|| format!("action #{i} ({action})"))?;
        }
        if session.swap_failed() {
            crate::log_normal!("Warning: swap slice could not be provisioned");
        }
        Ok(())
    }
}

impl core::fmt::Display for Manifest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(
            f,
            "\n  Disk {} : {} sectors, {} per cylinder{}",
            self.disk.name,
            sep_u64(self.disk.total_sectors),
            sep_u64(self.disk.cylinder_sectors),
            if self.disk.legacy_partition_table {
                ", fdisk"
            } else {
                ""
            }
        )?;
        writeln!(f, "  ┌────┬──────────────────────┬──────────────┬──────────────┐")?;
        writeln!(f, "  | Id | Tag                  | Offset       | Size         |")?;
        writeln!(f, "  ├────┼──────────────────────┼──────────────┼──────────────┤")?;
        for s in &self.slices {
            writeln!(
                f,
                "  | {:<2} | {:<20} | {:>12} | {:>12} |",
                s.id,
                s.tag.0.to_string(),
                sep_u64(s.offset),
                sep_u64(s.size)
            )?;
        }
        writeln!(f, "  └────┴──────────────────────┴──────────────┴──────────────┘")?;
        for (i, a) in self.actions.iter().enumerate() {
            writeln!(f, "  #{i:<2} {a}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [disk]
        name = "c0t0d0"
        total_sectors = 10000
    "#;

    #[test]
    fn defaults() {
        let m = Manifest::parse(MINIMAL).unwrap();
        m.validate().unwrap();
        assert_eq!(m.install, InstallSpec::default());
        assert!(m.disk.legacy_partition_table);
        assert!(!m.invalidate);
        let opts = m.options();
        assert!(opts.automated);
        assert_eq!(opts.swap_mb, 0);
    }

    #[test]
    fn out_of_range_action_is_rejected() {
        let m = Manifest::parse(&format!(
            "{MINIMAL}\n[[actions]]\naction = 'delete'\nid = 16\n"
        ))
        .unwrap();
        let e = m.validate().unwrap_err();
        assert_eq!(
            e.downcast_ref::<ManifestError>(),
            Some(&ManifestError::SliceOutOfRange("action", 16))
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Manifest::parse(&format!("{MINIMAL}\nfoo = 1\n")).is_err());
    }

    #[test]
    fn invalidate_discards_seeded_slices() {
        let m = Manifest::parse(&format!(
            "invalidate = true\n{MINIMAL}\n[[slices]]\nid = 0\noffset = 0\nsize = 5000\ntag = 'root'\n"
        ))
        .unwrap();
        let mut s = m.open_session().unwrap();
        assert!(s.is_invalidated());
        assert_eq!(s.free_space().unwrap().total_free(), 10_000);
    }
}
