// SPDX-License-Identifier: MIT

//! Per-slot record of what the editing session asked for.
//!
//! Kept apart from the slot table so that the intent recorded for a slot
//! survives its removal from the table.

use crate::slot::NDKMAP;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditEntry {
    /// Never delete or overwrite.
    pub preserve: bool,
    /// Removed this session.
    pub delete: bool,
    /// Created this session.
    pub create: bool,
    /// Slot intended to host the OS root.
    pub is_install_target: bool,
    /// Size in sectors given to the slot when it was created.
    pub requested_create_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditLedger {
    entries: [EditEntry; NDKMAP],
}

impl EditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, id: u8) -> Option<&EditEntry> {
        self.entries.get(id as usize)
    }

    fn entry_mut(&mut self, id: u8) -> Option<&mut EditEntry> {
        self.entries.get_mut(id as usize)
    }

    #[inline]
    pub fn is_preserved(&self, id: u8) -> bool {
        self.entry(id).is_some_and(|e| e.preserve)
    }

    #[inline]
    pub fn is_created(&self, id: u8) -> bool {
        self.entry(id).is_some_and(|e| e.create)
    }

    pub fn any_preserved(&self) -> bool {
        self.entries.iter().any(|e| e.preserve)
    }

    /// Lowest slot id marked as install target.
    pub fn install_target(&self) -> Option<u8> {
        self.entries
            .iter()
            .position(|e| e.is_install_target)
            .map(|i| i as u8)
    }

    pub fn install_slot_or_0(&self) -> u8 {
        self.install_target().unwrap_or(0)
    }

    pub(crate) fn mark_preserved(&mut self, id: u8) {
        if let Some(e) = self.entry_mut(id) {
            e.preserve = true;
        }
    }

    pub(crate) fn mark_deleted(&mut self, id: u8) {
        if let Some(e) = self.entry_mut(id) {
            e.delete = true;
        }
    }

    pub(crate) fn mark_created(&mut self, id: u8, size: u64) {
        if let Some(e) = self.entry_mut(id) {
            e.create = true;
            e.requested_create_size = size;
        }
    }

    pub(crate) fn mark_install_target(&mut self, id: u8) {
        if let Some(e) = self.entry_mut(id) {
            e.is_install_target = true;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &EditEntry)> {
        self.entries.iter().enumerate().map(|(i, e)| (i as u8, e))
    }
}
