// SPDX-License-Identifier: MIT

//! Completion of an editing session: preserve-mode cleanup, install slot,
//! swap, final overlap check and export.

use crate::{
    errors::*,
    session::SliceSession,
    sink::{AttrSink, SliceList, TargetType},
    slot::{check_slot_id, is_reserved, NDKMAP},
    swap::SwapState,
    tags::SliceTag,
    types::{OnExisting, SliceSize},
};

impl SliceSession {
    /// Checks the edited layout and completes it for target instantiation.
    ///
    /// Returns the install slot. On error the layout must not be handed
    /// over.
    pub fn finalize(&mut self, install_slot: u8) -> SliceResult<u8> {
        let partition_size = self.partition_size();
        self.pinned_partition_size = Some(partition_size);
        let result = self.finalize_pinned(install_slot);
        self.pinned_partition_size = None;
        result
    }

    fn finalize_pinned(&mut self, install_slot: u8) -> SliceResult<u8> {
        match self.free_space() {
            Ok(free) => tracing::debug!("before finalize:\n{free}"),
            Err(e) => tracing::debug!(error = %e, "free space before finalize"),
        }

        if self.ledger.any_preserved() {
            self.drop_unprotected_slots();
        }

        if install_slot != 0 {
            if let Err(e) = check_slot_id(install_slot) {
                tracing::error!(slice = install_slot, "invalid install slice id");
                return Err(e);
            }
            self.whole_partition_default = false;
            self.ledger.mark_install_target(install_slot);
        }

        self.apply_swap_policy();

        if !self.table.contains(install_slot) && !self.whole_partition_default {
            tracing::info!(
                slice = install_slot,
                "creating install slice in largest free region in partition"
            );
            if let Err(e) = self.allocate_slot(
                install_slot,
                SliceSize::Max,
                SliceTag::Root,
                OnExisting::Error,
            ) {
                tracing::error!(slice = install_slot, error = %e, "install slice could not be created");
                return Err(e);
            }
        }

        tracing::debug!("final slice table:\n{}", self.table);
        match self.free_space() {
            Ok(free) => {
                tracing::debug!("after finalize:\n{free}");
                Ok(install_slot)
            }
            Err(e) => {
                tracing::error!(error = %e, "aborting VTOC editing due to overlapping slices");
                Err(e)
            }
        }
    }

    /// Preserve mode: keep only reserved, preserved and newly created slots.
    fn drop_unprotected_slots(&mut self) {
        tracing::info!("preserving slices");
        for id in 0..NDKMAP as u8 {
            if is_reserved(id) || !self.table.contains(id) {
                continue;
            }
            if self.ledger.is_preserved(id) {
                tracing::info!(slice = id, "preserving slice");
                self.whole_partition_default = false;
                continue;
            }
            if self.ledger.is_created(id) {
                tracing::info!(slice = id, "preserving new slice");
                continue;
            }
            self.remove_slot(id);
        }
    }

    /// Resolves the install slot and the disk it lives on.
    ///
    /// In automated mode any user slot in the table rules out the default
    /// whole-partition layout.
    pub fn device_target_info(&mut self) -> SliceResult<(u8, &str)> {
        if self.options.automated && self.table.any_user_slots() {
            self.whole_partition_default = false;
        }
        if self.whole_partition_default {
            return Ok((0, &self.geometry.name));
        }
        let id = self.ledger.install_slot_or_0();
        if id != 0 {
            if is_reserved(id) {
                tracing::error!(slice = id, "a reserved slice was specified as the install slice");
                return Err(SliceError::Protected {
                    id,
                    op: SliceOp::Install,
                });
            }
            return Ok((id, &self.geometry.name));
        }
        if self.table.contains(0) {
            tracing::info!("install slice 0 defaults");
            return Ok((0, &self.geometry.name));
        }
        tracing::error!("no install slice exists");
        Err(SliceError::NoInstallSlot)
    }

    /// Writes the layout to `sink`: either the default-layout shortcut or
    /// the explicit list of every in-use slot.
    pub fn export_target_attrs(&self, sink: &mut dyn AttrSink) -> SliceResult {
        sink.set_target_type(TargetType::Vtoc)?;
        sink.set_disk_name(&self.geometry.name)?;

        if self.swap_state() == SwapState::Satisfied {
            sink.set_create_swap_slice(true)?;
        }

        if self.whole_partition_default {
            tracing::info!("default slice layout used");
            return sink.set_default_layout(true);
        }

        let list = SliceList::from_table(&self.table);
        tracing::debug!("passed to target instantiation:\n{list}");
        sink.set_slice_list(list)
    }
}
