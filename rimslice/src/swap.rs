// SPDX-License-Identifier: MIT

//! Swap slot provisioning.
//!
//! When the system needs swap, slot 1 is set up before the slot whose
//! creation triggered the check. The policy allocates through the session's
//! internal allocation path, which never evaluates the policy again.

use crate::{
    session::SliceSession,
    slot::SWAP_SLOT,
    tags::{SliceTag, is_swap_slice},
    types::{OnExisting, SliceSize},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapState {
    /// The system does not need a swap slot.
    NotRequired,
    /// Not evaluated yet.
    Pending,
    /// Evaluation in progress.
    Evaluating,
    /// Slot 1 exists and is tagged swap.
    Satisfied,
    /// Slot 1 holds user data or could not be allocated. Install may proceed.
    Failed,
}

impl SwapState {
    pub fn initial(swap_mb: u64) -> Self {
        if swap_mb == 0 {
            SwapState::NotRequired
        } else {
            SwapState::Pending
        }
    }

    #[inline]
    pub fn needs_evaluation(&self) -> bool {
        matches!(self, SwapState::Pending | SwapState::Failed)
    }
}

impl SliceSession {
    /// Slot 1 is in the table and tagged swap.
    pub(crate) fn swap_slot_ready(&self) -> bool {
        self.table.get(SWAP_SLOT).is_some_and(is_swap_slice)
    }

    /// Makes sure slot 1 is a swap slot if the system needs one.
    ///
    /// Failures are recorded in [`SliceSession::swap_state`] and never
    /// returned as errors.
    pub(crate) fn apply_swap_policy(&mut self) {
        self.swap = self.swap_state();
        if !self.swap.needs_evaluation() {
            return;
        }
        self.swap = SwapState::Evaluating;

        let next = match self.table.get(SWAP_SLOT) {
            Some(slot) if is_swap_slice(slot) => {
                self.whole_partition_default = false;
                tracing::info!(
                    "slice 1 exists and is defined as swap; it will be used as the swap volume"
                );
                SwapState::Satisfied
            }
            Some(slot) => {
                tracing::warn!(
                    tag = %slot.tag,
                    "slice 1 contains user data and cannot be used as swap; installation may fail"
                );
                SwapState::Failed
            }
            None => {
                let mb = self.options.swap_mb;
                tracing::info!(size_mb = mb, "creating slice 1 for use as swap volume");
                match self.allocate_slot(
                    SWAP_SLOT,
                    SliceSize::Sectors(self.options.swap_sectors()),
                    SliceTag::Swap,
                    OnExisting::Error,
                ) {
                    Ok(_) => SwapState::Satisfied,
                    Err(e) => {
                        tracing::warn!(size_mb = mb, error = %e, "failed to add swap slice");
                        SwapState::Failed
                    }
                }
            }
        };
        self.swap = next;
    }
}
