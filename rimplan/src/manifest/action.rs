// SPDX-License-Identifier: MIT

use core::fmt;

use rimslice::{OnExisting, SliceResult, SliceSession};
use serde::Deserialize;

use crate::manifest::size::{SizeSpec, TagSpec};

/// One edit of the slice table, applied in manifest order.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    Preserve {
        id: u8,
    },
    Delete {
        id: u8,
    },
    Create {
        id: u8,
        size: SizeSpec,
        #[serde(default)]
        tag: TagSpec,
        #[serde(default)]
        on_existing: OnExisting,
    },
}

impl Action {
    pub fn id(&self) -> u8 {
        match self {
            Action::Preserve { id } | Action::Delete { id } | Action::Create { id, .. } => *id,
        }
    }

    pub fn apply(&self, session: &mut SliceSession) -> SliceResult {
        match *self {
            Action::Preserve { id } => session.preserve_slot(id),
            Action::Delete { id } => session.delete_slot(id).map(|_| ()),
            Action::Create {
                id,
                size,
                tag,
                on_existing,
            } => session.create_slot(id, size.0, tag.0, on_existing).map(|_| ()),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Preserve { id } => write!(f, "preserve slice {id}"),
            Action::Delete { id } => write!(f, "delete slice {id}"),
            Action::Create {
                id,
                size,
                tag,
                on_existing,
            } => {
                write!(f, "create slice {id} ({size}, {})", tag.0)?;
                if *on_existing == OnExisting::Overwrite {
                    write!(f, ", overwrite")?;
                }
                Ok(())
            }
        }
    }
}
