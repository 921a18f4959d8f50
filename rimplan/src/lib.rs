// SPDX-License-Identifier: MIT

pub mod manifest;
pub mod report;
pub mod utils;
