// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per table.

pub mod chunks;
pub mod documents;
pub mod knowledge_bases;
pub mod model_configs;
pub mod records;
pub mod sessions;
pub mod stats;
pub mod users;
