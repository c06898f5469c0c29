// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request handlers, one module per API area.

pub mod documents;
pub mod knowledge_bases;
pub mod models;
pub mod qa;
pub mod system;

use serde::Deserialize;

/// Common `?page&size` query parameters.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_size() -> i64 {
    20
}
