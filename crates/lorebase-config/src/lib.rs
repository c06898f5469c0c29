// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Lorebase QA service.
//!
//! Layered TOML configuration with environment overrides, following the
//! XDG hierarchy. See [`loader::load_config`] for the merge order.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    LorebaseConfig, RagConfig, ServerConfig, StorageConfig, UploadConfig, ALLOWED_EXTENSIONS,
};
