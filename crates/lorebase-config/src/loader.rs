// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./lorebase.toml` > `~/.config/lorebase/lorebase.toml`
//! > `/etc/lorebase/lorebase.toml`, with environment variable overrides via
//! the `LOREBASE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::LorebaseConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/lorebase/lorebase.toml` (system-wide)
/// 3. `~/.config/lorebase/lorebase.toml` (user XDG config)
/// 4. `./lorebase.toml` (local directory)
/// 5. `LOREBASE_*` environment variables
pub fn load_config() -> Result<LorebaseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LorebaseConfig::default()))
        .merge(Toml::file("/etc/lorebase/lorebase.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("lorebase/lorebase.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("lorebase.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<LorebaseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LorebaseConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LorebaseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LorebaseConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `LOREBASE_STORAGE_DATABASE_PATH` must
/// map to `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("LOREBASE_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("upload_", "upload.", 1)
            .replacen("rag_", "rag.", 1);
        mapped.into()
    })
}
