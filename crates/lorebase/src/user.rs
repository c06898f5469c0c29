// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lorebase user-add` command implementation.
//!
//! Authenticated routes need a bearer token; this mints one. The token is
//! printed exactly once and stored only in the users table.

use lorebase_config::LorebaseConfig;
use lorebase_core::LorebaseError;
use lorebase_storage::queries::users;
use lorebase_storage::Database;

pub fn add(config: LorebaseConfig, username: &str) -> Result<(), LorebaseError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(LorebaseError::Validation("username must not be empty".to_string()));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| LorebaseError::Internal(format!("failed to build runtime: {e}")))?;

    runtime.block_on(async {
        let db =
            Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
        let token = uuid::Uuid::new_v4().simple().to_string();
        let user = users::create(&db, username, &token).await?;
        println!("user '{}' created (id {})", user.username, user.id);
        println!("api token: {token}");
        Ok(())
    })
}
