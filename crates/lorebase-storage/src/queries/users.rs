// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User lookup and creation.

use rusqlite::{params, OptionalExtension, Row};

use lorebase_core::LorebaseError;

use crate::database::{map_tr_err, Database};
use crate::models::User;

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        api_token: row.get(2)?,
        created_at: row.get(3)?,
    })
}

const COLUMNS: &str = "id, username, api_token, created_at";

/// Create a user with the given username and API token.
pub async fn create(db: &Database, username: &str, api_token: &str) -> Result<User, LorebaseError> {
    let username = username.to_string();
    let api_token = api_token.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (username, api_token) VALUES (?1, ?2)",
                params![username, api_token],
            )?;
            let id = conn.last_insert_rowid();
            let user = conn.query_row(
                &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                row_to_user,
            )?;
            Ok(user)
        })
        .await
        .map_err(map_tr_err)
}

/// Look up a user by API token. Used by the bearer-auth middleware.
pub async fn find_by_token(db: &Database, token: &str) -> Result<Option<User>, LorebaseError> {
    let token = token.to_string();
    db.connection()
        .call(move |conn| {
            let user = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM users WHERE api_token = ?1"),
                    params![token],
                    row_to_user,
                )
                .optional()?;
            Ok(user)
        })
        .await
        .map_err(map_tr_err)
}

/// Look up a user by id.
pub async fn get(db: &Database, id: i64) -> Result<Option<User>, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let user = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
                    params![id],
                    row_to_user,
                )
                .optional()?;
            Ok(user)
        })
        .await
        .map_err(map_tr_err)
}
