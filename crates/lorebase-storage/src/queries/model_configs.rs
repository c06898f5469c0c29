// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stored LLM configurations and fallback resolution.

use rusqlite::{params, Connection, OptionalExtension, Row};

use lorebase_core::{LorebaseError, ModelType};

use crate::database::{map_tr_err, Database};
use crate::models::ModelConfig;

/// Insert/update parameters for a model configuration.
#[derive(Debug, Clone)]
pub struct NewModelConfig {
    pub name: String,
    pub description: String,
    pub model_type: ModelType,
    pub model_name: String,
    pub api_key: String,
    pub api_base_url: String,
    pub model_path: String,
    pub max_tokens: i64,
    pub temperature: f64,
    pub is_active: bool,
    pub is_default: bool,
}

fn row_to_config(row: &Row<'_>) -> rusqlite::Result<ModelConfig> {
    let model_type: String = row.get(3)?;
    let model_type: ModelType = model_type.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(ModelConfig {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        model_type,
        model_name: row.get(4)?,
        api_key: row.get(5)?,
        api_base_url: row.get(6)?,
        model_path: row.get(7)?,
        max_tokens: row.get(8)?,
        temperature: row.get(9)?,
        is_active: row.get(10)?,
        is_default: row.get(11)?,
        created_at: row.get(12)?,
    })
}

const COLUMNS: &str = "id, name, description, model_type, model_name, api_key, api_base_url, \
                       model_path, max_tokens, temperature, is_active, is_default, created_at";

fn clear_defaults(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute("UPDATE model_configs SET is_default = 0 WHERE is_default = 1", [])?;
    Ok(())
}

/// Create a configuration. Setting `is_default` clears the flag on every
/// other row in the same transaction, keeping at most one default.
pub async fn create(db: &Database, new: NewModelConfig) -> Result<ModelConfig, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if new.is_default {
                clear_defaults(&tx)?;
            }
            tx.execute(
                "INSERT INTO model_configs
                 (name, description, model_type, model_name, api_key, api_base_url, model_path,
                  max_tokens, temperature, is_active, is_default)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    new.name,
                    new.description,
                    new.model_type.to_string(),
                    new.model_name,
                    new.api_key,
                    new.api_base_url,
                    new.model_path,
                    new.max_tokens,
                    new.temperature,
                    new.is_active,
                    new.is_default,
                ],
            )?;
            let id = tx.last_insert_rowid();
            let config = tx.query_row(
                &format!("SELECT {COLUMNS} FROM model_configs WHERE id = ?1"),
                params![id],
                row_to_config,
            )?;
            tx.commit()?;
            Ok(config)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a configuration by id.
pub async fn get(db: &Database, id: i64) -> Result<Option<ModelConfig>, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let config = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM model_configs WHERE id = ?1"),
                    params![id],
                    row_to_config,
                )
                .optional()?;
            Ok(config)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a configuration by id, requiring it to be active.
pub async fn get_active(db: &Database, id: i64) -> Result<Option<ModelConfig>, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let config = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM model_configs WHERE id = ?1 AND is_active = 1"),
                    params![id],
                    row_to_config,
                )
                .optional()?;
            Ok(config)
        })
        .await
        .map_err(map_tr_err)
}

/// List all configurations, default first, then newest.
pub async fn list(db: &Database) -> Result<Vec<ModelConfig>, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM model_configs ORDER BY is_default DESC, created_at DESC, id DESC"
            ))?;
            let configs = stmt
                .query_map([], row_to_config)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(configs)
        })
        .await
        .map_err(map_tr_err)
}

/// First active configuration whose model name contains `family`
/// (case-insensitive), preferring the default row. Fallback when a request
/// names no configuration.
pub async fn find_active_by_family(
    db: &Database,
    family: &str,
) -> Result<Option<ModelConfig>, LorebaseError> {
    let family = family.to_string();
    db.connection()
        .call(move |conn| {
            let config = conn
                .query_row(
                    &format!(
                        "SELECT {COLUMNS} FROM model_configs
                         WHERE is_active = 1
                           AND LOWER(model_name) LIKE '%' || LOWER(?1) || '%'
                         ORDER BY is_default DESC, id ASC LIMIT 1"
                    ),
                    params![family],
                    row_to_config,
                )
                .optional()?;
            Ok(config)
        })
        .await
        .map_err(map_tr_err)
}

/// Update a configuration in place. Returns the updated row, or `None`
/// when the id does not exist.
pub async fn update(
    db: &Database,
    id: i64,
    new: NewModelConfig,
) -> Result<Option<ModelConfig>, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if new.is_default {
                clear_defaults(&tx)?;
            }
            let changed = tx.execute(
                "UPDATE model_configs SET
                 name = ?1, description = ?2, model_type = ?3, model_name = ?4, api_key = ?5,
                 api_base_url = ?6, model_path = ?7, max_tokens = ?8, temperature = ?9,
                 is_active = ?10, is_default = ?11
                 WHERE id = ?12",
                params![
                    new.name,
                    new.description,
                    new.model_type.to_string(),
                    new.model_name,
                    new.api_key,
                    new.api_base_url,
                    new.model_path,
                    new.max_tokens,
                    new.temperature,
                    new.is_active,
                    new.is_default,
                    id,
                ],
            )?;
            let config = if changed > 0 {
                Some(tx.query_row(
                    &format!("SELECT {COLUMNS} FROM model_configs WHERE id = ?1"),
                    params![id],
                    row_to_config,
                )?)
            } else {
                None
            };
            tx.commit()?;
            Ok(config)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a configuration.
pub async fn delete(db: &Database, id: i64) -> Result<bool, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute("DELETE FROM model_configs WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}
