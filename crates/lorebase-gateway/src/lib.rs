// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP API for the Lorebase QA service.
//!
//! axum routers with a public read-only surface and a bearer-authenticated
//! mutation surface, a uniform `{success, data|error}` envelope, and
//! multipart document upload.

pub mod auth;
pub mod handlers;
pub mod response;
pub mod schema;
pub mod server;

pub use server::{build_router, start_server, AppState};
