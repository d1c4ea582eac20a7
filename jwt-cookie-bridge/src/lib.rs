/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Token cookie bridge library.
//!
//! Receives login and logout events from an identity provider, validates the
//! provider's access token, and persists it in a browser cookie scoped to an
//! approved domain. The binary entry point (`main.rs`) is a thin wrapper that
//! calls into this library.

pub mod config;
pub mod cookie;
pub mod db;
pub mod domain;
pub mod error;
pub mod extract;
pub mod handler;
pub mod refresh;
pub mod routes;
pub mod state;
pub mod status;
pub mod token;
