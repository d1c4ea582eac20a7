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

//! Shared API types for the JWT cookie bridge.
//!
//! This crate defines the contract between the bridge service and the host
//! platform that delivers login/logout events, plus the operator dashboard
//! that reads diagnostics. It carries no web framework or database types.

pub mod error;
pub mod requests;
pub mod responses;
pub mod status;

pub use error::APIError;
pub use requests::Identity;
pub use responses::APIResponse;
pub use status::TokenStatus;
