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

//! Axum extractor that builds the request's [`CookieContext`] from its
//! `Cookie` headers.
//!
//! Usage in a handler:
//! ```ignore
//! async fn my_handler(mut cookies: CookieContext) -> (CookieContext, StatusCode) { ... }
//! ```

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::cookie::CookieContext;

impl<S: Send + Sync> FromRequestParts<S> for CookieContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CookieContext::from_headers(&parts.headers))
    }
}
