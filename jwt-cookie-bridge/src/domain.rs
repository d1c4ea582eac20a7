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

//! Allow-list check for the cookie domain.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("cookie domain is empty")]
    Empty,
    #[error("cookie domain {0:?} is not in the allow-list")]
    NotAllowed(String),
}

/// Approves a domain that equals, or is a subdomain of, an allowed base
/// domain. `localhost` is always approved.
#[derive(Debug, Clone, Default)]
pub struct DomainValidator {
    allowed: Vec<String>,
}

impl DomainValidator {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = allowed
            .into_iter()
            .map(|d| normalize(d.as_ref()))
            .filter(|d| !d.is_empty())
            .collect();
        Self { allowed }
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    pub fn validate(&self, domain: &str) -> bool {
        self.check(domain).is_ok()
    }

    pub fn check(&self, domain: &str) -> Result<(), DomainError> {
        let domain = normalize(domain);
        if domain.is_empty() {
            return Err(DomainError::Empty);
        }
        if domain == "localhost" {
            return Ok(());
        }

        let approved = self.allowed.iter().any(|base| {
            domain == *base
                || domain
                    .strip_suffix(base.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        });

        if approved {
            Ok(())
        } else {
            Err(DomainError::NotAllowed(domain))
        }
    }
}

fn normalize(domain: &str) -> String {
    domain.trim().trim_start_matches('.').to_ascii_lowercase()
}
