//! Pen name reservation.
//!
//! A name is held by exactly one live session. `reserve` is the binding
//! check-and-set; `check_available` is advisory and may be stale by the time
//! the caller connects.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use quill_core::error::AppError;
use quill_core::result::AppResult;
use quill_core::types::{ClaimToken, PenName};

/// Owner of the set of pen names bound to live sessions.
#[derive(Debug, Clone)]
pub struct PenNameAllocator {
    names: Arc<DashMap<PenName, ClaimToken>>,
    max_len: usize,
}

impl PenNameAllocator {
    /// Create an empty allocator accepting names up to `max_len` characters.
    pub fn new(max_len: usize) -> Self {
        Self {
            names: Arc::new(DashMap::new()),
            max_len,
        }
    }

    /// Validate `raw` into a pen name.
    pub fn parse(&self, raw: &str) -> AppResult<PenName> {
        PenName::parse(raw, self.max_len)
    }

    /// Non-binding availability query.
    pub fn check_available(&self, raw: &str) -> AppResult<bool> {
        let name = self.parse(raw)?;
        Ok(!self.names.contains_key(&name))
    }

    /// Atomically reserve `raw` for a new session.
    ///
    /// Fails with `PenNameTaken` when another live session holds the name.
    pub fn reserve(&self, raw: &str) -> AppResult<PenNameClaim> {
        let name = self.parse(raw)?;
        match self.names.entry(name.clone()) {
            Entry::Occupied(_) => {
                tracing::debug!(pen_name = %name, "Pen name reservation refused");
                Err(AppError::pen_name_taken(name.as_str()))
            }
            Entry::Vacant(slot) => {
                let token = ClaimToken::new();
                slot.insert(token);
                tracing::debug!(pen_name = %name, "Pen name reserved");
                Ok(PenNameClaim {
                    name,
                    token,
                    names: Arc::clone(&self.names),
                    released: false,
                })
            }
        }
    }

    /// Whether `name` is currently reserved.
    pub fn is_reserved(&self, name: &PenName) -> bool {
        self.names.contains_key(name)
    }

    /// Number of reserved names.
    pub fn reserved_count(&self) -> usize {
        self.names.len()
    }
}

/// A reservation of one pen name.
///
/// Dropping the claim frees the name, unless the name has since been
/// reserved under a different claim.
#[derive(Debug)]
pub struct PenNameClaim {
    name: PenName,
    token: ClaimToken,
    names: Arc<DashMap<PenName, ClaimToken>>,
    released: bool,
}

impl PenNameClaim {
    /// The reserved name.
    pub fn name(&self) -> &PenName {
        &self.name
    }

    /// Free the name now. Returns whether this claim still held it.
    pub fn release(mut self) -> bool {
        self.release_inner()
    }

    fn release_inner(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        let token = self.token;
        let freed = self
            .names
            .remove_if(&self.name, |_, held| *held == token)
            .is_some();
        if freed {
            tracing::debug!(pen_name = %self.name, "Pen name released");
        }
        freed
    }
}

impl Drop for PenNameClaim {
    fn drop(&mut self) {
        self.release_inner();
    }
}
