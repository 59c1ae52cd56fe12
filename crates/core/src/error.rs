// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types shared by the domain model.

use thiserror::Error;

/// Errors surfaced from entity/world-state manipulation.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),
    #[error("entity already exists: {0}")]
    DuplicateEntity(String),
    #[error("unknown scenario template: {0}")]
    UnknownScenario(String),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
