// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for action processing, the instance registry, and the
//! tick-loop scheduler.

use oj_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("scenario is not in progress")]
    NotInProgress,
    #[error("maximum turns reached")]
    MaxTurnsReached,
    #[error("unknown action verb '{0}'")]
    UnknownVerb(String),
    #[error("player entity not found in world state")]
    PlayerNotFound,
    #[error("target entity not found; provide npc_id, store_id, or entity_id")]
    TargetNotFound,
    #[error("invalid direction '{0}'; must be one of up, down, left, right")]
    InvalidDirection(String),
    #[error("movement out of world bounds")]
    OutOfBounds,
    #[error("missing required parameter '{0}'")]
    MissingParam(&'static str),
    #[error("item '{0}' not found in store inventory")]
    ItemNotFound(String),
    #[error("insufficient gold: need {need}, have {have}")]
    InsufficientGold { need: u64, have: u64 },
    #[error("'{0}' is not available for hire")]
    NotHireable(String),
    #[error(transparent)]
    Core(#[from] CoreError),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("instance not found: {0}")]
    InstanceNotFound(String),
    #[error("instance already exists: {0}")]
    DuplicateInstance(String),
    #[error("unknown scenario template: {0}")]
    UnknownScenario(String),
    #[error("instance is still generating; cannot join yet")]
    StillGenerating,
    #[error(transparent)]
    Core(#[from] CoreError),
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler is already running")]
    AlreadyRunning,
    #[error("scheduler is not running")]
    NotRunning,
}
