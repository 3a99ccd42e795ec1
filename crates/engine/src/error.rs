// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::collaborators::SourceError;
use haul_core::CatalogError;
use haul_storage::StoreError;
use thiserror::Error;

/// Errors surfaced to engine callers.
///
/// Rejected commands are not errors; see [`crate::Transition`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    InvalidConfiguration(#[from] CatalogError),
    /// The in-memory state is still authoritative, but may not survive a restart
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("job source error: {0}")]
    Source(#[from] SourceError),
    #[error("no state directory: set HAUL_STATE_DIR or state_dir in the config")]
    NoStateDir,
}
