//! Typed error hierarchy for the factory scope resolver.
//!
//! Two enums cover the two failure surfaces:
//! - `ScopeError` — scope-resolution failures seen by collaborators
//! - `SourceError` — factory-list backend failures
//!
//! Scope resolution never produces a wrong-but-valid factory id: every
//! failure here blocks the dependent query instead of letting it run
//! against the wrong tenant.

use thiserror::Error;

/// Errors surfaced by the scope resolver to its collaborators.
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("factory scope not initialized; await load() before issuing scoped queries")]
    ScopeNotReady,

    #[error("factory list unavailable: {source}")]
    FactoryListUnavailable {
        #[source]
        source: SourceError,
    },

    #[error("no factory resolved for this session")]
    NoFactoryResolved,
}

/// Errors from the factory-list source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to factory backend failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("factory backend returned status {status}")]
    Status { status: reqwest::StatusCode },

    #[error("failed to decode factory list: {0}")]
    Decode(#[source] reqwest::Error),
}
