//! Unified error type for the Parlor engine.

use parlor_engine::EngineError;
use parlor_store::StoreError;

/// Top-level error that wraps all layer-specific errors.
///
/// When using the `parlor` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ParlorError {
    /// An orchestration-level error (lifecycle guard, authorization,
    /// validation, scoring).
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A storage-level error surfaced outside the engine (custom
    /// backends, direct store access).
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_model::SessionId;

    #[test]
    fn test_from_engine_error() {
        let err = EngineError::UnknownJoinCode("XYZ234".into());
        let parlor_err: ParlorError = err.into();
        assert!(matches!(parlor_err, ParlorError::Engine(_)));
        assert!(parlor_err.to_string().contains("XYZ234"));
    }

    #[test]
    fn test_from_store_error() {
        let err = StoreError::MissingSession(SessionId(7));
        let parlor_err: ParlorError = err.into();
        assert!(matches!(parlor_err, ParlorError::Store(_)));
        assert!(parlor_err.to_string().contains("S-7"));
    }
}
