// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Loader telemetry: structured logs through `tracing` and an OpenTelemetry
//! event counter.

#[cfg(any(feature = "logs", test))]
use opentelemetry::logs::Severity;

pub(crate) mod attributes;
mod loader;
#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;
#[cfg(test)]
pub(crate) mod testing;

pub(crate) use loader::LoaderTelemetry;

/// Name under which a loader reports its activity.
pub(crate) type LoaderName = &'static str;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoaderActivity {
    CacheHit,
    Queued,
    ValueCacheHit,
    Dispatched,
    BatchLoaded,
    KeyFailed,
    Primed,
    Cleared,
    Purged,
    ValueCacheError,
    Abandoned,
    BatchFailed,
    LengthMismatch,
}

impl LoaderActivity {
    #[cfg(any(feature = "logs", feature = "metrics", test))]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CacheHit => "loader.cache_hit",
            Self::Queued => "loader.queued",
            Self::ValueCacheHit => "loader.value_cache_hit",
            Self::Dispatched => "loader.dispatched",
            Self::BatchLoaded => "loader.batch_loaded",
            Self::KeyFailed => "loader.key_failed",
            Self::Primed => "loader.primed",
            Self::Cleared => "loader.cleared",
            Self::Purged => "loader.purged",
            Self::ValueCacheError => "loader.value_cache_error",
            Self::Abandoned => "loader.abandoned",
            Self::BatchFailed => "loader.batch_failed",
            Self::LengthMismatch => "loader.length_mismatch",
        }
    }

    #[cfg(any(feature = "logs", test))]
    pub fn severity(self) -> Severity {
        match self {
            Self::CacheHit | Self::Queued | Self::ValueCacheHit | Self::BatchLoaded => Severity::Debug,
            Self::Dispatched | Self::KeyFailed | Self::Primed | Self::Cleared | Self::Purged => Severity::Info,
            Self::ValueCacheError | Self::Abandoned => Severity::Warn,
            Self::BatchFailed | Self::LengthMismatch => Severity::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_as_str() {
        assert_eq!(LoaderActivity::CacheHit.as_str(), "loader.cache_hit");
        assert_eq!(LoaderActivity::Queued.as_str(), "loader.queued");
        assert_eq!(LoaderActivity::ValueCacheHit.as_str(), "loader.value_cache_hit");
        assert_eq!(LoaderActivity::Dispatched.as_str(), "loader.dispatched");
        assert_eq!(LoaderActivity::BatchLoaded.as_str(), "loader.batch_loaded");
        assert_eq!(LoaderActivity::KeyFailed.as_str(), "loader.key_failed");
        assert_eq!(LoaderActivity::Primed.as_str(), "loader.primed");
        assert_eq!(LoaderActivity::Cleared.as_str(), "loader.cleared");
        assert_eq!(LoaderActivity::Purged.as_str(), "loader.purged");
        assert_eq!(LoaderActivity::ValueCacheError.as_str(), "loader.value_cache_error");
        assert_eq!(LoaderActivity::Abandoned.as_str(), "loader.abandoned");
        assert_eq!(LoaderActivity::BatchFailed.as_str(), "loader.batch_failed");
        assert_eq!(LoaderActivity::LengthMismatch.as_str(), "loader.length_mismatch");
    }

    #[test]
    fn activity_severity_debug() {
        assert_eq!(LoaderActivity::CacheHit.severity(), Severity::Debug);
        assert_eq!(LoaderActivity::Queued.severity(), Severity::Debug);
        assert_eq!(LoaderActivity::ValueCacheHit.severity(), Severity::Debug);
        assert_eq!(LoaderActivity::BatchLoaded.severity(), Severity::Debug);
    }

    #[test]
    fn activity_severity_info() {
        assert_eq!(LoaderActivity::Dispatched.severity(), Severity::Info);
        assert_eq!(LoaderActivity::KeyFailed.severity(), Severity::Info);
        assert_eq!(LoaderActivity::Primed.severity(), Severity::Info);
        assert_eq!(LoaderActivity::Cleared.severity(), Severity::Info);
        assert_eq!(LoaderActivity::Purged.severity(), Severity::Info);
    }

    #[test]
    fn activity_severity_warn_and_error() {
        assert_eq!(LoaderActivity::ValueCacheError.severity(), Severity::Warn);
        assert_eq!(LoaderActivity::Abandoned.severity(), Severity::Warn);
        assert_eq!(LoaderActivity::BatchFailed.severity(), Severity::Error);
        assert_eq!(LoaderActivity::LengthMismatch.severity(), Severity::Error);
    }
}
