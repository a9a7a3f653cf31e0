// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Loader telemetry recording.

#[cfg(any(feature = "metrics", test))]
use opentelemetry::{
    KeyValue,
    metrics::{Counter, Meter},
};
#[cfg(any(feature = "logs", test))]
use opentelemetry::logs::Severity;

#[cfg(any(feature = "metrics", test))]
use crate::telemetry::{attributes, metrics::create_event_counter};
use crate::telemetry::{LoaderActivity, LoaderName};

/// Emits loader events as `tracing` records and as an OpenTelemetry counter.
///
/// Both outputs are optional: logging is toggled by the loader options and
/// the counter only exists once a meter has been attached.
#[derive(Clone, Debug, Default)]
pub(crate) struct LoaderTelemetry {
    logging_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    event_counter: Option<Counter<u64>>,
}

impl LoaderTelemetry {
    #[must_use]
    pub fn new(logging_enabled: bool) -> Self {
        Self {
            logging_enabled,
            #[cfg(any(feature = "metrics", test))]
            event_counter: None,
        }
    }

    #[cfg(any(feature = "metrics", test))]
    #[must_use]
    pub fn with_meter(mut self, meter: &Meter) -> Self {
        self.event_counter = Some(create_event_counter(meter));
        self
    }

    /// Records a loader event.
    ///
    /// `count` is the number of keys the event covers.
    #[inline]
    pub fn record(&self, loader_name: LoaderName, activity: LoaderActivity, count: usize) {
        #[cfg(any(feature = "metrics", test))]
        if let Some(c) = &self.event_counter {
            let attrs = [
                KeyValue::new(attributes::LOADER_NAME, loader_name),
                KeyValue::new(attributes::LOADER_ACTIVITY_NAME, activity.as_str()),
            ];
            c.add(1, &attrs);
        }

        if self.logging_enabled {
            Self::emit(loader_name, activity, count);
        }
    }

    #[cfg(any(feature = "logs", test))]
    fn emit(loader_name: LoaderName, activity: LoaderActivity, count: usize) {
        let act = activity.as_str();

        // Tracing level must be constant, so a macro selects the level.
        // Field names must match the constants in attributes.rs.
        macro_rules! emit_event {
            ($level:ident) => {
                tracing::$level!(loader.name = loader_name, loader.activity = act, loader.count = count, "loader.event")
            };
        }

        match activity.severity() {
            Severity::Error => emit_event!(error),
            Severity::Warn => emit_event!(warn),
            Severity::Info => emit_event!(info),
            Severity::Debug => emit_event!(debug),
            _ => {}
        }
    }

    #[cfg(not(any(feature = "logs", test)))]
    #[allow(unused_variables, reason = "No-op when the logs feature is disabled")]
    fn emit(loader_name: LoaderName, activity: LoaderActivity, count: usize) {}
}

#[cfg(test)]
mod tests {
    use opentelemetry::metrics::MeterProvider;

    use super::*;
    use crate::telemetry::testing::{LogCapture, MetricTester};

    #[test]
    fn metrics_record_emits_correct_attributes() {
        let tester = MetricTester::new();
        let meter = tester.meter_provider().meter("loader");
        let telemetry = LoaderTelemetry::new(false).with_meter(&meter);

        telemetry.record("users", LoaderActivity::Dispatched, 3);

        tester.assert_attributes_contain(&[
            KeyValue::new(attributes::LOADER_NAME, "users"),
            KeyValue::new(attributes::LOADER_ACTIVITY_NAME, LoaderActivity::Dispatched.as_str()),
        ]);
    }

    #[test]
    fn logs_emit_contains_all_fields_and_values() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        LoaderTelemetry::emit("orders", LoaderActivity::BatchFailed, 7);

        capture.assert_contains(attributes::LOADER_NAME);
        capture.assert_contains(attributes::LOADER_ACTIVITY_NAME);
        capture.assert_contains(attributes::LOADER_COUNT_NAME);
        capture.assert_contains(attributes::LOADER_EVENT_NAME);

        capture.assert_contains("orders");
        capture.assert_contains(LoaderActivity::BatchFailed.as_str());
        capture.assert_contains("7");
    }

    #[test]
    fn logs_emit_at_correct_severity_levels() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        LoaderTelemetry::emit("loader", LoaderActivity::LengthMismatch, 1);
        capture.assert_contains("ERROR");

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        LoaderTelemetry::emit("loader", LoaderActivity::Abandoned, 1);
        capture.assert_contains("WARN");

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        LoaderTelemetry::emit("loader", LoaderActivity::Primed, 1);
        capture.assert_contains("INFO");

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        LoaderTelemetry::emit("loader", LoaderActivity::Queued, 1);
        capture.assert_contains("DEBUG");
    }

    #[test]
    fn logging_disabled_emits_nothing() {
        let telemetry = LoaderTelemetry::new(false);

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        telemetry.record("loader", LoaderActivity::BatchFailed, 2);

        assert!(capture.output().is_empty());
    }

    #[test]
    fn logging_enabled_goes_through_record() {
        let telemetry = LoaderTelemetry::new(true);

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        telemetry.record("loader", LoaderActivity::Cleared, 1);

        capture.assert_contains(LoaderActivity::Cleared.as_str());
    }
}
