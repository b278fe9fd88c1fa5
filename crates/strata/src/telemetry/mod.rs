// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Telemetry integration with OpenTelemetry.
//!
//! When the `metrics` feature is enabled, [`OtelMetricsSink`] exports the
//! statistics collected by [`MetricCache`](crate::MetricCache) as an
//! OpenTelemetry gauge.

#[cfg(any(feature = "metrics", test))]
pub(crate) mod attributes;
#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;
#[cfg(any(feature = "metrics", test))]
mod sink;
#[cfg(test)]
pub(crate) mod testing;

#[cfg(any(feature = "metrics", test))]
pub use sink::OtelMetricsSink;
