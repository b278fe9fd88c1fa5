// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! OpenTelemetry-backed metrics sink.

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Gauge, MeterProvider};

use crate::metric::MetricsSink;
use crate::stats::StatsProvider;
use crate::telemetry::attributes;
use crate::telemetry::metrics::{create_collector_gauge, create_meter};

/// A [`MetricsSink`] that records statistics on the `cache.collector` gauge.
///
/// Every counter becomes one data point tagged with `cache.service` (the
/// service name given here), `cache.store` (the store label) and `cache.metric`
/// (`hit_count`, `miss_count`, `set_success`, ...). Recording only updates the
/// gauge; exporting is left to the meter provider.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use opentelemetry::metrics::MeterProvider;
/// use strata::{Cache, MemoryStore, MetricCache, OtelMetricsSink};
///
/// fn instrument(provider: &dyn MeterProvider) -> MetricCache<Cache<i32, MemoryStore<i32>>> {
///     let sink = OtelMetricsSink::new("checkout", provider);
///     MetricCache::new(Cache::new(MemoryStore::new()), Arc::new(sink))
/// }
/// ```
#[derive(Clone, Debug)]
pub struct OtelMetricsSink {
    service: String,
    gauge: Gauge<u64>,
}

impl OtelMetricsSink {
    /// Creates a sink reporting under the given service name.
    pub fn new(service: impl Into<String>, meter_provider: &dyn MeterProvider) -> Self {
        let meter = create_meter(meter_provider);
        Self {
            service: service.into(),
            gauge: create_collector_gauge(&meter),
        }
    }

    /// Returns the service name attached to every data point.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }
}

impl MetricsSink for OtelMetricsSink {
    fn record_from_codec(&self, codec: &dyn StatsProvider) {
        let stats = codec.get_stats();
        let store = codec.identify().to_owned();
        for (metric, value) in stats.counters() {
            self.gauge.record(
                value,
                &[
                    KeyValue::new(attributes::CACHE_SERVICE_NAME, self.service.clone()),
                    KeyValue::new(attributes::CACHE_STORE_NAME, store.clone()),
                    KeyValue::new(attributes::CACHE_METRIC_NAME, metric),
                ],
            );
        }
    }
}
