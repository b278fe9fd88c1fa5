// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use opentelemetry::InstrumentationScope;
use opentelemetry::metrics::{Gauge, Meter, MeterProvider};

const METER_NAME: &str = "strata";
const VERSION: &str = "v0.1.0";
const SCHEMA_URL: &str = "https://opentelemetry.io/schemas/1.47.0";
pub(crate) const CACHE_COLLECTOR_NAME: &str = "cache.collector";

pub(crate) fn create_meter(meter_provider: &dyn MeterProvider) -> Meter {
    meter_provider.meter_with_scope(
        InstrumentationScope::builder(METER_NAME)
            .with_version(VERSION)
            .with_schema_url(SCHEMA_URL)
            .build(),
    )
}

pub(crate) fn create_collector_gauge(meter: &Meter) -> Gauge<u64> {
    meter
        .u64_gauge(CACHE_COLLECTOR_NAME)
        .with_description("Cumulative cache operation counters per store")
        .with_unit("{operation}")
        .build()
}
