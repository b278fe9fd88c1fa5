// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub(crate) const CACHE_SERVICE_NAME: &str = "cache.service";

pub(crate) const CACHE_STORE_NAME: &str = "cache.store";

pub(crate) const CACHE_METRIC_NAME: &str = "cache.metric";
