// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[cfg(any(feature = "metrics", test))]
pub(crate) const LOADER_NAME: &str = "loader.name";

#[cfg(test)]
pub(crate) const LOADER_EVENT_NAME: &str = "loader.event";

#[cfg(any(feature = "metrics", test))]
pub(crate) const LOADER_ACTIVITY_NAME: &str = "loader.activity";

#[cfg(test)]
pub(crate) const LOADER_COUNT_NAME: &str = "loader.count";
