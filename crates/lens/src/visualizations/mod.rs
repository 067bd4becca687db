// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

//! Visualizations shipped with the frame.

pub mod datatable;
pub mod metric;

use crate::plugin::{PluginState, Visualization};
use serde::de::DeserializeOwned;
use tracing::warn;

pub use datatable::{DatatableLayer, DatatableState, DatatableVisualization, DATATABLE_ID};
pub use metric::{MetricState, MetricVisualization, METRIC_ID};

/// Built-ins in registration order.
pub fn builtin_visualizations() -> Vec<Box<dyn Visualization>> {
    vec![
        Box::new(DatatableVisualization::new()),
        Box::new(MetricVisualization::new()),
    ]
}

fn read_state<T: DeserializeOwned>(visualization_id: &str, state: &PluginState) -> Option<T> {
    match serde_json::from_value(state.clone()) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(visualization_id, error = %e, "Unreadable visualization state");
            None
        }
    }
}

fn write_state<T: serde::Serialize>(visualization_id: &str, state: &T) -> Option<PluginState> {
    match serde_json::to_value(state) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(visualization_id, error = %e, "Could not serialise visualization state");
            None
        }
    }
}
