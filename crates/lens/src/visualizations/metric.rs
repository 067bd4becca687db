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

use super::{read_state, write_state};
use crate::expression::{Ast, ExpressionSource, FunctionCall};
use crate::plugin::{
    FramePublicApi, PluginState, SuggestionRequest, TableSuggestion, Visualization,
    VisualizationSuggestion, VisualizationType,
};
use serde::{Deserialize, Serialize};

pub const METRIC_ID: &str = "lnsMetric";
pub const METRIC_CHART_FUNCTION: &str = "lens_metric_chart";
pub const METRIC_SUGGESTION_SCORE: f64 = 0.5;

/// A single number taken from one column of one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricState {
    pub layer_id: String,
    pub accessor: String,
}

#[derive(Debug, Default)]
pub struct MetricVisualization;

impl MetricVisualization {
    pub fn new() -> Self {
        Self
    }

    fn suggest_for_table(&self, table: &TableSuggestion) -> Option<VisualizationSuggestion> {
        if table.is_multi_row {
            return None;
        }
        let [column] = table.columns.as_slice() else {
            return None;
        };
        if !column.operation.data_type.is_numeric() {
            return None;
        }
        let state = write_state(
            METRIC_ID,
            &MetricState {
                layer_id: table.layer_id.clone(),
                accessor: column.column_id.clone(),
            },
        )?;
        Some(VisualizationSuggestion {
            score: METRIC_SUGGESTION_SCORE,
            title: column.operation.label.clone(),
            state,
            datasource_suggestion_id: table.datasource_suggestion_id,
            preview_icon: "visMetric".to_string(),
        })
    }
}

impl Visualization for MetricVisualization {
    fn id(&self) -> &str {
        METRIC_ID
    }

    fn to_expression(
        &self,
        state: &PluginState,
        frame: &FramePublicApi,
    ) -> Option<ExpressionSource> {
        let state: MetricState = read_state(METRIC_ID, state)?;
        let title = frame
            .layer(&state.layer_id)
            .and_then(|layer| layer.operation_for_column_id(&state.accessor))
            .map(|operation| operation.label)
            .unwrap_or_default();
        let chart = FunctionCall::new(METRIC_CHART_FUNCTION)
            .with_arg("title", title)
            .with_arg("accessor", state.accessor);
        Some(Ast::new(vec![chart]).into())
    }

    fn suggestions(&self, request: &SuggestionRequest<'_>) -> Vec<VisualizationSuggestion> {
        request
            .tables
            .iter()
            .filter_map(|table| self.suggest_for_table(table))
            .collect()
    }

    fn visualization_types(&self) -> Vec<VisualizationType> {
        vec![VisualizationType {
            id: METRIC_ID.to_string(),
            icon: "visMetric".to_string(),
            label: "Metric".to_string(),
        }]
    }

    fn initialize(&self, frame: &mut FramePublicApi, state: Option<PluginState>) -> PluginState {
        if let Some(state) = state {
            return state;
        }
        let initial = MetricState {
            layer_id: frame.add_new_layer(),
            accessor: crate::generate_id(),
        };
        write_state(METRIC_ID, &initial).unwrap_or_default()
    }
}
