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
use crate::expression::{Argument, Ast, ExpressionSource, FunctionCall};
use crate::plugin::{
    FramePublicApi, PluginState, SuggestionRequest, TableSuggestion, Visualization,
    VisualizationSuggestion, VisualizationType,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DATATABLE_ID: &str = "lnsDatatable";
pub const DATATABLE_FUNCTION: &str = "lens_datatable";
pub const DATATABLE_COLUMNS_FUNCTION: &str = "lens_datatable_columns";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatatableLayer {
    pub layer_id: String,
    pub column_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatatableState {
    pub layers: Vec<DatatableLayer>,
}

/// Shows every column of the first layer as a table.
#[derive(Debug, Default)]
pub struct DatatableVisualization;

impl DatatableVisualization {
    pub fn new() -> Self {
        Self
    }

    fn suggest_for_table(&self, table: &TableSuggestion) -> Option<VisualizationSuggestion> {
        if table.columns.is_empty() {
            return None;
        }
        let state = write_state(
            DATATABLE_ID,
            &DatatableState {
                layers: vec![DatatableLayer {
                    layer_id: table.layer_id.clone(),
                    column_ids: table.columns.iter().map(|c| c.column_id.clone()).collect(),
                }],
            },
        )?;
        Some(VisualizationSuggestion {
            score: if table.is_multi_row { 0.6 } else { 0.3 },
            title: "Table".to_string(),
            state,
            datasource_suggestion_id: table.datasource_suggestion_id,
            preview_icon: "visTable".to_string(),
        })
    }
}

impl Visualization for DatatableVisualization {
    fn id(&self) -> &str {
        DATATABLE_ID
    }

    fn to_expression(
        &self,
        state: &PluginState,
        frame: &FramePublicApi,
    ) -> Option<ExpressionSource> {
        let state: DatatableState = read_state(DATATABLE_ID, state)?;
        let layer = state.layers.first()?;
        let datasource_layer = frame.layer(&layer.layer_id);
        let column_ids: Vec<Argument> = layer
            .column_ids
            .iter()
            .filter(|id| {
                datasource_layer
                    .and_then(|api| api.operation_for_column_id(id))
                    .is_some()
            })
            .map(Argument::from)
            .collect();
        if column_ids.is_empty() {
            debug!(layer_id = %layer.layer_id, "Datatable has no resolvable columns");
            return None;
        }

        let columns = FunctionCall::new(DATATABLE_COLUMNS_FUNCTION).with_args("columnIds", column_ids);
        let table = FunctionCall::new(DATATABLE_FUNCTION).with_arg("columns", Ast::new(vec![columns]));
        Some(Ast::new(vec![table]).into())
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
            id: DATATABLE_ID.to_string(),
            icon: "visTable".to_string(),
            label: "Data table".to_string(),
        }]
    }

    fn initialize(&self, frame: &mut FramePublicApi, state: Option<PluginState>) -> PluginState {
        if let Some(state) = state {
            return state;
        }
        let initial = DatatableState {
            layers: vec![DatatableLayer {
                layer_id: frame.add_new_layer(),
                column_ids: Vec::new(),
            }],
        };
        write_state(DATATABLE_ID, &initial).unwrap_or_default()
    }
}
