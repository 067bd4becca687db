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

//! Datasource that aggregates documents of an index pattern into layer tables.

pub mod operations;

use crate::error::SerialisationError;
use crate::plugin::{
    DataType, Datasource, DatasourcePublicApi, DatasourceSuggestion, DraggedField,
    LayerExpression, Operation, PluginState, TableSuggestion, TableSuggestionColumn,
};
use indexmap::IndexMap;
use operations::{definition, BuildColumnArgs, OperationType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub const DATASOURCE_ID: &str = "indexpattern";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexPatternField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: DataType,
    pub aggregatable: bool,
    pub searchable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexPattern {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_field_name: Option<String>,
    pub fields: Vec<IndexPatternField>,
}

impl IndexPattern {
    pub fn field(&self, name: &str) -> Option<&IndexPatternField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexPatternColumn {
    pub label: String,
    pub data_type: DataType,
    pub operation_type: OperationType,
    pub is_bucketed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_priority: Option<u32>,
    pub index_pattern_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl IndexPatternColumn {
    pub fn operation(&self) -> Operation {
        Operation {
            data_type: self.data_type,
            is_bucketed: self.is_bucketed,
            label: self.label.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexPatternLayer {
    pub index_pattern_id: String,
    pub column_order: Vec<String>,
    pub columns: IndexMap<String, IndexPatternColumn>,
}

impl IndexPatternLayer {
    pub fn empty(index_pattern_id: impl Into<String>) -> Self {
        Self {
            index_pattern_id: index_pattern_id.into(),
            ..Default::default()
        }
    }

    pub fn ordered_columns(&self) -> impl Iterator<Item = (&String, &IndexPatternColumn)> {
        self.column_order
            .iter()
            .filter_map(|id| self.columns.get(id).map(|column| (id, column)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexPatternPrivateState {
    pub current_index_pattern_id: String,
    pub index_patterns: IndexMap<String, IndexPattern>,
    pub layers: IndexMap<String, IndexPatternLayer>,
}

impl IndexPatternPrivateState {
    pub fn new(index_pattern: IndexPattern) -> Self {
        let current_index_pattern_id = index_pattern.id.clone();
        let mut index_patterns = IndexMap::new();
        index_patterns.insert(index_pattern.id.clone(), index_pattern);
        Self {
            current_index_pattern_id,
            index_patterns,
            layers: IndexMap::new(),
        }
    }

    pub fn from_plugin_state(state: &PluginState) -> Result<Self, SerialisationError> {
        serde_json::from_value(state.clone()).map_err(|e| SerialisationError::InvalidPluginState {
            plugin: DATASOURCE_ID.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn to_plugin_state(&self) -> Result<PluginState, SerialisationError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn current_index_pattern(&self) -> Option<&IndexPattern> {
        self.index_patterns.get(&self.current_index_pattern_id)
    }
}

fn read_state(state: &PluginState) -> Option<IndexPatternPrivateState> {
    match IndexPatternPrivateState::from_plugin_state(state) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(error = %e, "Unreadable index pattern state");
            None
        }
    }
}

/// Escapes `text` for use inside a single-quoted expression argument.
fn single_quoted(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        if matches!(c, '\\' | '\'') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

fn double_quoted(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// `esaggs` request for a layer followed by a rename of the generated column ids.
pub fn layer_to_expression(layer: &IndexPatternLayer) -> Option<String> {
    if layer.column_order.is_empty() {
        return None;
    }
    let mut agg_configs = Vec::new();
    let mut id_map = serde_json::Map::new();
    for (index, (column_id, column)) in layer.ordered_columns().enumerate() {
        let agg_id = format!("col-{index}-{column_id}");
        agg_configs.push(definition(column.operation_type).to_esaggs_config(column, &agg_id));
        id_map.insert(agg_id, Value::String(column_id.clone()));
    }
    if agg_configs.is_empty() {
        return None;
    }
    Some(format!(
        "esaggs index={} metricsAtAllLevels=false partialRows=false includeFormatHints=true aggConfigs={} | lens_rename_columns idMap={}",
        double_quoted(&layer.index_pattern_id),
        single_quoted(&Value::Array(agg_configs).to_string()),
        single_quoted(&Value::Object(id_map).to_string()),
    ))
}

pub struct IndexPatternPublicApi {
    layer: IndexPatternLayer,
}

impl DatasourcePublicApi for IndexPatternPublicApi {
    fn table_spec(&self) -> Vec<String> {
        self.layer.column_order.clone()
    }

    fn operation_for_column_id(&self, column_id: &str) -> Option<Operation> {
        self.layer.columns.get(column_id).map(IndexPatternColumn::operation)
    }
}

#[derive(Debug, Default)]
pub struct IndexPatternDatasource;

impl IndexPatternDatasource {
    pub fn new() -> Self {
        Self
    }

    fn build_suggestion(
        &self,
        state: &IndexPatternPrivateState,
        layer_id: &str,
        columns: Vec<(String, IndexPatternColumn)>,
        datasource_suggestion_id: usize,
    ) -> Option<DatasourceSuggestion> {
        let mut layer = IndexPatternLayer::empty(state.current_index_pattern_id.clone());
        for (column_id, column) in columns {
            layer.column_order.push(column_id.clone());
            layer.columns.insert(column_id, column);
        }
        let table = TableSuggestion {
            datasource_suggestion_id,
            is_multi_row: layer.columns.values().any(|c| c.is_bucketed),
            columns: layer
                .ordered_columns()
                .map(|(column_id, column)| TableSuggestionColumn {
                    column_id: column_id.clone(),
                    operation: column.operation(),
                })
                .collect(),
            layer_id: layer_id.to_string(),
        };
        let mut next_state = state.clone();
        next_state.layers.insert(layer_id.to_string(), layer);
        match next_state.to_plugin_state() {
            Ok(state) => Some(DatasourceSuggestion { state, table }),
            Err(e) => {
                warn!(error = %e, "Could not serialise suggested index pattern state");
                None
            }
        }
    }
}

impl Datasource for IndexPatternDatasource {
    fn id(&self) -> &str {
        DATASOURCE_ID
    }

    fn layers(&self, state: &PluginState) -> Vec<String> {
        read_state(state)
            .map(|state| state.layers.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn to_expression(&self, state: &PluginState, layer_id: &str) -> Option<LayerExpression> {
        let state = read_state(state)?;
        let layer = state.layers.get(layer_id)?;
        layer_to_expression(layer).map(LayerExpression::from)
    }

    fn suggestions_for_field(
        &self,
        state: &PluginState,
        field: &DraggedField,
    ) -> Vec<DatasourceSuggestion> {
        let Some(state) = read_state(state) else {
            return Vec::new();
        };
        let Some(index_pattern) = state.current_index_pattern() else {
            debug!("No current index pattern to suggest from");
            return Vec::new();
        };
        let Some(pattern_field) = index_pattern.field(&field.name) else {
            debug!(field = %field.name, "Dropped field is not part of the current index pattern");
            return Vec::new();
        };
        if !pattern_field.aggregatable {
            debug!(field = %field.name, "Dropped field is not aggregatable");
            return Vec::new();
        }

        let index_pattern_id = index_pattern.id.as_str();
        let layer_id = state
            .layers
            .keys()
            .next()
            .cloned()
            .unwrap_or_else(crate::generate_id);
        let column = |operation: OperationType, field: Option<&IndexPatternField>, priority: u32| {
            (
                crate::generate_id(),
                definition(operation).build_column(BuildColumnArgs {
                    index_pattern_id,
                    field,
                    suggested_priority: Some(priority),
                }),
            )
        };

        let mut candidates: Vec<Vec<(String, IndexPatternColumn)>> = Vec::new();
        match pattern_field.field_type {
            DataType::Number => {
                candidates.push(vec![column(OperationType::Avg, Some(pattern_field), 0)]);
                let time_field = index_pattern
                    .time_field_name
                    .as_deref()
                    .and_then(|name| index_pattern.field(name));
                if let Some(time_field) = time_field {
                    candidates.push(vec![
                        column(OperationType::DateHistogram, Some(time_field), 0),
                        column(OperationType::Avg, Some(pattern_field), 1),
                    ]);
                }
            }
            DataType::Date => candidates.push(vec![
                column(OperationType::DateHistogram, Some(pattern_field), 0),
                column(OperationType::Count, None, 1),
            ]),
            DataType::String | DataType::Boolean | DataType::Ip => candidates.push(vec![
                column(OperationType::Terms, Some(pattern_field), 0),
                column(OperationType::Count, None, 1),
            ]),
            DataType::Unknown => {}
        }

        candidates
            .into_iter()
            .enumerate()
            .filter_map(|(id, columns)| self.build_suggestion(&state, &layer_id, columns, id))
            .collect()
    }

    fn public_api(&self, state: &PluginState, layer_id: &str) -> Box<dyn DatasourcePublicApi> {
        let layer = read_state(state)
            .and_then(|mut state| state.layers.shift_remove(layer_id))
            .unwrap_or_default();
        Box::new(IndexPatternPublicApi { layer })
    }

    fn insert_layer(&self, state: &PluginState, layer_id: &str) -> PluginState {
        let Some(mut private) = read_state(state) else {
            return state.clone();
        };
        let layer = IndexPatternLayer::empty(private.current_index_pattern_id.clone());
        private.layers.entry(layer_id.to_string()).or_insert(layer);
        private.to_plugin_state().unwrap_or_else(|e| {
            warn!(error = %e, "Could not serialise index pattern state with new layer");
            state.clone()
        })
    }
}
