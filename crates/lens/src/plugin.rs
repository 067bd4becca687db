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

//! Capability traits implemented by datasource and visualization plugins,
//! and the values exchanged with them.

use crate::expression::{Ast, ExpressionSource};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Plugin-owned state. The frame never looks inside it.
pub type PluginState = Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Number,
    Date,
    Boolean,
    Ip,
    Unknown,
}

impl DataType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Number)
    }
}

/// Column metadata as seen by visualizations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub data_type: DataType,
    pub is_bucketed: bool,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSuggestionColumn {
    pub column_id: String,
    pub operation: Operation,
}

/// Shape of a table a datasource could produce for one candidate state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSuggestion {
    pub datasource_suggestion_id: usize,
    pub is_multi_row: bool,
    pub columns: Vec<TableSuggestionColumn>,
    pub layer_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasourceSuggestion {
    pub state: PluginState,
    pub table: TableSuggestion,
}

/// A field dragged from the field list onto the workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraggedField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: DataType,
    pub aggregatable: bool,
    pub searchable: bool,
}

/// What a visualization is asked to score.
#[derive(Debug, Clone, Copy)]
pub struct SuggestionRequest<'a> {
    pub tables: &'a [TableSuggestion],
    /// Present only for the currently active visualization.
    pub state: Option<&'a PluginState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationSuggestion {
    pub score: f64,
    pub title: String,
    pub state: PluginState,
    pub datasource_suggestion_id: usize,
    pub preview_icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationType {
    pub id: String,
    pub icon: String,
    pub label: String,
}

/// Sub-expression of one layer. A layer may fan out into several result tables.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerExpression {
    pub tables: Vec<ExpressionSource>,
}

impl LayerExpression {
    pub fn single(table: impl Into<ExpressionSource>) -> Self {
        Self {
            tables: vec![table.into()],
        }
    }

    pub fn multiple<I, T>(tables: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ExpressionSource>,
    {
        Self {
            tables: tables.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<ExpressionSource> for LayerExpression {
    fn from(table: ExpressionSource) -> Self {
        Self::single(table)
    }
}

impl From<Ast> for LayerExpression {
    fn from(table: Ast) -> Self {
        Self::single(table)
    }
}

impl From<&str> for LayerExpression {
    fn from(table: &str) -> Self {
        Self::single(table)
    }
}

impl From<String> for LayerExpression {
    fn from(table: String) -> Self {
        Self::single(table)
    }
}

/// Read-only view of one layer's columns, handed to visualizations.
pub trait DatasourcePublicApi {
    fn table_spec(&self) -> Vec<String>;
    fn operation_for_column_id(&self, column_id: &str) -> Option<Operation>;
}

struct NoColumns;

impl DatasourcePublicApi for NoColumns {
    fn table_spec(&self) -> Vec<String> {
        Vec::new()
    }
    fn operation_for_column_id(&self, _column_id: &str) -> Option<Operation> {
        None
    }
}

pub trait Datasource {
    fn id(&self) -> &str;

    /// Layer ids in the order their tables should be merged.
    fn layers(&self, state: &PluginState) -> Vec<String>;

    fn to_expression(&self, state: &PluginState, layer_id: &str) -> Option<LayerExpression>;

    fn suggestions_for_field(
        &self,
        state: &PluginState,
        field: &DraggedField,
    ) -> Vec<DatasourceSuggestion>;

    fn public_api(&self, _state: &PluginState, _layer_id: &str) -> Box<dyn DatasourcePublicApi> {
        Box::new(NoColumns)
    }

    /// Returns the state with an empty layer added under `layer_id`.
    fn insert_layer(&self, state: &PluginState, _layer_id: &str) -> PluginState {
        state.clone()
    }
}

pub trait Visualization {
    fn id(&self) -> &str;

    fn to_expression(&self, state: &PluginState, frame: &FramePublicApi)
        -> Option<ExpressionSource>;

    fn suggestions(&self, request: &SuggestionRequest<'_>) -> Vec<VisualizationSuggestion>;

    fn visualization_types(&self) -> Vec<VisualizationType> {
        vec![VisualizationType {
            id: self.id().to_string(),
            icon: "empty".to_string(),
            label: self.id().to_string(),
        }]
    }

    fn initialize(&self, _frame: &mut FramePublicApi, state: Option<PluginState>) -> PluginState {
        state.unwrap_or(Value::Null)
    }
}

/// Frame services visible to visualizations while they build expressions.
#[derive(Default)]
pub struct FramePublicApi {
    pub datasource_layers: IndexMap<String, Box<dyn DatasourcePublicApi>>,
    new_layers: Vec<String>,
}

impl FramePublicApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, layer_id: impl Into<String>, api: Box<dyn DatasourcePublicApi>) -> Self {
        self.datasource_layers.insert(layer_id.into(), api);
        self
    }

    pub fn layer(&self, layer_id: &str) -> Option<&dyn DatasourcePublicApi> {
        self.datasource_layers.get(layer_id).map(|api| &**api)
    }

    /// Reserves a fresh layer id; the frame adds it to the active datasource afterwards.
    pub fn add_new_layer(&mut self) -> String {
        let layer_id = crate::generate_id();
        self.new_layers.push(layer_id.clone());
        layer_id
    }

    pub fn take_new_layers(&mut self) -> Vec<String> {
        std::mem::take(&mut self.new_layers)
    }
}

impl std::fmt::Debug for FramePublicApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramePublicApi")
            .field("datasource_layers", &self.datasource_layers.keys().collect::<Vec<_>>())
            .field("new_layers", &self.new_layers)
            .finish()
    }
}
