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

#![allow(dead_code)]

use lens::expression::{Ast, ExpressionSource};
use lens::plugin::{
    DataType, Datasource, DatasourceSuggestion, DraggedField, FramePublicApi, LayerExpression,
    Operation, PluginState, SuggestionRequest, TableSuggestion, TableSuggestionColumn,
    Visualization, VisualizationSuggestion,
};
use lens::render_gate::{ExpressionRenderer, RenderOutcomeSender, RenderTicket};
use lens::RenderError;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Datasource with canned layers, expressions and drop candidates.
pub struct MockDatasource {
    pub id: String,
    pub layers: Vec<String>,
    pub expressions: HashMap<String, LayerExpression>,
    pub candidates: Vec<DatasourceSuggestion>,
    pub dropped: Rc<RefCell<Vec<String>>>,
}

impl MockDatasource {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            layers: Vec::new(),
            expressions: HashMap::new(),
            candidates: Vec::new(),
            dropped: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn with_layer(mut self, layer_id: &str, expression: impl Into<LayerExpression>) -> Self {
        self.layers.push(layer_id.to_string());
        self.expressions.insert(layer_id.to_string(), expression.into());
        self
    }

    /// A layer that produces no expression.
    pub fn with_empty_layer(mut self, layer_id: &str) -> Self {
        self.layers.push(layer_id.to_string());
        self
    }

    pub fn with_candidate(mut self, candidate: DatasourceSuggestion) -> Self {
        self.candidates.push(candidate);
        self
    }
}

impl Datasource for MockDatasource {
    fn id(&self) -> &str {
        &self.id
    }

    fn layers(&self, _state: &PluginState) -> Vec<String> {
        self.layers.clone()
    }

    fn to_expression(&self, _state: &PluginState, layer_id: &str) -> Option<LayerExpression> {
        self.expressions.get(layer_id).cloned()
    }

    fn suggestions_for_field(
        &self,
        _state: &PluginState,
        field: &DraggedField,
    ) -> Vec<DatasourceSuggestion> {
        self.dropped.borrow_mut().push(field.name.clone());
        self.candidates.clone()
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub tables: Vec<TableSuggestion>,
    pub state: Option<PluginState>,
}

/// Visualization with a fixed expression and fixed proposals.
pub struct MockVisualization {
    pub id: String,
    pub expression: Option<ExpressionSource>,
    pub proposals: Vec<VisualizationSuggestion>,
    pub requests: Rc<RefCell<Vec<RecordedRequest>>>,
}

impl MockVisualization {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            expression: None,
            proposals: Vec::new(),
            requests: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn with_expression(mut self, expression: impl Into<ExpressionSource>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    pub fn with_proposal(mut self, proposal: VisualizationSuggestion) -> Self {
        self.proposals.push(proposal);
        self
    }
}

impl Visualization for MockVisualization {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_expression(
        &self,
        _state: &PluginState,
        _frame: &FramePublicApi,
    ) -> Option<ExpressionSource> {
        self.expression.clone()
    }

    fn suggestions(&self, request: &SuggestionRequest<'_>) -> Vec<VisualizationSuggestion> {
        self.requests.borrow_mut().push(RecordedRequest {
            tables: request.tables.to_vec(),
            state: request.state.cloned(),
        });
        self.proposals.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Respond {
    Complete,
    Fail,
    /// Leave the outcome to the test.
    Defer,
}

/// Renderer that records every expression it was asked to evaluate.
pub struct RecordingRenderer {
    pub respond: Respond,
    pub rendered: Vec<(Ast, RenderTicket)>,
}

impl RecordingRenderer {
    pub fn new(respond: Respond) -> Self {
        Self {
            respond,
            rendered: Vec::new(),
        }
    }

    pub fn calls(&self) -> usize {
        self.rendered.len()
    }

    pub fn last_ticket(&self) -> Option<RenderTicket> {
        self.rendered.last().map(|(_, ticket)| *ticket)
    }
}

impl ExpressionRenderer for RecordingRenderer {
    fn render(&mut self, expression: &Ast, ticket: RenderTicket, outcomes: &RenderOutcomeSender) {
        self.rendered.push((expression.clone(), ticket));
        match self.respond {
            Respond::Complete => outcomes.complete(ticket),
            Respond::Fail => outcomes.fail(ticket, RenderError::new("interpreter", "boom")),
            Respond::Defer => {}
        }
    }
}

pub fn table(datasource_suggestion_id: usize, layer_id: &str) -> TableSuggestion {
    TableSuggestion {
        datasource_suggestion_id,
        is_multi_row: false,
        columns: vec![TableSuggestionColumn {
            column_id: "col1".to_string(),
            operation: Operation {
                data_type: DataType::Number,
                is_bucketed: false,
                label: "Count of documents".to_string(),
            },
        }],
        layer_id: layer_id.to_string(),
    }
}

pub fn candidate(datasource_suggestion_id: usize, state: Value) -> DatasourceSuggestion {
    DatasourceSuggestion {
        state,
        table: table(datasource_suggestion_id, "first"),
    }
}

pub fn proposal(score: f64, title: &str, datasource_suggestion_id: usize) -> VisualizationSuggestion {
    VisualizationSuggestion {
        score,
        title: title.to_string(),
        state: json!({ "title": title }),
        datasource_suggestion_id,
        preview_icon: "empty".to_string(),
    }
}

pub fn field(name: &str, field_type: DataType) -> DraggedField {
    DraggedField {
        name: name.to_string(),
        field_type,
        aggregatable: true,
        searchable: true,
    }
}
