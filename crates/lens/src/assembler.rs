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

//! Builds the full expression: one merge step over every layer's tables,
//! followed by the visualization's own chain.

use crate::config::DEFAULT_MERGE_FUNCTION;
use crate::error::{AssemblyError, ExpressionOrigin};
use crate::expression::{Argument, Ast, ExpressionSource, FunctionCall};
use crate::plugin::{FramePublicApi, PluginState, Visualization};
use crate::registry::PluginRegistry;
use crate::state::DatasourceStates;
use std::fmt;
use tracing::{debug, warn};

/// Why no expression could be produced. None of these is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    NoActiveVisualization,
    UnknownVisualization { visualization_id: String },
    VisualizationProducedNothing { visualization_id: String },
    DatasourceLoading { datasource_id: String },
    DatasourceProducedNothing { datasource_id: String, layer_id: String },
    NoLayers,
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyReason::NoActiveVisualization => write!(f, "no active visualization"),
            EmptyReason::UnknownVisualization { visualization_id } => {
                write!(f, "visualization '{visualization_id}' is not registered")
            }
            EmptyReason::VisualizationProducedNothing { visualization_id } => {
                write!(f, "visualization '{visualization_id}' produced no expression")
            }
            EmptyReason::DatasourceLoading { datasource_id } => {
                write!(f, "datasource '{datasource_id}' is still loading")
            }
            EmptyReason::DatasourceProducedNothing {
                datasource_id,
                layer_id,
            } => write!(
                f,
                "datasource '{datasource_id}' produced no expression for layer '{layer_id}'"
            ),
            EmptyReason::NoLayers => write!(f, "no active layers"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Assembly {
    Empty(EmptyReason),
    Expression(Ast),
}

impl Assembly {
    pub fn expression(&self) -> Option<&Ast> {
        match self {
            Assembly::Expression(ast) => Some(ast),
            Assembly::Empty(_) => None,
        }
    }

    pub fn into_expression(self) -> Option<Ast> {
        match self {
            Assembly::Expression(ast) => Some(ast),
            Assembly::Empty(_) => None,
        }
    }
}

/// The active visualization together with its id and state.
#[derive(Clone, Copy)]
pub struct ActiveVisualization<'a> {
    pub id: &'a str,
    pub visualization: &'a dyn Visualization,
    pub state: &'a PluginState,
}

pub struct AssemblyInputs<'a> {
    pub registry: &'a PluginRegistry,
    pub datasource_states: &'a DatasourceStates,
    pub visualization: Option<ActiveVisualization<'a>>,
    pub frame: &'a FramePublicApi,
}

impl<'a> AssemblyInputs<'a> {
    /// Resolves the active visualization id against the registry.
    pub fn resolve(
        registry: &'a PluginRegistry,
        datasource_states: &'a DatasourceStates,
        active_visualization_id: Option<&'a str>,
        visualization_state: &'a PluginState,
        frame: &'a FramePublicApi,
    ) -> Result<Self, EmptyReason> {
        let visualization = match active_visualization_id {
            None => None,
            Some(id) => {
                let visualization =
                    registry
                        .visualization(id)
                        .ok_or_else(|| EmptyReason::UnknownVisualization {
                            visualization_id: id.to_string(),
                        })?;
                Some(ActiveVisualization {
                    id,
                    visualization,
                    state: visualization_state,
                })
            }
        };
        Ok(Self {
            registry,
            datasource_states,
            visualization,
            frame,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ExpressionAssembler {
    merge_function: String,
}

impl Default for ExpressionAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MERGE_FUNCTION)
    }
}

impl ExpressionAssembler {
    pub fn new(merge_function: impl Into<String>) -> Self {
        Self {
            merge_function: merge_function.into(),
        }
    }

    pub fn merge_function(&self) -> &str {
        &self.merge_function
    }

    pub fn assemble(&self, inputs: &AssemblyInputs<'_>) -> Result<Assembly, AssemblyError> {
        let Some(active) = inputs.visualization else {
            return Ok(Assembly::Empty(EmptyReason::NoActiveVisualization));
        };
        let Some(visualization_expression) =
            active.visualization.to_expression(active.state, inputs.frame)
        else {
            return Ok(Assembly::Empty(EmptyReason::VisualizationProducedNothing {
                visualization_id: active.id.to_string(),
            }));
        };

        let mut layer_ids: Vec<String> = Vec::new();
        let mut tables: Vec<(ExpressionOrigin, ExpressionSource)> = Vec::new();
        for (datasource_id, instance) in inputs.datasource_states {
            let Some(datasource) = inputs.registry.datasource(datasource_id) else {
                warn!(datasource_id = %datasource_id, "Skipping state of unregistered datasource");
                continue;
            };
            if instance.is_loading {
                return Ok(Assembly::Empty(EmptyReason::DatasourceLoading {
                    datasource_id: datasource_id.clone(),
                }));
            }
            for layer_id in datasource.layers(&instance.state) {
                let layer_expression = datasource
                    .to_expression(&instance.state, &layer_id)
                    .filter(|expression| !expression.tables.is_empty());
                let Some(layer_expression) = layer_expression else {
                    return Ok(Assembly::Empty(EmptyReason::DatasourceProducedNothing {
                        datasource_id: datasource_id.clone(),
                        layer_id,
                    }));
                };
                for table in layer_expression.tables {
                    layer_ids.push(layer_id.clone());
                    tables.push((
                        ExpressionOrigin::Datasource {
                            datasource_id: datasource_id.clone(),
                            layer_id: layer_id.clone(),
                        },
                        table,
                    ));
                }
            }
        }
        if tables.is_empty() {
            return Ok(Assembly::Empty(EmptyReason::NoLayers));
        }

        let parsed_tables = tables
            .into_iter()
            .map(|(origin, table)| {
                table
                    .into_ast()
                    .map_err(|source| AssemblyError::MalformedExpression { origin, source })
            })
            .collect::<Result<Vec<Ast>, _>>()?;
        let visualization_ast = visualization_expression.into_ast().map_err(|source| {
            AssemblyError::MalformedExpression {
                origin: ExpressionOrigin::Visualization {
                    visualization_id: active.id.to_string(),
                },
                source,
            }
        })?;

        let merge = FunctionCall::new(self.merge_function.as_str())
            .with_args("layerIds", layer_ids.into_iter().map(Argument::String))
            .with_args("tables", parsed_tables.into_iter().map(Argument::Expression));
        let mut chain = Vec::with_capacity(visualization_ast.chain.len() + 1);
        chain.push(merge);
        chain.extend(visualization_ast.chain);
        let ast = Ast::new(chain);
        debug!(
            visualization_id = active.id,
            steps = ast.chain.len(),
            "Assembled expression"
        );
        Ok(Assembly::Expression(ast))
    }
}
