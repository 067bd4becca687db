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

pub mod assembler;
pub mod config;
pub mod error;
pub mod expression;
pub mod frame;
pub mod plugin;
pub mod registry;
pub mod render_gate;
pub mod state;
pub mod suggestions;
pub mod workspace;

#[cfg(feature = "builtins")]
pub mod indexpattern;

#[cfg(feature = "builtins")]
pub mod visualizations;

pub use assembler::{Assembly, AssemblyInputs, EmptyReason, ExpressionAssembler};
pub use config::{FrameConfig, SuggestionConfig};
pub use error::{ErrorReporter, LensError, RenderError, Result};
pub use expression::{parse_expression, Argument, Ast, ExpressionSource, FunctionCall, ParseError};
pub use frame::EditorFrame;
pub use plugin::{
    DataType, Datasource, DatasourcePublicApi, DatasourceSuggestion, DraggedField,
    FramePublicApi, LayerExpression, Operation, PluginState, SuggestionRequest, TableSuggestion,
    TableSuggestionColumn, Visualization, VisualizationSuggestion,
};
pub use registry::PluginRegistry;
pub use render_gate::{
    ExpressionRenderer, RenderGate, RenderOutcome, RenderOutcomeSender, RenderStatus, RenderTicket,
};
pub use state::{Action, DatasourceInstanceState, DatasourceStates, EditorState};
pub use suggestions::{Suggestion, SuggestionSelector};
pub use workspace::{WorkspaceInputs, WorkspacePanel, WorkspaceView};

/// Fresh id for layers and columns.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
