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

use crate::assembler::{Assembly, AssemblyInputs, ExpressionAssembler};
use crate::config::FrameConfig;
use crate::expression::Ast;
use crate::plugin::{DraggedField, FramePublicApi};
use crate::registry::PluginRegistry;
use crate::render_gate::{
    ExpressionRenderer, RenderGate, RenderOutcome, RenderOutcomeSender, RenderStatus,
};
use crate::state::{Action, EditorState};
use crate::suggestions::SuggestionSelector;
use tracing::debug;

pub const EMPTY_WORKSPACE_SUBJECT: &str = "empty-workspace";
pub const EXPRESSION_FAILURE_SUBJECT: &str = "expression-failure";
pub const EXPRESSION_RENDERER_SUBJECT: &str = "expression-renderer";

/// What the workspace region shows.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkspaceView {
    EmptyWorkspace,
    ExpressionFailure { message: String },
    Renderer { expression: Ast },
}

impl WorkspaceView {
    /// Marker a UI test can look the region up by.
    pub fn test_subject(&self) -> &'static str {
        match self {
            WorkspaceView::EmptyWorkspace => EMPTY_WORKSPACE_SUBJECT,
            WorkspaceView::ExpressionFailure { .. } => EXPRESSION_FAILURE_SUBJECT,
            WorkspaceView::Renderer { .. } => EXPRESSION_RENDERER_SUBJECT,
        }
    }
}

pub struct WorkspaceInputs<'a> {
    pub registry: &'a PluginRegistry,
    pub state: &'a EditorState,
    pub frame: &'a FramePublicApi,
}

pub struct WorkspacePanel {
    assembler: ExpressionAssembler,
    selector: SuggestionSelector,
    gate: RenderGate,
    expression: Option<Ast>,
}

impl Default for WorkspacePanel {
    fn default() -> Self {
        Self::new(&FrameConfig::default())
    }
}

impl WorkspacePanel {
    pub fn new(config: &FrameConfig) -> Self {
        Self {
            assembler: ExpressionAssembler::new(config.merge_function.as_str()),
            selector: SuggestionSelector::new(config.suggestions.clone()),
            gate: RenderGate::new(),
            expression: None,
        }
    }

    pub fn gate(&self) -> &RenderGate {
        &self.gate
    }

    pub fn selector(&self) -> &SuggestionSelector {
        &self.selector
    }

    /// Rebuilds the expression from `inputs` and invokes the renderer if it changed.
    pub fn update(
        &mut self,
        inputs: &WorkspaceInputs<'_>,
        renderer: &mut dyn ExpressionRenderer,
        outcomes: &RenderOutcomeSender,
    ) -> WorkspaceView {
        let state = inputs.state;
        let resolved = AssemblyInputs::resolve(
            inputs.registry,
            &state.datasource_states,
            state.visualization.active_id.as_deref(),
            &state.visualization.state,
            inputs.frame,
        );
        let assembly = match resolved {
            Ok(assembly_inputs) => self.assembler.assemble(&assembly_inputs),
            Err(reason) => Ok(Assembly::Empty(reason)),
        };

        match assembly {
            Ok(Assembly::Empty(reason)) => {
                debug!(%reason, "Showing empty workspace");
                self.expression = None;
                self.gate.show_empty();
            }
            Err(error) => {
                self.expression = None;
                self.gate.reject(error.to_string());
            }
            Ok(Assembly::Expression(ast)) => {
                if let Some(ticket) = self.gate.submit(&ast) {
                    renderer.render(&ast, ticket, outcomes);
                }
                self.expression = Some(ast);
            }
        }
        self.view()
    }

    /// Applies an outcome reported by the renderer. Returns `false` when it was stale.
    pub fn handle_outcome(&mut self, outcome: RenderOutcome) -> bool {
        self.gate.apply(outcome)
    }

    pub fn view(&self) -> WorkspaceView {
        match (self.gate.status(), &self.expression) {
            (RenderStatus::Failed { message, .. }, _) => WorkspaceView::ExpressionFailure {
                message: message.clone(),
            },
            (RenderStatus::Rendering { .. } | RenderStatus::Rendered { .. }, Some(expression)) => {
                WorkspaceView::Renderer {
                    expression: expression.clone(),
                }
            }
            _ => WorkspaceView::EmptyWorkspace,
        }
    }

    /// Runs the suggestion selector for a drop and dispatches the winning switch.
    pub fn on_drop(
        &self,
        inputs: &WorkspaceInputs<'_>,
        field: &DraggedField,
        dispatch: &mut dyn FnMut(Action),
    ) {
        if !self.selector.config().auto_apply {
            debug!(field = %field.name, "Drop not applied: auto-apply disabled");
            return;
        }
        if let Some(action) = self.selector.on_drop(inputs.registry, inputs.state, field) {
            dispatch(action);
        }
    }
}
