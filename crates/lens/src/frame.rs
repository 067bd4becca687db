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

use crate::config::FrameConfig;
use crate::error::{Result, StateError};
use crate::plugin::{DraggedField, FramePublicApi};
use crate::registry::PluginRegistry;
use crate::render_gate::{
    render_outcome_channel, ExpressionRenderer, RenderOutcomeReceiver, RenderOutcomeSender,
};
use crate::state::{Action, EditorState};
use crate::suggestions::Suggestion;
use crate::workspace::{WorkspaceInputs, WorkspacePanel, WorkspaceView};
use tracing::{debug, info};

/// Owns the editor state and applies every action to it.
pub struct EditorFrame {
    config: FrameConfig,
    registry: PluginRegistry,
    state: EditorState,
    panel: WorkspacePanel,
    outcome_tx: RenderOutcomeSender,
    outcome_rx: RenderOutcomeReceiver,
}

impl EditorFrame {
    pub fn new(registry: PluginRegistry, state: EditorState, config: FrameConfig) -> Result<Self> {
        config.validate()?;
        if let Some(id) = state.active_datasource_id.as_deref() {
            registry.require_datasource(id)?;
        }
        let (outcome_tx, outcome_rx) = render_outcome_channel();
        info!(
            datasources = registry.datasource_ids().len(),
            visualizations = registry.visualization_ids().len(),
            "Editor frame ready"
        );
        Ok(Self {
            panel: WorkspacePanel::new(&config),
            config,
            registry,
            state,
            outcome_tx,
            outcome_rx,
        })
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn panel(&self) -> &WorkspacePanel {
        &self.panel
    }

    pub fn dispatch(&mut self, action: Action) -> Result<()> {
        self.state.apply(action)?;
        Ok(())
    }

    /// Column lookups for every layer of every loaded datasource.
    pub fn frame_api(&self) -> FramePublicApi {
        let mut frame = FramePublicApi::new();
        for (datasource_id, instance) in &self.state.datasource_states {
            if instance.is_loading {
                continue;
            }
            let Some(datasource) = self.registry.datasource(datasource_id) else {
                continue;
            };
            for layer_id in datasource.layers(&instance.state) {
                let api = datasource.public_api(&instance.state, &layer_id);
                frame.datasource_layers.insert(layer_id, api);
            }
        }
        frame
    }

    /// Makes `visualization_id` active with its initial state, adding any layers it asks for.
    pub fn switch_visualization(&mut self, visualization_id: &str) -> Result<()> {
        let visualization = self.registry.require_visualization(visualization_id)?;
        let mut frame = self.frame_api();
        let initial_state = visualization.initialize(&mut frame, None);
        let new_layers = frame.take_new_layers();

        let datasource_state = if new_layers.is_empty() {
            None
        } else {
            let datasource_id = self
                .state
                .active_datasource_id
                .as_deref()
                .ok_or(StateError::NoActiveDatasource)?;
            let datasource = self.registry.require_datasource(datasource_id)?;
            let mut datasource_state = self
                .state
                .datasource_states
                .get(datasource_id)
                .map(|instance| instance.state.clone())
                .unwrap_or_default();
            for layer_id in &new_layers {
                debug!(datasource_id, layer_id = %layer_id, "Adding layer for visualization");
                datasource_state = datasource.insert_layer(&datasource_state, layer_id);
            }
            Some(datasource_state)
        };

        self.dispatch(Action::SwitchVisualization {
            new_visualization_id: visualization_id.to_string(),
            initial_state,
            datasource_state,
        })
    }

    pub fn suggestions_for_drop(&self, field: &DraggedField) -> Vec<Suggestion> {
        self.panel
            .selector()
            .suggestions_for_drop(&self.registry, &self.state, field)
    }

    /// Runs the drop through the panel and applies whatever it dispatches.
    pub fn handle_drop(&mut self, field: &DraggedField) -> Result<Option<Action>> {
        let frame = self.frame_api();
        let inputs = WorkspaceInputs {
            registry: &self.registry,
            state: &self.state,
            frame: &frame,
        };
        let mut dispatched = Vec::new();
        self.panel
            .on_drop(&inputs, field, &mut |action| dispatched.push(action));
        let applied = dispatched.last().cloned();
        for action in dispatched {
            self.dispatch(action)?;
        }
        Ok(applied)
    }

    pub fn render(&mut self, renderer: &mut dyn ExpressionRenderer) -> WorkspaceView {
        let frame = self.frame_api();
        let inputs = WorkspaceInputs {
            registry: &self.registry,
            state: &self.state,
            frame: &frame,
        };
        self.panel.update(&inputs, renderer, &self.outcome_tx)
    }

    pub fn outcome_sender(&self) -> RenderOutcomeSender {
        self.outcome_tx.clone()
    }

    /// Applies render outcomes that arrived since the last call. Returns how many were current.
    pub fn drain_render_outcomes(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            if self.panel.handle_outcome(outcome) {
                applied += 1;
            }
        }
        applied
    }

    pub fn view(&self) -> WorkspaceView {
        self.panel.view()
    }
}
