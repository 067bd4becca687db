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

use crate::error::StateError;
use crate::plugin::PluginState;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasourceInstanceState {
    pub state: PluginState,
    pub is_loading: bool,
}

impl DatasourceInstanceState {
    pub fn ready(state: PluginState) -> Self {
        Self {
            state,
            is_loading: false,
        }
    }

    pub fn loading() -> Self {
        Self {
            state: Value::Null,
            is_loading: true,
        }
    }
}

pub type DatasourceStates = IndexMap<String, DatasourceInstanceState>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualizationSlot {
    pub active_id: Option<String>,
    pub state: PluginState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorState {
    pub title: String,
    pub active_datasource_id: Option<String>,
    pub datasource_states: DatasourceStates,
    pub visualization: VisualizationSlot,
}

/// The only way editor state changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    SwitchVisualization {
        new_visualization_id: String,
        initial_state: PluginState,
        datasource_state: Option<PluginState>,
    },
    UpdateVisualizationState {
        new_state: PluginState,
    },
    UpdateDatasourceState {
        datasource_id: String,
        new_state: PluginState,
    },
    SwitchDatasource {
        new_datasource_id: String,
    },
    UpdateTitle {
        title: String,
    },
    Reset {
        state: Box<EditorState>,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SwitchVisualization { .. } => "SWITCH_VISUALIZATION",
            Action::UpdateVisualizationState { .. } => "UPDATE_VISUALIZATION_STATE",
            Action::UpdateDatasourceState { .. } => "UPDATE_DATASOURCE_STATE",
            Action::SwitchDatasource { .. } => "SWITCH_DATASOURCE",
            Action::UpdateTitle { .. } => "UPDATE_TITLE",
            Action::Reset { .. } => "RESET",
        }
    }
}

impl EditorState {
    pub fn new(active_datasource_id: impl Into<String>, datasource_state: PluginState) -> Self {
        let active_datasource_id = active_datasource_id.into();
        let mut datasource_states = DatasourceStates::new();
        datasource_states.insert(
            active_datasource_id.clone(),
            DatasourceInstanceState::ready(datasource_state),
        );
        Self {
            title: String::new(),
            active_datasource_id: Some(active_datasource_id),
            datasource_states,
            visualization: VisualizationSlot::default(),
        }
    }

    pub fn active_datasource_state(&self) -> Option<&DatasourceInstanceState> {
        self.active_datasource_id
            .as_deref()
            .and_then(|id| self.datasource_states.get(id))
    }

    pub fn apply(&mut self, action: Action) -> Result<(), StateError> {
        debug!(action = action.name(), "Applying editor action");
        match action {
            Action::SwitchVisualization {
                new_visualization_id,
                initial_state,
                datasource_state,
            } => {
                self.visualization.active_id = Some(new_visualization_id);
                self.visualization.state = initial_state;
                if let Some(datasource_state) = datasource_state {
                    let instance = self
                        .active_datasource_id
                        .as_deref()
                        .and_then(|id| self.datasource_states.get_mut(id));
                    match instance {
                        Some(instance) => {
                            instance.state = datasource_state;
                            instance.is_loading = false;
                        }
                        None => {
                            warn!("Dropping datasource state carried by visualization switch: no active datasource");
                        }
                    }
                }
            }
            Action::UpdateVisualizationState { new_state } => {
                if self.visualization.active_id.is_none() {
                    return Err(StateError::NoActiveVisualization);
                }
                self.visualization.state = new_state;
            }
            Action::UpdateDatasourceState {
                datasource_id,
                new_state,
            } => {
                self.datasource_states
                    .insert(datasource_id, DatasourceInstanceState::ready(new_state));
            }
            Action::SwitchDatasource { new_datasource_id } => {
                self.datasource_states
                    .entry(new_datasource_id.clone())
                    .or_insert_with(DatasourceInstanceState::loading);
                self.active_datasource_id = Some(new_datasource_id);
            }
            Action::UpdateTitle { title } => {
                self.title = title;
            }
            Action::Reset { state } => {
                *self = *state;
            }
        }
        Ok(())
    }
}
