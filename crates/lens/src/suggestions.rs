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

use crate::config::SuggestionConfig;
use crate::plugin::{DatasourceSuggestion, DraggedField, PluginState, SuggestionRequest, TableSuggestion};
use crate::registry::PluginRegistry;
use crate::state::{Action, EditorState};
use tracing::{debug, info, warn};

/// A visualization proposal joined with the datasource state it depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub visualization_id: String,
    pub score: f64,
    pub title: String,
    pub preview_icon: String,
    pub state: PluginState,
    pub datasource_suggestion_id: usize,
    pub datasource_state: PluginState,
}

impl Suggestion {
    pub fn into_switch_action(self) -> Action {
        Action::SwitchVisualization {
            new_visualization_id: self.visualization_id,
            initial_state: self.state,
            datasource_state: Some(self.datasource_state),
        }
    }
}

/// Asks every registered visualization to score the candidate tables.
///
/// The result is ordered by descending score. The sort is stable, so equal
/// scores keep registry order and then the order each visualization
/// returned them in.
pub fn collect_suggestions(
    datasource_suggestions: &[DatasourceSuggestion],
    registry: &PluginRegistry,
    active_visualization_id: Option<&str>,
    visualization_state: &PluginState,
) -> Vec<Suggestion> {
    let tables: Vec<TableSuggestion> = datasource_suggestions
        .iter()
        .map(|suggestion| suggestion.table.clone())
        .collect();

    let mut suggestions = Vec::new();
    for (visualization_id, visualization) in registry.visualizations() {
        let request = SuggestionRequest {
            tables: &tables,
            state: (active_visualization_id == Some(visualization_id))
                .then_some(visualization_state),
        };
        for proposal in visualization.suggestions(&request) {
            if !proposal.score.is_finite() {
                warn!(
                    visualization_id,
                    title = %proposal.title,
                    "Discarding suggestion with non-finite score"
                );
                continue;
            }
            let Some(source) = datasource_suggestions
                .iter()
                .find(|s| s.table.datasource_suggestion_id == proposal.datasource_suggestion_id)
            else {
                warn!(
                    visualization_id,
                    datasource_suggestion_id = proposal.datasource_suggestion_id,
                    "Discarding suggestion for unknown datasource candidate"
                );
                continue;
            };
            suggestions.push(Suggestion {
                visualization_id: visualization_id.to_string(),
                score: proposal.score,
                title: proposal.title,
                preview_icon: proposal.preview_icon,
                state: proposal.state,
                datasource_suggestion_id: proposal.datasource_suggestion_id,
                datasource_state: source.state.clone(),
            });
        }
    }
    suggestions.sort_by(|a, b| b.score.total_cmp(&a.score));
    suggestions
}

#[derive(Debug, Clone, Default)]
pub struct SuggestionSelector {
    config: SuggestionConfig,
}

impl SuggestionSelector {
    pub fn new(config: SuggestionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SuggestionConfig {
        &self.config
    }

    /// All suggestions for dropping `field`, best first, capped at `max_suggestions`.
    pub fn suggestions_for_drop(
        &self,
        registry: &PluginRegistry,
        state: &EditorState,
        field: &DraggedField,
    ) -> Vec<Suggestion> {
        let Some(datasource_id) = state.active_datasource_id.as_deref() else {
            debug!(field = %field.name, "Drop ignored: no active datasource");
            return Vec::new();
        };
        let Some(datasource) = registry.datasource(datasource_id) else {
            warn!(datasource_id, "Drop ignored: active datasource is not registered");
            return Vec::new();
        };
        let Some(instance) = state.datasource_states.get(datasource_id) else {
            debug!(datasource_id, "Drop ignored: active datasource has no state");
            return Vec::new();
        };
        if instance.is_loading {
            debug!(datasource_id, "Drop ignored: active datasource is loading");
            return Vec::new();
        }

        let candidates = datasource.suggestions_for_field(&instance.state, field);
        debug!(
            datasource_id,
            field = %field.name,
            candidates = candidates.len(),
            "Datasource candidates for dropped field"
        );
        let mut suggestions = collect_suggestions(
            &candidates,
            registry,
            state.visualization.active_id.as_deref(),
            &state.visualization.state,
        );
        if let Some(min_score) = self.config.min_score {
            suggestions.retain(|s| s.score >= min_score);
        }
        suggestions.truncate(self.config.max_suggestions);
        suggestions
    }

    /// The switch action for the best suggestion, if there is one.
    pub fn on_drop(
        &self,
        registry: &PluginRegistry,
        state: &EditorState,
        field: &DraggedField,
    ) -> Option<Action> {
        let best = self
            .suggestions_for_drop(registry, state, field)
            .into_iter()
            .next();
        match best {
            Some(suggestion) => {
                info!(
                    visualization_id = %suggestion.visualization_id,
                    score = suggestion.score,
                    title = %suggestion.title,
                    "Selected suggestion for dropped field"
                );
                Some(suggestion.into_switch_action())
            }
            None => {
                debug!(field = %field.name, "No suggestion for dropped field");
                None
            }
        }
    }
}
