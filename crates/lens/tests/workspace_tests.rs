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

mod common;

use common::{MockDatasource, MockVisualization, RecordingRenderer, Respond};
use lens::plugin::FramePublicApi;
use lens::render_gate::{render_outcome_channel, RenderStatus};
use lens::state::DatasourceInstanceState;
use lens::workspace::{
    EMPTY_WORKSPACE_SUBJECT, EXPRESSION_FAILURE_SUBJECT, EXPRESSION_RENDERER_SUBJECT,
};
use lens::{EditorState, PluginRegistry, WorkspaceInputs, WorkspacePanel, WorkspaceView};
use serde_json::Value;

fn registry_with(datasource: MockDatasource, visualization: MockVisualization) -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.register_datasource(Box::new(datasource)).unwrap();
    registry.register_visualization(Box::new(visualization)).unwrap();
    registry
}

fn active_state(visualization_id: &str) -> EditorState {
    let mut state = EditorState::new("mock", Value::Null);
    state.visualization.active_id = Some(visualization_id.to_string());
    state
}

fn update(
    panel: &mut WorkspacePanel,
    registry: &PluginRegistry,
    state: &EditorState,
    renderer: &mut RecordingRenderer,
) -> WorkspaceView {
    let frame = FramePublicApi::new();
    let (tx, mut rx) = render_outcome_channel();
    let inputs = WorkspaceInputs {
        registry,
        state,
        frame: &frame,
    };
    panel.update(&inputs, renderer, &tx);
    while let Ok(outcome) = rx.try_recv() {
        panel.handle_outcome(outcome);
    }
    panel.view()
}

#[test]
fn test_empty_placeholder_without_visualization() {
    let registry = registry_with(
        MockDatasource::new("mock").with_layer("first", "datasource"),
        MockVisualization::new("vis").with_expression("vis"),
    );
    let state = EditorState::new("mock", Value::Null);
    let mut panel = WorkspacePanel::default();
    let mut renderer = RecordingRenderer::new(Respond::Complete);

    let view = update(&mut panel, &registry, &state, &mut renderer);
    assert_eq!(view, WorkspaceView::EmptyWorkspace);
    assert_eq!(view.test_subject(), EMPTY_WORKSPACE_SUBJECT);
    assert_eq!(renderer.calls(), 0);
}

#[test]
fn test_empty_placeholder_when_visualization_produces_nothing() {
    let registry = registry_with(
        MockDatasource::new("mock").with_layer("first", "datasource"),
        MockVisualization::new("vis"),
    );
    let mut panel = WorkspacePanel::default();
    let mut renderer = RecordingRenderer::new(Respond::Complete);

    let view = update(&mut panel, &registry, &active_state("vis"), &mut renderer);
    assert_eq!(view, WorkspaceView::EmptyWorkspace);
    assert_eq!(renderer.calls(), 0);
}

#[test]
fn test_empty_placeholder_when_datasource_produces_nothing() {
    let registry = registry_with(
        MockDatasource::new("mock").with_empty_layer("first"),
        MockVisualization::new("vis").with_expression("vis"),
    );
    let mut panel = WorkspacePanel::default();
    let mut renderer = RecordingRenderer::new(Respond::Complete);

    let view = update(&mut panel, &registry, &active_state("vis"), &mut renderer);
    assert_eq!(view, WorkspaceView::EmptyWorkspace);
    assert_eq!(renderer.calls(), 0);
}

#[test]
fn test_renders_assembled_expression() {
    let registry = registry_with(
        MockDatasource::new("mock").with_layer("first", "datasource"),
        MockVisualization::new("vis").with_expression("vis"),
    );
    let mut panel = WorkspacePanel::default();
    let mut renderer = RecordingRenderer::new(Respond::Complete);

    let view = update(&mut panel, &registry, &active_state("vis"), &mut renderer);
    assert_eq!(view.test_subject(), EXPRESSION_RENDERER_SUBJECT);
    assert_eq!(renderer.calls(), 1);
    assert_eq!(
        renderer.rendered[0].0.to_string(),
        "lens_merge_tables layerIds=first tables={datasource} | vis"
    );
    assert!(matches!(panel.gate().status(), RenderStatus::Rendered { .. }));
}

#[test]
fn test_unparsable_expression_shows_failure_without_rendering() {
    let registry = registry_with(
        MockDatasource::new("mock").with_layer("first", "datasource"),
        MockVisualization::new("vis").with_expression("|||"),
    );
    let mut panel = WorkspacePanel::default();
    let mut renderer = RecordingRenderer::new(Respond::Complete);

    let view = update(&mut panel, &registry, &active_state("vis"), &mut renderer);
    assert_eq!(view.test_subject(), EXPRESSION_FAILURE_SUBJECT);
    assert!(matches!(view, WorkspaceView::ExpressionFailure { message } if message.contains("vis")));
    assert_eq!(renderer.calls(), 0);
}

#[test]
fn test_identical_expression_renders_once() {
    let registry = registry_with(
        MockDatasource::new("mock").with_layer("first", "datasource"),
        MockVisualization::new("vis").with_expression("vis"),
    );
    let state = active_state("vis");
    let mut panel = WorkspacePanel::default();
    let mut renderer = RecordingRenderer::new(Respond::Complete);

    update(&mut panel, &registry, &state, &mut renderer);
    let view = update(&mut panel, &registry, &state, &mut renderer);
    assert_eq!(view.test_subject(), EXPRESSION_RENDERER_SUBJECT);
    assert_eq!(renderer.calls(), 1);
}

#[test]
fn test_changed_expression_after_render_failure_renders_again() {
    let failing = registry_with(
        MockDatasource::new("mock").with_layer("first", "datasource"),
        MockVisualization::new("vis").with_expression("vis"),
    );
    let state = active_state("vis");
    let mut panel = WorkspacePanel::default();
    let mut renderer = RecordingRenderer::new(Respond::Fail);

    let view = update(&mut panel, &failing, &state, &mut renderer);
    assert_eq!(view.test_subject(), EXPRESSION_FAILURE_SUBJECT);

    // unchanged expression keeps the failure
    let view = update(&mut panel, &failing, &state, &mut renderer);
    assert_eq!(view.test_subject(), EXPRESSION_FAILURE_SUBJECT);
    assert_eq!(renderer.calls(), 1);

    let changed = registry_with(
        MockDatasource::new("mock").with_layer("first", "new_datasource"),
        MockVisualization::new("vis").with_expression("vis"),
    );
    renderer.respond = Respond::Complete;
    let view = update(&mut panel, &changed, &state, &mut renderer);
    assert_eq!(renderer.calls(), 2);
    assert_eq!(view.test_subject(), EXPRESSION_RENDERER_SUBJECT);
}

#[test]
fn test_late_outcome_for_replaced_expression_is_ignored() {
    let first = registry_with(
        MockDatasource::new("mock").with_layer("first", "datasource"),
        MockVisualization::new("vis").with_expression("vis"),
    );
    let second = registry_with(
        MockDatasource::new("mock").with_layer("first", "datasource"),
        MockVisualization::new("vis").with_expression("vis x=2"),
    );
    let state = active_state("vis");
    let mut panel = WorkspacePanel::default();
    let mut renderer = RecordingRenderer::new(Respond::Defer);
    let frame = FramePublicApi::new();
    let (tx, _rx) = render_outcome_channel();

    panel.update(
        &WorkspaceInputs { registry: &first, state: &state, frame: &frame },
        &mut renderer,
        &tx,
    );
    let stale = renderer.last_ticket().unwrap();
    panel.update(
        &WorkspaceInputs { registry: &second, state: &state, frame: &frame },
        &mut renderer,
        &tx,
    );

    assert!(!panel.handle_outcome(lens::RenderOutcome {
        ticket: stale,
        result: Err(lens::RenderError::new("interpreter", "boom")),
    }));
    assert_eq!(panel.view().test_subject(), EXPRESSION_RENDERER_SUBJECT);
}

#[test]
fn test_loading_datasource_shows_empty_placeholder() {
    let registry = registry_with(
        MockDatasource::new("mock").with_layer("first", "datasource"),
        MockVisualization::new("vis").with_expression("vis"),
    );
    let mut state = active_state("vis");
    state
        .datasource_states
        .insert("mock".to_string(), DatasourceInstanceState::loading());
    let mut panel = WorkspacePanel::default();
    let mut renderer = RecordingRenderer::new(Respond::Complete);

    let view = update(&mut panel, &registry, &state, &mut renderer);
    assert_eq!(view, WorkspaceView::EmptyWorkspace);
    assert_eq!(renderer.calls(), 0);
}
