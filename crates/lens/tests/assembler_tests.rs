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

use common::{MockDatasource, MockVisualization};
use lens::assembler::{Assembly, AssemblyInputs, EmptyReason, ExpressionAssembler};
use lens::error::{AssemblyError, ExpressionOrigin};
use lens::expression::{parse_expression, Argument, ParseError};
use lens::plugin::{FramePublicApi, LayerExpression};
use lens::state::{DatasourceInstanceState, DatasourceStates};
use lens::PluginRegistry;
use serde_json::{json, Value};

fn ready_states(ids: &[&str]) -> DatasourceStates {
    ids.iter()
        .map(|id| (id.to_string(), DatasourceInstanceState::ready(Value::Null)))
        .collect()
}

fn assemble(
    registry: &PluginRegistry,
    states: &DatasourceStates,
    visualization_id: Option<&str>,
) -> Result<Assembly, AssemblyError> {
    let frame = FramePublicApi::new();
    let visualization_state = Value::Null;
    let inputs = AssemblyInputs::resolve(
        registry,
        states,
        visualization_id,
        &visualization_state,
        &frame,
    );
    match inputs {
        Ok(inputs) => ExpressionAssembler::default().assemble(&inputs),
        Err(reason) => Ok(Assembly::Empty(reason)),
    }
}

fn two_layer_registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry
        .register_datasource(Box::new(
            MockDatasource::new("mock").with_layer("first", "datasource"),
        ))
        .unwrap();
    registry
        .register_datasource(Box::new(MockDatasource::new("mock2").with_layer(
            "second",
            LayerExpression::multiple(["datasource2", "datasource2 | 2"]),
        )))
        .unwrap();
    registry
        .register_visualization(Box::new(MockVisualization::new("vis").with_expression("vis")))
        .unwrap();
    registry
}

#[test]
fn test_merges_fanned_out_layers_in_order() {
    let registry = two_layer_registry();
    let states = ready_states(&["mock", "mock2"]);

    let ast = assemble(&registry, &states, Some("vis"))
        .unwrap()
        .into_expression()
        .unwrap();

    assert_eq!(ast.chain.len(), 2);
    let merge = &ast.chain[0];
    assert_eq!(merge.function, "lens_merge_tables");
    let layer_ids: Vec<&str> = merge
        .arg("layerIds")
        .iter()
        .filter_map(Argument::as_str)
        .collect();
    assert_eq!(layer_ids, vec!["first", "second", "second"]);

    let tables: Vec<String> = merge
        .arg("tables")
        .iter()
        .filter_map(Argument::as_expression)
        .map(|table| table.to_string())
        .collect();
    assert_eq!(tables, vec!["datasource", "datasource2", "datasource2 | 2"]);
    assert_eq!(ast.chain[1].function, "vis");
}

#[test]
fn test_expression_tree_shape() {
    let mut registry = PluginRegistry::new();
    registry
        .register_datasource(Box::new(MockDatasource::new("mock").with_layer("first", "datasource")))
        .unwrap();
    registry
        .register_visualization(Box::new(MockVisualization::new("vis").with_expression("vis")))
        .unwrap();
    let states = ready_states(&["mock"]);

    let ast = assemble(&registry, &states, Some("vis"))
        .unwrap()
        .into_expression()
        .unwrap();

    assert_eq!(
        serde_json::to_value(&ast).unwrap(),
        json!({
            "type": "expression",
            "chain": [
                {
                    "type": "function",
                    "function": "lens_merge_tables",
                    "arguments": {
                        "layerIds": ["first"],
                        "tables": [{
                            "type": "expression",
                            "chain": [{ "type": "function", "function": "datasource", "arguments": {} }]
                        }]
                    }
                },
                { "type": "function", "function": "vis", "arguments": {} }
            ]
        })
    );
}

#[test]
fn test_structured_and_text_outputs_assemble_alike() {
    let mut registry = PluginRegistry::new();
    registry
        .register_datasource(Box::new(
            MockDatasource::new("mock")
                .with_layer("first", parse_expression("esaggs index=logs").unwrap()),
        ))
        .unwrap();
    registry
        .register_visualization(Box::new(
            MockVisualization::new("vis").with_expression("lens_metric_chart accessor=a"),
        ))
        .unwrap();
    let states = ready_states(&["mock"]);

    let ast = assemble(&registry, &states, Some("vis"))
        .unwrap()
        .into_expression()
        .unwrap();
    assert_eq!(
        ast.to_string(),
        "lens_merge_tables layerIds=first tables={esaggs index=logs} | lens_metric_chart accessor=a"
    );
}

#[test]
fn test_empty_without_active_visualization() {
    let registry = two_layer_registry();
    let states = ready_states(&["mock", "mock2"]);
    assert_eq!(
        assemble(&registry, &states, None).unwrap(),
        Assembly::Empty(EmptyReason::NoActiveVisualization)
    );
}

#[test]
fn test_empty_for_unregistered_visualization() {
    let registry = two_layer_registry();
    let states = ready_states(&["mock", "mock2"]);
    assert_eq!(
        assemble(&registry, &states, Some("missing")).unwrap(),
        Assembly::Empty(EmptyReason::UnknownVisualization {
            visualization_id: "missing".to_string()
        })
    );
}

#[test]
fn test_empty_when_visualization_produces_nothing() {
    let mut registry = PluginRegistry::new();
    registry
        .register_datasource(Box::new(MockDatasource::new("mock").with_layer("first", "datasource")))
        .unwrap();
    registry
        .register_visualization(Box::new(MockVisualization::new("vis")))
        .unwrap();
    let states = ready_states(&["mock"]);

    assert!(matches!(
        assemble(&registry, &states, Some("vis")).unwrap(),
        Assembly::Empty(EmptyReason::VisualizationProducedNothing { .. })
    ));
}

#[test]
fn test_empty_when_any_layer_produces_nothing() {
    let mut registry = PluginRegistry::new();
    registry
        .register_datasource(Box::new(
            MockDatasource::new("mock")
                .with_layer("first", "datasource")
                .with_empty_layer("second"),
        ))
        .unwrap();
    registry
        .register_visualization(Box::new(MockVisualization::new("vis").with_expression("vis")))
        .unwrap();
    let states = ready_states(&["mock"]);

    assert_eq!(
        assemble(&registry, &states, Some("vis")).unwrap(),
        Assembly::Empty(EmptyReason::DatasourceProducedNothing {
            datasource_id: "mock".to_string(),
            layer_id: "second".to_string(),
        })
    );
}

#[test]
fn test_empty_while_datasource_loading() {
    let registry = two_layer_registry();
    let mut states = ready_states(&["mock"]);
    states.insert("mock2".to_string(), DatasourceInstanceState::loading());

    assert!(matches!(
        assemble(&registry, &states, Some("vis")).unwrap(),
        Assembly::Empty(EmptyReason::DatasourceLoading { datasource_id }) if datasource_id == "mock2"
    ));
}

#[test]
fn test_empty_without_layers() {
    let mut registry = PluginRegistry::new();
    registry
        .register_datasource(Box::new(MockDatasource::new("mock")))
        .unwrap();
    registry
        .register_visualization(Box::new(MockVisualization::new("vis").with_expression("vis")))
        .unwrap();
    let states = ready_states(&["mock"]);

    assert_eq!(
        assemble(&registry, &states, Some("vis")).unwrap(),
        Assembly::Empty(EmptyReason::NoLayers)
    );
}

#[test]
fn test_skips_state_of_unregistered_datasource() {
    let registry = two_layer_registry();
    let states = ready_states(&["mock", "retired", "mock2"]);

    let ast = assemble(&registry, &states, Some("vis"))
        .unwrap()
        .into_expression()
        .unwrap();
    assert_eq!(ast.chain[0].arg("layerIds").len(), 3);
}

#[test]
fn test_malformed_layer_expression_names_its_origin() {
    let mut registry = PluginRegistry::new();
    registry
        .register_datasource(Box::new(MockDatasource::new("mock").with_layer("first", "|||")))
        .unwrap();
    registry
        .register_visualization(Box::new(MockVisualization::new("vis").with_expression("vis")))
        .unwrap();
    let states = ready_states(&["mock"]);

    let err = assemble(&registry, &states, Some("vis")).unwrap_err();
    let AssemblyError::MalformedExpression { origin, source } = err;
    assert_eq!(
        origin,
        ExpressionOrigin::Datasource {
            datasource_id: "mock".to_string(),
            layer_id: "first".to_string(),
        }
    );
    assert_eq!(source, ParseError::ExpectedFunction { offset: 0 });
}

#[test]
fn test_malformed_visualization_expression_is_an_error() {
    let mut registry = PluginRegistry::new();
    registry
        .register_datasource(Box::new(MockDatasource::new("mock").with_layer("first", "datasource")))
        .unwrap();
    registry
        .register_visualization(Box::new(MockVisualization::new("vis").with_expression("vis a=")))
        .unwrap();
    let states = ready_states(&["mock"]);

    let err = assemble(&registry, &states, Some("vis")).unwrap_err();
    assert!(err.to_string().contains("vis"));
}

#[test]
fn test_custom_merge_function() {
    let registry = two_layer_registry();
    let states = ready_states(&["mock", "mock2"]);
    let frame = FramePublicApi::new();
    let state = Value::Null;
    let inputs = AssemblyInputs::resolve(&registry, &states, Some("vis"), &state, &frame).unwrap();

    let assembly = ExpressionAssembler::new("merge_all").assemble(&inputs).unwrap();
    assert_eq!(assembly.expression().unwrap().chain[0].function, "merge_all");
}
