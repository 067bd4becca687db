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

use anyhow::{Context, Result};
use clap::Parser;
use lens::expression::Ast;
use lens::indexpattern::{IndexPattern, IndexPatternField, IndexPatternPrivateState, DATASOURCE_ID};
use lens::plugin::{DataType, DraggedField};
use lens::render_gate::{ExpressionRenderer, RenderOutcomeSender, RenderTicket};
use lens::{
    EditorFrame, EditorState, ErrorReporter, FrameConfig, PluginRegistry, RenderError,
    WorkspaceView,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lens-demo")]
#[command(about = "Drops fields onto an editor frame and prints the expressions it would render")]
#[command(version)]
struct Args {
    #[arg(long, help = "Frame configuration file (YAML)")]
    config: Option<PathBuf>,

    #[arg(
        long = "drop",
        value_name = "FIELD",
        default_values = ["bytes", "machine.os"],
        help = "Field to drop onto the workspace; repeat to drop several in turn"
    )]
    drops: Vec<String>,

    #[arg(long, help = "Make the renderer report a failure for every expression")]
    fail_render: bool,

    #[arg(long, help = "Enable debug logging")]
    debug: bool,
}

/// Prints expressions instead of drawing them.
struct ConsoleRenderer {
    fail: bool,
}

impl ExpressionRenderer for ConsoleRenderer {
    fn render(&mut self, expression: &Ast, ticket: RenderTicket, outcomes: &RenderOutcomeSender) {
        println!("  render #{} [{}]", ticket.generation, ticket.fingerprint.short());
        println!("    {expression}");
        if self.fail {
            outcomes.fail(ticket, RenderError::new("console", "rendering disabled by --fail-render"));
        } else {
            outcomes.complete(ticket);
        }
    }
}

fn sample_index_pattern() -> IndexPattern {
    let field = |name: &str, field_type: DataType, aggregatable: bool| IndexPatternField {
        name: name.to_string(),
        field_type,
        aggregatable,
        searchable: true,
    };
    IndexPattern {
        id: "kibana_sample_data_logs".to_string(),
        title: "kibana_sample_data_logs".to_string(),
        time_field_name: Some("timestamp".to_string()),
        fields: vec![
            field("timestamp", DataType::Date, true),
            field("bytes", DataType::Number, true),
            field("machine.os", DataType::String, true),
            field("clientip", DataType::Ip, true),
            field("message", DataType::String, false),
        ],
    }
}

fn describe(view: &WorkspaceView) -> String {
    match view {
        WorkspaceView::EmptyWorkspace => view.test_subject().to_string(),
        WorkspaceView::ExpressionFailure { message } => {
            format!("{}: {message}", view.test_subject())
        }
        WorkspaceView::Renderer { expression } => {
            format!("{} ({} steps)", view.test_subject(), expression.chain.len())
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = match &args.config {
        Some(path) => FrameConfig::from_yaml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => FrameConfig::default(),
    };

    let index_pattern = sample_index_pattern();
    let datasource_state = IndexPatternPrivateState::new(index_pattern.clone()).to_plugin_state()?;
    let mut frame = EditorFrame::new(
        PluginRegistry::with_builtins(),
        EditorState::new(DATASOURCE_ID, datasource_state),
        config,
    )?;
    let mut renderer = ConsoleRenderer {
        fail: args.fail_render,
    };
    let reporter = ErrorReporter::new();

    let chart_types: Vec<String> = frame
        .registry()
        .visualization_types()
        .into_iter()
        .map(|t| format!("{} ({})", t.label, t.id))
        .collect();
    println!("chart types: {}", chart_types.join(", "));
    println!("initial: {}", describe(&frame.render(&mut renderer)));

    for name in &args.drops {
        let Some(pattern_field) = index_pattern.field(name) else {
            warn!(field = %name, "Unknown field, skipping");
            continue;
        };
        let dragged = DraggedField {
            name: pattern_field.name.clone(),
            field_type: pattern_field.field_type,
            aggregatable: pattern_field.aggregatable,
            searchable: pattern_field.searchable,
        };

        println!("\ndrop {name}");
        for suggestion in frame.suggestions_for_drop(&dragged) {
            println!(
                "  {:>4.2}  {:<14} {}",
                suggestion.score, suggestion.visualization_id, suggestion.title
            );
        }
        match frame.handle_drop(&dragged) {
            Ok(Some(action)) => info!(action = action.name(), "Applied drop"),
            Ok(None) => println!("  no suggestion applied"),
            Err(e) => eprint!("{}", reporter.report(&e)),
        }

        frame.render(&mut renderer);
        frame.drain_render_outcomes();
        println!("  view: {}", describe(&frame.view()));
    }

    if let Some(title) = frame.state().visualization.active_id.as_deref() {
        let state = serde_json::to_string_pretty(&frame.state().visualization.state)?;
        println!("\nactive visualization {title}:\n{state}");
    }
    Ok(())
}
