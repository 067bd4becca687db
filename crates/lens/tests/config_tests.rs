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

use lens::error::ConfigError;
use lens::{ErrorReporter, FrameConfig, LensError, SuggestionConfig};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_defaults() {
    let config = FrameConfig::default();
    assert_eq!(config.merge_function, "lens_merge_tables");
    assert_eq!(config.suggestions, SuggestionConfig::default());
    assert!(config.suggestions.auto_apply);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_yaml_keeps_defaults() {
    let config = FrameConfig::from_yaml_str("suggestions:\n  min_score: 0.25\n").unwrap();
    assert_eq!(config.merge_function, "lens_merge_tables");
    assert_eq!(config.suggestions.min_score, Some(0.25));
    assert_eq!(config.suggestions.max_suggestions, 10);
}

#[test]
fn test_min_score_is_optional() {
    assert_eq!(FrameConfig::default().suggestions.min_score, None);

    let config = FrameConfig::from_yaml_str("suggestions:\n  min_score: -0.5\n").unwrap();
    assert_eq!(config.suggestions.min_score, Some(-0.5));
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "merge_function: merge_layers\nsuggestions:\n  auto_apply: false\n  max_suggestions: 3"
    )
    .unwrap();

    let config = FrameConfig::from_yaml_file(file.path()).unwrap();
    assert_eq!(config.merge_function, "merge_layers");
    assert!(!config.suggestions.auto_apply);
    assert_eq!(config.suggestions.max_suggestions, 3);
}

#[test]
fn test_missing_file() {
    let err = FrameConfig::from_yaml_file("/nonexistent/frame.yml").unwrap_err();
    assert!(matches!(err, ConfigError::ConfigFileError { .. }));
}

#[test]
fn test_rejects_invalid_values() {
    let err = FrameConfig::from_yaml_str("merge_function: \"merge tables\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "merge_function"));

    let err = FrameConfig::from_yaml_str("suggestions:\n  min_score: .nan\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "suggestions.min_score"));

    let err = FrameConfig::from_yaml_str("suggestions:\n  max_suggestions: 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));

    let err = FrameConfig::from_yaml_str("suggestions: [1, 2]\n").unwrap_err();
    assert!(matches!(err, ConfigError::YamlParseError { .. }));
}

#[test]
fn test_yaml_round_trip() {
    let config = FrameConfig::for_review();
    let yaml = config.to_yaml().unwrap();
    assert_eq!(FrameConfig::from_yaml_str(&yaml).unwrap(), config);
}

#[test]
fn test_config_errors_are_not_recoverable() {
    let err: LensError = FrameConfig::from_yaml_str("suggestions:\n  max_suggestions: 0\n")
        .unwrap_err()
        .into();
    assert_eq!(err.category(), "Configuration");
    assert!(!err.is_recoverable());

    let report = ErrorReporter::plain().report(&err);
    assert!(report.starts_with("[CRITICAL] Configuration: "));
    assert!(report.contains("max_suggestions"));
}

#[test]
fn test_shipped_config_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/frame.yml");
    let config = FrameConfig::from_yaml_file(path).unwrap();
    assert_eq!(config.merge_function, "lens_merge_tables");
}
