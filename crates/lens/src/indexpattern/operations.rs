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

use crate::indexpattern::{IndexPatternColumn, IndexPatternField};
use crate::plugin::DataType;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Terms,
    DateHistogram,
}

impl OperationType {
    pub const ALL: [OperationType; 7] = [
        OperationType::Count,
        OperationType::Sum,
        OperationType::Avg,
        OperationType::Min,
        OperationType::Max,
        OperationType::Terms,
        OperationType::DateHistogram,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Count => "count",
            OperationType::Sum => "sum",
            OperationType::Avg => "avg",
            OperationType::Min => "min",
            OperationType::Max => "max",
            OperationType::Terms => "terms",
            OperationType::DateHistogram => "date_histogram",
        }
    }
}

pub struct BuildColumnArgs<'a> {
    pub index_pattern_id: &'a str,
    pub field: Option<&'a IndexPatternField>,
    pub suggested_priority: Option<u32>,
}

pub trait OperationDefinition: Sync {
    fn operation_type(&self) -> OperationType;
    fn is_applicable_without_field(&self) -> bool;
    fn is_applicable_for_field(&self, field: &IndexPatternField) -> bool;
    fn build_column(&self, args: BuildColumnArgs<'_>) -> IndexPatternColumn;
    /// One entry of the `esaggs` aggregation config list.
    fn to_esaggs_config(&self, column: &IndexPatternColumn, column_id: &str) -> Value;
}

pub fn definition(operation_type: OperationType) -> &'static dyn OperationDefinition {
    match operation_type {
        OperationType::Count => &COUNT,
        OperationType::Sum => &SUM,
        OperationType::Avg => &AVG,
        OperationType::Min => &MIN,
        OperationType::Max => &MAX,
        OperationType::Terms => &TERMS,
        OperationType::DateHistogram => &DATE_HISTOGRAM,
    }
}

/// Operations that can be built on `field`.
pub fn applicable_operations(field: &IndexPatternField) -> Vec<OperationType> {
    OperationType::ALL
        .into_iter()
        .filter(|op| definition(*op).is_applicable_for_field(field))
        .collect()
}

static COUNT: CountOperation = CountOperation;
static SUM: MetricOperation = MetricOperation {
    operation_type: OperationType::Sum,
    label: "Sum",
};
static AVG: MetricOperation = MetricOperation {
    operation_type: OperationType::Avg,
    label: "Average",
};
static MIN: MetricOperation = MetricOperation {
    operation_type: OperationType::Min,
    label: "Minimum",
};
static MAX: MetricOperation = MetricOperation {
    operation_type: OperationType::Max,
    label: "Maximum",
};
static TERMS: TermsOperation = TermsOperation;
static DATE_HISTOGRAM: DateHistogramOperation = DateHistogramOperation;

pub const DEFAULT_TERMS_SIZE: u64 = 5;
pub const DEFAULT_DATE_INTERVAL: &str = "auto";

pub struct CountOperation;

impl OperationDefinition for CountOperation {
    fn operation_type(&self) -> OperationType {
        OperationType::Count
    }
    fn is_applicable_without_field(&self) -> bool {
        true
    }
    fn is_applicable_for_field(&self, _field: &IndexPatternField) -> bool {
        false
    }
    fn build_column(&self, args: BuildColumnArgs<'_>) -> IndexPatternColumn {
        IndexPatternColumn {
            label: "Count of documents".to_string(),
            data_type: DataType::Number,
            operation_type: OperationType::Count,
            is_bucketed: false,
            source_field: None,
            suggested_priority: args.suggested_priority,
            index_pattern_id: args.index_pattern_id.to_string(),
            params: None,
        }
    }
    fn to_esaggs_config(&self, _column: &IndexPatternColumn, column_id: &str) -> Value {
        json!({
            "id": column_id,
            "enabled": true,
            "type": "count",
            "schema": "metric",
            "params": {},
        })
    }
}

/// Single-value numeric aggregations over one field.
pub struct MetricOperation {
    operation_type: OperationType,
    label: &'static str,
}

impl OperationDefinition for MetricOperation {
    fn operation_type(&self) -> OperationType {
        self.operation_type
    }
    fn is_applicable_without_field(&self) -> bool {
        false
    }
    fn is_applicable_for_field(&self, field: &IndexPatternField) -> bool {
        field.aggregatable && field.field_type == DataType::Number
    }
    fn build_column(&self, args: BuildColumnArgs<'_>) -> IndexPatternColumn {
        let field_name = args.field.map(|f| f.name.as_str()).unwrap_or_default();
        IndexPatternColumn {
            label: format!("{} of {}", self.label, field_name),
            data_type: DataType::Number,
            operation_type: self.operation_type,
            is_bucketed: false,
            source_field: Some(field_name.to_string()),
            suggested_priority: args.suggested_priority,
            index_pattern_id: args.index_pattern_id.to_string(),
            params: None,
        }
    }
    fn to_esaggs_config(&self, column: &IndexPatternColumn, column_id: &str) -> Value {
        json!({
            "id": column_id,
            "enabled": true,
            "type": self.operation_type.as_str(),
            "schema": "metric",
            "params": { "field": column.source_field },
        })
    }
}

pub struct TermsOperation;

impl OperationDefinition for TermsOperation {
    fn operation_type(&self) -> OperationType {
        OperationType::Terms
    }
    fn is_applicable_without_field(&self) -> bool {
        false
    }
    fn is_applicable_for_field(&self, field: &IndexPatternField) -> bool {
        field.aggregatable
            && matches!(
                field.field_type,
                DataType::String | DataType::Boolean | DataType::Ip
            )
    }
    fn build_column(&self, args: BuildColumnArgs<'_>) -> IndexPatternColumn {
        let field = args.field;
        let field_name = field.map(|f| f.name.as_str()).unwrap_or_default();
        IndexPatternColumn {
            label: format!("Top values of {field_name}"),
            data_type: field.map_or(DataType::String, |f| f.field_type),
            operation_type: OperationType::Terms,
            is_bucketed: true,
            source_field: Some(field_name.to_string()),
            suggested_priority: args.suggested_priority,
            index_pattern_id: args.index_pattern_id.to_string(),
            params: Some(json!({ "size": DEFAULT_TERMS_SIZE, "orderBy": { "type": "alphabetical" } })),
        }
    }
    fn to_esaggs_config(&self, column: &IndexPatternColumn, column_id: &str) -> Value {
        let size = column
            .params
            .as_ref()
            .and_then(|p| p.get("size"))
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_TERMS_SIZE);
        json!({
            "id": column_id,
            "enabled": true,
            "type": "terms",
            "schema": "segment",
            "params": {
                "field": column.source_field,
                "orderBy": "_key",
                "order": "asc",
                "size": size,
                "otherBucket": false,
                "missingBucket": false,
            },
        })
    }
}

pub struct DateHistogramOperation;

impl OperationDefinition for DateHistogramOperation {
    fn operation_type(&self) -> OperationType {
        OperationType::DateHistogram
    }
    fn is_applicable_without_field(&self) -> bool {
        false
    }
    fn is_applicable_for_field(&self, field: &IndexPatternField) -> bool {
        field.aggregatable && field.field_type == DataType::Date
    }
    fn build_column(&self, args: BuildColumnArgs<'_>) -> IndexPatternColumn {
        let field_name = args.field.map(|f| f.name.as_str()).unwrap_or_default();
        IndexPatternColumn {
            label: field_name.to_string(),
            data_type: DataType::Date,
            operation_type: OperationType::DateHistogram,
            is_bucketed: true,
            source_field: Some(field_name.to_string()),
            suggested_priority: args.suggested_priority,
            index_pattern_id: args.index_pattern_id.to_string(),
            params: Some(json!({ "interval": DEFAULT_DATE_INTERVAL })),
        }
    }
    fn to_esaggs_config(&self, column: &IndexPatternColumn, column_id: &str) -> Value {
        let interval = column
            .params
            .as_ref()
            .and_then(|p| p.get("interval"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_DATE_INTERVAL);
        json!({
            "id": column_id,
            "enabled": true,
            "type": "date_histogram",
            "schema": "segment",
            "params": {
                "field": column.source_field,
                "useNormalizedEsInterval": true,
                "interval": interval,
                "drop_partials": false,
                "min_doc_count": 1,
                "extended_bounds": {},
            },
        })
    }
}
