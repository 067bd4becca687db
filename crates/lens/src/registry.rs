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

use crate::error::RegistryError;
use crate::plugin::{Datasource, Visualization, VisualizationType};
use indexmap::IndexMap;
use tracing::debug;

/// Datasource and visualization plugins keyed by id, in registration order.
#[derive(Default)]
pub struct PluginRegistry {
    datasources: IndexMap<String, Box<dyn Datasource>>,
    visualizations: IndexMap<String, Box<dyn Visualization>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in index-pattern datasource and chart types.
    #[cfg(feature = "builtins")]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.datasources.insert(
            crate::indexpattern::DATASOURCE_ID.to_string(),
            Box::new(crate::indexpattern::IndexPatternDatasource::new()),
        );
        for visualization in crate::visualizations::builtin_visualizations() {
            registry
                .visualizations
                .insert(visualization.id().to_string(), visualization);
        }
        registry
    }

    pub fn register_datasource(
        &mut self,
        datasource: Box<dyn Datasource>,
    ) -> Result<(), RegistryError> {
        let id = datasource.id().to_string();
        if self.datasources.contains_key(&id) {
            return Err(RegistryError::DuplicateDatasource { id });
        }
        debug!(datasource_id = %id, "Registered datasource");
        self.datasources.insert(id, datasource);
        Ok(())
    }

    pub fn register_visualization(
        &mut self,
        visualization: Box<dyn Visualization>,
    ) -> Result<(), RegistryError> {
        let id = visualization.id().to_string();
        if self.visualizations.contains_key(&id) {
            return Err(RegistryError::DuplicateVisualization { id });
        }
        debug!(visualization_id = %id, "Registered visualization");
        self.visualizations.insert(id, visualization);
        Ok(())
    }

    pub fn datasource(&self, id: &str) -> Option<&dyn Datasource> {
        self.datasources.get(id).map(|d| &**d)
    }

    pub fn visualization(&self, id: &str) -> Option<&dyn Visualization> {
        self.visualizations.get(id).map(|v| &**v)
    }

    pub fn require_datasource(&self, id: &str) -> Result<&dyn Datasource, RegistryError> {
        self.datasource(id)
            .ok_or_else(|| RegistryError::UnknownDatasource { id: id.to_string() })
    }

    pub fn require_visualization(&self, id: &str) -> Result<&dyn Visualization, RegistryError> {
        self.visualization(id)
            .ok_or_else(|| RegistryError::UnknownVisualization { id: id.to_string() })
    }

    pub fn datasources(&self) -> impl Iterator<Item = (&str, &dyn Datasource)> {
        self.datasources.iter().map(|(id, d)| (id.as_str(), &**d))
    }

    pub fn visualizations(&self) -> impl Iterator<Item = (&str, &dyn Visualization)> {
        self.visualizations.iter().map(|(id, v)| (id.as_str(), &**v))
    }

    pub fn datasource_ids(&self) -> Vec<&str> {
        self.datasources.keys().map(String::as_str).collect()
    }

    pub fn visualization_ids(&self) -> Vec<&str> {
        self.visualizations.keys().map(String::as_str).collect()
    }

    /// Chart types offered by every registered visualization, in registration order.
    pub fn visualization_types(&self) -> Vec<VisualizationType> {
        self.visualizations
            .values()
            .flat_map(|v| v.visualization_types())
            .collect()
    }
}
