//! The persisted document: parameter registry plus scene, stored as JSON.

use std::collections::HashSet;
use std::path::Path;

use multiedit_core::ParameterRegistry;
use multiedit_engine::{
    consolidate_report, selected_sources, BatchMutator, ConsolidationReport, EngineConfig,
    Pipeline, Record, SourceStore,
};
use serde::{Deserialize, Serialize};

use crate::error::DocumentError;
use crate::scene::Scene;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub parameters: ParameterRegistry,
    #[serde(flatten)]
    pub scene: Scene,
}

impl Document {
    pub fn new(parameters: ParameterRegistry) -> Self {
        Self {
            parameters,
            scene: Scene::new(),
        }
    }

    pub fn from_json(input: &str) -> Result<Self, DocumentError> {
        let doc: Document =
            serde_json::from_str(input).map_err(|e| DocumentError::Json(e.to_string()))?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(|e| DocumentError::Json(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| DocumentError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let doc = Self::from_json(&content)?;
        log::debug!(
            "loaded {}: {} parameters, {} transitions, {} behaviours",
            path.display(),
            doc.parameters.len(),
            doc.scene.transitions().len(),
            doc.scene.behaviours().len()
        );
        Ok(doc)
    }

    /// Write the document and mark the scene clean.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| DocumentError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        self.scene.mark_clean();
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DocumentError> {
        if let Some(id) = self.scene.duplicate_id() {
            return Err(DocumentError::DuplicateId(id));
        }
        let mut names = HashSet::new();
        if let Some(name) = self.parameters.names().find(|n| !names.insert(*n)) {
            return Err(DocumentError::DuplicateParameter(name.to_string()));
        }
        Ok(())
    }

    /// Consolidate the selected objects' `T` lists.
    pub fn consolidate<T>(&self, pipeline: &Pipeline<T>) -> ConsolidationReport<T>
    where
        T: Record,
        Scene: SourceStore<T>,
    {
        consolidate_report(&selected_sources::<T, _>(&self.scene), pipeline)
    }

    pub fn mutator(&mut self) -> BatchMutator<'_, Scene> {
        BatchMutator::new(&mut self.scene, &self.parameters)
    }

    pub fn mutator_with(&mut self, config: &EngineConfig) -> BatchMutator<'_, Scene> {
        self.mutator().with_label_prefix(config.edit.label_prefix.clone())
    }
}
