//! FAQ catalog: canonical questions, templates and interaction scripts
//!
//! The three stores are loaded together from one JSON document and
//! validated before anything else touches them. A default catalog ships
//! inside the binary; `FAQ_CATALOG_PATH` points at a replacement.

use crate::error::AgentError;
use crate::models::{CanonicalQuestion, InteractionStep, Template};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

const BUNDLED_CATALOG: &str = include_str!("../data/faq_catalog.json");

/// On-disk shape of a catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub questions: Vec<CanonicalQuestion>,
    pub templates: Vec<Template>,
    #[serde(default)]
    pub steps: Vec<InteractionStep>,
}

//
// ================= Question Catalog =================
//

#[derive(Debug, Clone, Default)]
pub struct QuestionCatalog {
    questions: Vec<CanonicalQuestion>,
}

impl QuestionCatalog {
    pub fn new(questions: Vec<CanonicalQuestion>) -> Self {
        Self { questions }
    }

    /// Alternate phrasings for a canonical question (empty if unknown)
    pub fn alternates(&self, canonical: &str) -> &[String] {
        self.questions
            .iter()
            .find(|q| q.text == canonical)
            .map(|q| q.alternates.as_slice())
            .unwrap_or(&[])
    }

    /// Canonical questions in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &CanonicalQuestion> {
        self.questions.iter()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

//
// ================= Template Store =================
//

#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    templates: Vec<Template>,
}

impl TemplateStore {
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    /// Exact, case-sensitive lookup by canonical question text
    pub fn find_by_faq(&self, faq: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.faq == faq)
    }

    pub fn get(&self, faq_key: u32) -> Option<&Template> {
        self.templates.iter().find(|t| t.faq_key == faq_key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

//
// ================= Script Store =================
//

#[derive(Debug, Clone, Default)]
pub struct ScriptStore {
    scripts: HashMap<u32, Vec<InteractionStep>>,
}

impl ScriptStore {
    /// Groups steps by `faq_key` and orders each group by `sequence`.
    /// The sort is stable, so duplicate sequences keep insertion order.
    pub fn new(steps: Vec<InteractionStep>) -> Self {
        let mut scripts: HashMap<u32, Vec<InteractionStep>> = HashMap::new();
        for step in steps {
            scripts.entry(step.faq_key).or_default().push(step);
        }
        for script in scripts.values_mut() {
            script.sort_by_key(|s| s.sequence);
        }
        Self { scripts }
    }

    /// Ordered script for a template; empty if it has none
    pub fn script(&self, faq_key: u32) -> &[InteractionStep] {
        self.scripts
            .get(&faq_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

//
// ================= Combined catalog =================
//

/// The three stores, validated against each other
#[derive(Debug, Clone, Default)]
pub struct FaqCatalog {
    pub questions: QuestionCatalog,
    pub templates: TemplateStore,
    pub scripts: ScriptStore,
}

impl FaqCatalog {
    /// Catalog compiled into the binary
    pub fn bundled() -> Result<Self> {
        Self::from_json_str(BUNDLED_CATALOG)
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            AgentError::CatalogError(format!(
                "Failed to read catalog {}: {}",
                path.display(),
                e
            ))
        })?;

        let catalog = Self::from_json_str(&raw)?;
        info!(
            path = %path.display(),
            questions = catalog.questions.len(),
            templates = catalog.templates.len(),
            "FAQ catalog loaded"
        );
        Ok(catalog)
    }

    /// Bundled catalog unless a path is given
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path).await,
            None => Self::bundled(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let document: CatalogDocument = serde_json::from_str(raw)?;
        Self::from_document(document)
    }

    pub fn from_document(document: CatalogDocument) -> Result<Self> {
        validate(&document)?;

        Ok(Self {
            questions: QuestionCatalog::new(document.questions),
            templates: TemplateStore::new(document.templates),
            scripts: ScriptStore::new(document.steps),
        })
    }
}

fn validate(document: &CatalogDocument) -> Result<()> {
    let mut canonical = HashSet::new();
    for question in &document.questions {
        if !canonical.insert(question.text.as_str()) {
            return Err(AgentError::CatalogError(format!(
                "Duplicate canonical question: {:?}",
                question.text
            )));
        }
    }

    let mut keys = HashSet::new();
    for template in &document.templates {
        if !keys.insert(template.faq_key) {
            return Err(AgentError::CatalogError(format!(
                "Duplicate faq_key {}",
                template.faq_key
            )));
        }
        if !canonical.contains(template.faq.as_str()) {
            return Err(AgentError::CatalogError(format!(
                "Template {} refers to unknown canonical question {:?}",
                template.faq_key, template.faq
            )));
        }
    }

    let mut sequences = HashSet::new();
    for step in &document.steps {
        if !keys.contains(&step.faq_key) {
            return Err(AgentError::CatalogError(format!(
                "Step {} refers to unknown faq_key {}",
                step.sequence, step.faq_key
            )));
        }
        if step.is_prompt && step.prompt_field().is_none() {
            return Err(AgentError::CatalogError(format!(
                "Prompt step {} of faq_key {} has no field_key",
                step.sequence, step.faq_key
            )));
        }
        if !sequences.insert((step.faq_key, step.sequence)) {
            warn!(
                faq_key = step.faq_key,
                sequence = step.sequence,
                "Duplicate step sequence, keeping insertion order"
            );
        }
    }

    Ok(())
}
