//! Template Registry
//!
//! Maps template names to [`Template`] definitions. A registry is populated at
//! startup (embedded built-ins, then any user YAML files) and only read while
//! requests are being served. The process-wide instance lives behind a
//! `RwLock` so concurrent readers never block each other.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{LazyLock, PoisonError, RwLock};

use eyre::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::embedded;
use crate::error::TemplateError;
use crate::template::Template;

/// A template file holds either one definition or a list of them
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TemplateFile {
    Many(Vec<Template>),
    One(Box<Template>),
}

/// A validated template with its model patterns compiled
#[derive(Debug, Clone)]
struct Entry {
    template: Template,
    patterns: Vec<Regex>,
}

impl Entry {
    fn prepare(name: &str, mut template: Template) -> Result<Self, TemplateError> {
        template.name = name.to_string();
        template.validate_layout()?;
        let patterns = template.compile_patterns()?;
        Ok(Self { template, patterns })
    }
}

/// Name → template mapping
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Entry>,
}

impl TemplateRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every embedded template
    pub fn with_builtins() -> Result<Self, TemplateError> {
        debug!("TemplateRegistry::with_builtins: called");
        let mut registry = Self::new();
        for name in embedded::EMBEDDED_NAMES {
            let template = embedded::load_embedded(name)?;
            registry.register(name, template)?;
        }
        Ok(registry)
    }

    /// Register a template under `name`
    ///
    /// The template is validated first. An existing entry with the same name is
    /// replaced.
    pub fn register(&mut self, name: &str, template: Template) -> Result<(), TemplateError> {
        debug!(%name, "TemplateRegistry::register: called");
        let entry = Entry::prepare(name, template)?;
        self.insert(name.to_string(), entry);
        Ok(())
    }

    fn insert(&mut self, name: String, entry: Entry) {
        if let Some(_previous) = self.templates.insert(name.clone(), entry) {
            warn!(%name, "Overwriting previously registered chat template");
        }
    }

    /// Look up a template by name, returning an owned copy
    pub fn resolve(&self, name: &str) -> Result<Template, TemplateError> {
        debug!(%name, "TemplateRegistry::resolve: called");
        self.templates
            .get(name)
            .map(|entry| entry.template.clone())
            .ok_or_else(|| TemplateError::UnknownTemplate { name: name.to_string() })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.templates.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Pick a template for a model id using each template's model patterns
    ///
    /// Templates are tried in name order; the first match wins.
    pub fn match_model(&self, model: &str) -> Option<String> {
        debug!(%model, "TemplateRegistry::match_model: called");
        let matched = self.names().into_iter().find(|name| {
            self.templates
                .get(name)
                .is_some_and(|entry| entry.patterns.iter().any(|re| re.is_match(model)))
        });
        debug!(?matched, "TemplateRegistry::match_model: result");
        matched
    }

    /// Register every template defined in a YAML file
    ///
    /// Every template is validated before any is registered, so a file with
    /// one bad entry leaves the registry untouched. Returns the names
    /// registered, in file order.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).context(format!("Failed to read template file {}", path.display()))?;
        let parsed: TemplateFile =
            serde_yaml::from_str(&content).context(format!("Failed to parse template file {}", path.display()))?;
        let templates = match parsed {
            TemplateFile::Many(templates) => templates,
            TemplateFile::One(template) => vec![*template],
        };

        let entries = templates
            .into_iter()
            .map(|template| {
                let name = template.name.clone();
                Entry::prepare(&name, template).map(|entry| (name, entry))
            })
            .collect::<Result<Vec<_>, TemplateError>>()
            .context(format!("Invalid template in {}", path.display()))?;

        let names: Vec<String> = entries.iter().map(|(name, _)| name.clone()).collect();
        for (name, entry) in entries {
            self.insert(name, entry);
        }
        info!("Loaded {} template(s) from {}", names.len(), path.display());
        Ok(names)
    }
}

static REGISTRY: LazyLock<Result<RwLock<TemplateRegistry>, TemplateError>> = LazyLock::new(|| {
    TemplateRegistry::with_builtins()
        .map(RwLock::new)
        .inspect_err(|e| error!(error = %e, "Embedded chat templates failed to load"))
});

/// The process-wide registry, or the error that stopped the built-ins from loading
fn global() -> Result<&'static RwLock<TemplateRegistry>, TemplateError> {
    loaded(&REGISTRY)
}

fn loaded(registry: &Result<RwLock<TemplateRegistry>, TemplateError>) -> Result<&RwLock<TemplateRegistry>, TemplateError> {
    registry.as_ref().map_err(|e| e.clone())
}

/// Check the embedded templates loaded into the process-wide registry
pub fn builtins_loaded() -> Result<(), TemplateError> {
    global().map(|_| ())
}

/// Register a template in the process-wide registry
pub fn register_template(name: &str, template: Template) -> Result<(), TemplateError> {
    global()?
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(name, template)
}

/// Resolve a template from the process-wide registry
pub fn resolve_template(name: &str) -> Result<Template, TemplateError> {
    global()?.read().unwrap_or_else(PoisonError::into_inner).resolve(name)
}

/// Whether the process-wide registry knows `name`
pub fn template_exists(name: &str) -> bool {
    global().is_ok_and(|registry| registry.read().unwrap_or_else(PoisonError::into_inner).contains(name))
}

/// Sorted names in the process-wide registry
pub fn template_names() -> Vec<String> {
    global()
        .map(|registry| registry.read().unwrap_or_else(PoisonError::into_inner).names())
        .unwrap_or_default()
}

/// Pick a template for a model id from the process-wide registry
pub fn match_template(model: &str) -> Option<String> {
    global()
        .ok()
        .and_then(|registry| registry.read().unwrap_or_else(PoisonError::into_inner).match_model(model))
}

/// Register every template in a YAML file into the process-wide registry
pub fn load_template_file(path: impl AsRef<Path>) -> Result<Vec<String>> {
    global()?
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .load_file(path)
}
