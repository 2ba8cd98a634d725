use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::operation::OperationConfig;

/// A named, stored operation list with `${key}` placeholders in its
/// parameter values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub operations: Vec<OperationConfig>,
}

/// Resolves template names from in-memory registrations and an
/// optional directory of `<name>.json` files. Registered templates win
/// over files of the same name.
#[derive(Default)]
pub struct TemplateStore {
    directory: Option<PathBuf>,
    templates: HashMap<String, Template>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_directory<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: Some(directory.as_ref().to_path_buf()),
            templates: HashMap::new(),
        }
    }

    pub fn register(&mut self, template: Template) {
        self.templates.insert(template.name.clone(), template);
    }

    pub fn get(&self, name: &str) -> Result<Template, ValidationError> {
        if let Some(template) = self.templates.get(name) {
            return Ok(template.clone());
        }

        if let Some(directory) = &self.directory {
            let path = directory.join(format!("{}.json", name));
            if path.exists() {
                return load_template_file(name, &path);
            }
        }

        Err(ValidationError::TemplateNotFound {
            name: name.to_string(),
        })
    }

    /// Resolves a template by name and expands it with `params` in one
    /// step.
    pub fn expand(
        &self,
        name: &str,
        params: &Map<String, Value>,
    ) -> Result<Vec<OperationConfig>, ValidationError> {
        let template = self.get(name)?;
        expand_template(&template, params)
    }
}

fn load_template_file(name: &str, path: &Path) -> Result<Template, ValidationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ValidationError::ReadTemplate {
        path: path.to_path_buf(),
        source: e,
    })?;
    let template = serde_json::from_str(&content).map_err(|e| ValidationError::ParseTemplate {
        name: name.to_string(),
        source: e,
    })?;
    debug!("Loaded template '{}' from {}", name, path.display());
    Ok(template)
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("placeholder pattern compiles"))
}

/// Substitutes `${key}` placeholders in every operation's parameter
/// values with the caller-supplied value for `key`.
///
/// A string that is exactly one placeholder takes the parameter's JSON
/// value with its type intact — `"${quality}"` with `quality: 80`
/// becomes the number `80`. Placeholders embedded in longer strings
/// interpolate the value's string form. An unresolved placeholder is a
/// hard error: passing a literal `${key}` into an operation is never
/// what the caller meant.
pub fn expand_template(
    template: &Template,
    params: &Map<String, Value>,
) -> Result<Vec<OperationConfig>, ValidationError> {
    let mut expanded = Vec::with_capacity(template.operations.len());

    for (index, operation) in template.operations.iter().enumerate() {
        let mut parameters = Map::new();
        for (name, value) in &operation.parameters {
            parameters.insert(name.clone(), expand_value(value, params, index)?);
        }
        expanded.push(OperationConfig {
            kind: operation.kind.clone(),
            parameters,
        });
    }

    Ok(expanded)
}

fn expand_value(
    value: &Value,
    params: &Map<String, Value>,
    index: usize,
) -> Result<Value, ValidationError> {
    match value {
        Value::String(text) => expand_string(text, params, index),
        Value::Array(items) => {
            let expanded: Result<Vec<Value>, ValidationError> = items
                .iter()
                .map(|item| expand_value(item, params, index))
                .collect();
            Ok(Value::Array(expanded?))
        }
        Value::Object(map) => {
            let mut expanded = Map::new();
            for (name, nested) in map {
                expanded.insert(name.clone(), expand_value(nested, params, index)?);
            }
            Ok(Value::Object(expanded))
        }
        other => Ok(other.clone()),
    }
}

fn expand_string(
    text: &str,
    params: &Map<String, Value>,
    index: usize,
) -> Result<Value, ValidationError> {
    // Whole-value placeholder: keep the parameter's JSON type.
    if let Some(key) = text.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
        if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return params.get(key).cloned().ok_or_else(|| {
                ValidationError::UnresolvedPlaceholder {
                    key: key.to_string(),
                    index,
                }
            });
        }
    }

    let re = placeholder_regex();
    if !re.is_match(text) {
        return Ok(Value::String(text.to_string()));
    }

    // Interpolation: every referenced key must resolve before any
    // replacement happens.
    for caps in re.captures_iter(text) {
        let key = &caps[1];
        if !params.contains_key(key) {
            return Err(ValidationError::UnresolvedPlaceholder {
                key: key.to_string(),
                index,
            });
        }
    }

    let interpolated = re.replace_all(text, |caps: &regex::Captures| {
        match params.get(&caps[1]) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    });

    Ok(Value::String(interpolated.into_owned()))
}
