//! Placeholder detection.
//!
//! A stored value *is* a variable only when the whole string is `{@name}`,
//! `{@}`, `{?name}` or `{?}`. Discovery walks the parsed documents and finds
//! every occurrence, embedded ones included.
//!
//! A named placeholder is keyed by the dotted path of the field it was found
//! in, prefixed with the document kind: `token = "{@tok}"` in `body.toml` is
//! stored as `body.token`. When one field holds several named placeholders
//! each gets its own key under the field (`request.url.host`). A name that
//! appears again later in the same document reuses the key of its first
//! occurrence. Bare placeholders all collapse to `<kind>.variable`.

use crate::error::Result;
use crate::store::{Document, Table, Value};
use crate::workspace::{DocumentKind, Workspace};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static HARD_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{@(\w*)\}$").expect("valid regex"));
static SOFT_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{\?(\w*)\}$").expect("valid regex"));
pub(crate) static ANY_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([@?])(\w*)\}").expect("valid regex"));

/// Key used for bare `{@}` / `{?}` placeholders
pub const BARE_VARIABLE_NAME: &str = "variable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// `{@name}`: resolved value is stored and reused
    Hard,
    /// `{?name}`: asked for on every call, never stored
    Soft,
}

impl VariableKind {
    pub fn sigil(&self) -> char {
        match self {
            VariableKind::Hard => '@',
            VariableKind::Soft => '?',
        }
    }

    fn from_sigil(sigil: &str) -> Self {
        if sigil == "@" {
            VariableKind::Hard
        } else {
            VariableKind::Soft
        }
    }
}

/// A placeholder found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableInfo {
    /// Key in the `variables` document: `<kind>.<field path>`, or
    /// `<kind>.variable` for the bare forms
    pub key: String,
    pub kind: VariableKind,
    /// Empty for the bare forms
    pub name: String,
}

impl VariableInfo {
    /// Name shown when prompting: the variable name, or its key when bare
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.key
        } else {
            &self.name
        }
    }

    /// Whether `wanted` selects this variable, by key or by name
    pub fn matches(&self, wanted: &str) -> bool {
        self.key == wanted || (!self.name.is_empty() && self.name == wanted)
    }
}

/// Classify a whole value. Returns the kind and the (possibly empty) name.
pub fn detect_variable(value: &str) -> Option<(VariableKind, String)> {
    if let Some(caps) = HARD_VARIABLE.captures(value) {
        return Some((VariableKind::Hard, caps[1].to_string()));
    }
    SOFT_VARIABLE
        .captures(value)
        .map(|caps| (VariableKind::Soft, caps[1].to_string()))
}

/// Storage key for a placeholder of `name` found at `field` of a `kind`
/// document
pub fn variable_key(kind: DocumentKind, field: &str, name: &str) -> String {
    if name.is_empty() {
        format!("{}.{}", kind.as_str(), BARE_VARIABLE_NAME)
    } else {
        format!("{}.{}", kind.as_str(), field)
    }
}

/// The placeholders of one document and the key each occurrence resolves to
#[derive(Debug, Default)]
pub struct VariableMap {
    found: Vec<VariableInfo>,
    keys: HashMap<(String, String), String>,
    first_key: HashMap<String, String>,
}

impl VariableMap {
    pub fn of(document: &Document, kind: DocumentKind) -> Self {
        let mut map = Self::default();
        map.walk(document.table(), "", kind);
        map
    }

    /// Distinct variables in order of first appearance
    pub fn variables(&self) -> &[VariableInfo] {
        &self.found
    }

    pub fn into_variables(self) -> Vec<VariableInfo> {
        self.found
    }

    /// Key of the placeholder `name` (empty when bare) inside `field`
    pub fn key_for(&self, field: &str, name: &str) -> Option<&str> {
        self.keys
            .get(&(field.to_string(), name.to_string()))
            .map(String::as_str)
    }

    fn walk(&mut self, table: &Table, prefix: &str, kind: DocumentKind) {
        for (key, value) in table.iter() {
            let path = if prefix.is_empty() {
                key.to_string()
            } else {
                format!("{prefix}.{key}")
            };
            match value {
                Value::Table(child) => self.walk(child, &path, kind),
                Value::String(text) => self.field(&path, [text.as_str()], kind),
                Value::Array(items) => {
                    self.field(&path, items.iter().filter_map(Value::as_str), kind)
                }
                _ => {}
            }
        }
    }

    fn field<'a>(&mut self, path: &str, texts: impl IntoIterator<Item = &'a str>, kind: DocumentKind) {
        let mut placeholders: Vec<(VariableKind, String)> = Vec::new();
        for text in texts {
            for caps in ANY_VARIABLE.captures_iter(text) {
                let name = &caps[2];
                if !placeholders.iter().any(|(_, seen)| seen == name) {
                    placeholders.push((VariableKind::from_sigil(&caps[1]), name.to_string()));
                }
            }
        }

        let named = placeholders.iter().filter(|(_, name)| !name.is_empty()).count();
        for (var_kind, name) in placeholders {
            let key = if name.is_empty() {
                variable_key(kind, path, &name)
            } else if let Some(key) = self.first_key.get(&name) {
                key.clone()
            } else {
                let field = if named > 1 {
                    format!("{path}.{name}")
                } else {
                    path.to_string()
                };
                let key = variable_key(kind, &field, &name);
                self.first_key.insert(name.clone(), key.clone());
                key
            };

            self.keys.insert((path.to_string(), name.clone()), key.clone());
            if !self.found.iter().any(|info| info.key == key) {
                self.found.push(VariableInfo {
                    key,
                    kind: var_kind,
                    name,
                });
            }
        }
    }
}

/// Every distinct placeholder of `document`, in order of first appearance
pub fn find_variables_in_document(document: &Document, kind: DocumentKind) -> Vec<VariableInfo> {
    VariableMap::of(document, kind).into_variables()
}

/// Placeholders across the request-bearing documents of the preset's current
/// document directory. Documents that do not exist are skipped.
pub fn find_all_variables(workspace: &Workspace, preset: &str) -> Result<Vec<VariableInfo>> {
    let mut all = Vec::new();
    for kind in DocumentKind::REQUEST_BEARING {
        let document = Document::load(&workspace.document_path(preset, kind))?;
        all.extend(find_variables_in_document(&document, kind));
    }
    tracing::debug!("found {} variable(s) in preset '{}'", all.len(), preset);
    Ok(all)
}
