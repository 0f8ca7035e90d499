//! Resolving placeholders to values and substituting them into documents.

use super::detection::{find_all_variables, VariableInfo, VariableKind, VariableMap, ANY_VARIABLE};
use super::prompt::Prompter;
use crate::error::Result;
use crate::store::{infer_value, Document, Table, Value};
use crate::workspace::{DocumentKind, Workspace};
use std::collections::HashMap;

/// Resolved values keyed by their `variables` document key
pub type Substitutions = HashMap<String, String>;

/// Ask for every placeholder in the preset.
///
/// Soft variables are always asked for and never stored. A hard variable with
/// a stored value is reused without asking unless `persist` is set; otherwise
/// the user is asked, an empty answer keeps the stored value and a new answer
/// is written to the `variables` document straight away.
pub fn prompt_for_variables(
    workspace: &Workspace,
    preset: &str,
    persist: bool,
    prompter: &mut dyn Prompter,
) -> Result<Substitutions> {
    let found = find_all_variables(workspace, preset)?;
    resolve(workspace, preset, &found, |_| persist, prompter)
}

/// Like [`prompt_for_variables`], but the variables selected by `names`
/// (key or bare name; empty selects all) are always asked for, with their
/// stored value offered as default. The rest resolve as usual.
pub fn prompt_for_specific(
    workspace: &Workspace,
    preset: &str,
    names: &[String],
    prompter: &mut dyn Prompter,
) -> Result<Substitutions> {
    let found = find_all_variables(workspace, preset)?;
    let selected =
        |info: &VariableInfo| names.is_empty() || names.iter().any(|name| info.matches(name));
    resolve(workspace, preset, &found, selected, prompter)
}

fn resolve(
    workspace: &Workspace,
    preset: &str,
    found: &[VariableInfo],
    force: impl Fn(&VariableInfo) -> bool,
    prompter: &mut dyn Prompter,
) -> Result<Substitutions> {
    let mut stored = workspace.load_document(preset, DocumentKind::Variables)?;
    let mut substitutions = Substitutions::new();

    for info in found {
        let label = format!("{}{}", info.kind.sigil(), info.label());

        match info.kind {
            VariableKind::Soft => {
                let answer = prompter.prompt(&label, None)?;
                if !answer.is_empty() {
                    substitutions.insert(info.key.clone(), answer);
                }
            }
            VariableKind::Hard => {
                let current = stored.get_as_string(&info.key);
                if !current.is_empty() && !force(info) {
                    tracing::debug!("reusing stored value for {}", info.key);
                    substitutions.insert(info.key.clone(), current);
                    continue;
                }

                let answer = prompter.prompt(&label, Some(&current))?;
                if answer.is_empty() {
                    if !current.is_empty() {
                        substitutions.insert(info.key.clone(), current);
                    }
                    continue;
                }

                stored.set(&info.key, answer.as_str());
                stored.write()?;
                tracing::info!("stored value for {}", info.key);
                substitutions.insert(info.key.clone(), answer);
            }
        }
    }

    Ok(substitutions)
}

/// Replace placeholders in every string of `document` (a document of `kind`).
/// A string that changed is re-typed with [`infer_value`]; array items stay
/// strings. Placeholders without a resolved value are left as they are.
/// Returns the number of values changed.
pub fn substitute_variables(
    document: &mut Document,
    kind: DocumentKind,
    substitutions: &Substitutions,
) -> usize {
    let map = VariableMap::of(document, kind);
    substitute_table(document.table_mut(), "", &map, substitutions)
}

fn substitute_table(table: &mut Table, prefix: &str, map: &VariableMap, subs: &Substitutions) -> usize {
    let mut changed = 0;
    for (key, value) in table.iter_mut() {
        let path = if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::String(text) => {
                if let Some(replaced) = substitute_text(text, &path, map, subs) {
                    *value = infer_value(&replaced);
                    changed += 1;
                }
            }
            Value::Array(items) => {
                for item in items.iter_mut() {
                    if let Value::String(text) = item {
                        if let Some(replaced) = substitute_text(text, &path, map, subs) {
                            *text = replaced;
                            changed += 1;
                        }
                    }
                }
            }
            Value::Table(child) => changed += substitute_table(child, &path, map, subs),
            _ => {}
        }
    }
    changed
}

/// Substituted text, or `None` when nothing was replaced
fn substitute_text(text: &str, field: &str, map: &VariableMap, subs: &Substitutions) -> Option<String> {
    let replaced = ANY_VARIABLE.replace_all(text, |caps: &regex::Captures| {
        map.key_for(field, &caps[2])
            .and_then(|key| subs.get(key))
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    });
    (replaced != text).then(|| replaced.into_owned())
}

/// Register the hard placeholders of `document` (a document of `kind`) so
/// `call` knows to ask for them. Each key is added to the `variables`
/// document with an empty value when absent; soft placeholders are ignored.
/// Returns the number of keys added.
pub fn store_variable_info(
    workspace: &Workspace,
    preset: &str,
    kind: DocumentKind,
    document: &Document,
) -> Result<usize> {
    let hard: Vec<VariableInfo> = VariableMap::of(document, kind)
        .into_variables()
        .into_iter()
        .filter(|info| info.kind == VariableKind::Hard)
        .collect();
    if hard.is_empty() {
        return Ok(0);
    }

    let mut stored = workspace.load_document(preset, DocumentKind::Variables)?;
    let mut added = 0;
    for info in hard {
        if !stored.has(&info.key) {
            stored.set(&info.key, "");
            tracing::debug!("registered hard variable {}", info.key);
            added += 1;
        }
    }
    if added > 0 {
        stored.write()?;
    }
    Ok(added)
}
