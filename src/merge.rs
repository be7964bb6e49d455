//! Parameter Merger.
//!
//! Order: local parameters in declaration order, then each base group in
//! reference order (and its own declaration order). A name seen twice keeps
//! its first occurrence under `FirstWins`; `Reject` turns it into an error.
//! `required` comes only from the consuming event's required list.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::{trace, warn};

use crate::document::{EventUnit, ParamDoc, ParamMap};
use crate::error::{GenError, Result};
use crate::resolve::BaseGroup;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub description: Option<String>,
    pub required: bool,
    pub default: Option<ParamDefault>,
    pub source: ParamSource,
}

/// How an explicit default is spelled on the abstract declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamDefault {
    /// Written as-is: a constant name, `"EUR"`, `0`.
    Expression(String),
    /// `default: { literal: EUR }`, written as a quoted string.
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamSource {
    Local,
    Base { role: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Keep the first declaration, drop later ones silently.
    #[default]
    FirstWins,
    /// Treat a repeated name as an authoring error.
    Reject,
}

pub fn merge_parameters(unit: &EventUnit, bases: &[BaseGroup], policy: DuplicatePolicy) -> Result<Vec<ParamSpec>> {
    let local = (ParamSource::Local, "local parameters".to_string(), &unit.params);
    let sources = std::iter::once(local).chain(bases.iter().map(|base| {
        (ParamSource::Base { role: base.role.clone() }, base.source.clone(), &base.params)
    }));

    // name -> (spec, label of the source that declared it)
    let mut merged = IndexMap::<String, (ParamSpec, String)>::new();
    for (source, label, params) in sources {
        collect_source(unit, policy, &mut merged, source, &label, params)?;
    }

    for name in &unit.required {
        if !merged.contains_key(name) {
            warn!(
                path = %unit.origin.display(),
                method = %unit.method_name,
                param = %name,
                "required name matches no parameter"
            );
        }
    }

    Ok(merged.into_values().map(|(spec, _)| spec).collect())
}

fn collect_source(
    unit: &EventUnit,
    policy: DuplicatePolicy,
    merged: &mut IndexMap<String, (ParamSpec, String)>,
    source: ParamSource,
    label: &str,
    params: &ParamMap,
) -> Result<()> {
    for (name, doc) in params {
        if let Some((_, first)) = merged.get(name) {
            match policy {
                DuplicatePolicy::FirstWins => {
                    trace!(method = %unit.method_name, param = %name, kept = %first, dropped = %label, "duplicate parameter");
                    continue;
                }
                DuplicatePolicy::Reject => {
                    return Err(GenError::DuplicateParameter {
                        path: unit.origin.clone(),
                        key: unit.method_name.clone(),
                        param: name.clone(),
                        first: first.clone(),
                        second: label.to_string(),
                    });
                }
            }
        }
        let spec = to_spec(unit, name, doc, source.clone())?;
        merged.insert(name.clone(), (spec, label.to_string()));
    }
    Ok(())
}

fn to_spec(unit: &EventUnit, name: &str, doc: &ParamDoc, source: ParamSource) -> Result<ParamSpec> {
    let ty = match doc.ty.as_deref().map(str::trim) {
        Some(ty) if !ty.is_empty() => ty.to_string(),
        _ => {
            return Err(GenError::malformed(
                &unit.origin,
                &unit.method_name,
                format!("parameter `{name}` has no `type`"),
            ));
        }
    };
    let default = match &doc.default {
        None | Some(Value::Null) => None,
        Some(Value::Mapping(map)) => match map.get("literal").and_then(scalar_text) {
            Some(text) if map.len() == 1 => Some(ParamDefault::Literal(text)),
            _ => return Err(bad_default(unit, name)),
        },
        Some(value) => match scalar_text(value) {
            Some(text) if !text.trim().is_empty() => Some(ParamDefault::Expression(text)),
            _ => return Err(bad_default(unit, name)),
        },
    };
    Ok(ParamSpec {
        name: name.to_string(),
        ty,
        description: doc.description.clone(),
        required: unit.required.iter().any(|x| x == name),
        default,
        source,
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn bad_default(unit: &EventUnit, name: &str) -> GenError {
    GenError::malformed(
        &unit.origin,
        &unit.method_name,
        format!("default of parameter `{name}` must be a non-empty scalar or `{{ literal: <scalar> }}`"),
    )
}
