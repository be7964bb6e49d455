//! Typed front-ends for the two accepted schema shapes.
//!
//! Both shapes are validated here and flattened into [`EventUnit`]s, so the
//! resolver, merger and builder never look at raw YAML again:
//!
//! - multi-event: a top-level `events` map (plus optional `components.parameters`)
//! - per-event: every top-level key is a method name carrying a `properties` block
//!
//! A document with a top-level `params` key is a base group and yields no units.
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

use crate::error::{GenError, Result};
use crate::loader::RawSchema;
use crate::path_de::from_value_with_path;

const COMPONENT_REF_PREFIX: &str = "#/components/parameters/";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// A parameter entry as written in a schema, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParamDoc {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub ty: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    /// Any scalar; stringified by the merger.
    #[serde(default)]
    pub default: Option<Value>,
}

pub type ParamMap = IndexMap<String, ParamDoc>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    MultiEvent,
    PerEvent,
}

/// One event as declared in one document, references still unresolved.
#[derive(Debug, Clone)]
pub struct EventUnit {
    pub origin: PathBuf,
    pub shape: Shape,
    pub method_name: String,
    pub description: Option<String>,
    pub event_name: Option<String>,
    pub supported_platforms: Option<Vec<String>>,
    /// Names listed as required by the event itself (not by its bases).
    pub required: Vec<String>,
    pub params: ParamMap,
    pub bases: Vec<BaseRef>,
}

#[derive(Debug, Clone)]
pub struct BaseRef {
    pub role: String,
    pub target: BaseTarget,
}

#[derive(Debug, Clone)]
pub enum BaseTarget {
    /// Relative to the referencing document's directory.
    File(PathBuf),
    /// Shared group from the same document's `components.parameters`.
    Component { name: String, params: ParamMap },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Events,
    BaseGroup,
    PerEvent,
}

#[derive(Debug, Deserialize)]
struct EventsDocument {
    #[serde(default)]
    components: Components,
    events: IndexMap<String, EventEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct Components {
    #[serde(default)]
    parameters: IndexMap<String, ParamMap>,
}

#[derive(Debug, Deserialize)]
struct EventEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    supported_platforms: Option<Vec<String>>,
    #[serde(default)]
    parameters: ParamMap,
    #[serde(default)]
    required: Vec<String>,
    #[serde(default)]
    bases: IndexMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct UnitEntry {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    required: Vec<String>,
    #[serde(default)]
    supported_platforms: Option<Vec<String>>,
    #[serde(default)]
    properties: Option<Mapping>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

/// `events` and `params` only pick their front-end when they hold a map of
/// entries. A per-event method with one of those names (and at least one
/// scalar or list field) stays per-event.
pub fn classify(tree: &Value) -> Option<DocumentKind> {
    let map = tree.as_mapping()?;
    if map.get("events").is_some_and(is_entry_table) {
        Some(DocumentKind::Events)
    } else if map.get("params").is_some_and(|v| v.is_null() || is_entry_table(v)) {
        Some(DocumentKind::BaseGroup)
    } else {
        if map.contains_key("events") || map.contains_key("params") {
            debug!("`events`/`params` key is not a map of entries; reading as per-event document");
        }
        Some(DocumentKind::PerEvent)
    }
}

fn is_entry_table(value: &Value) -> bool {
    value
        .as_mapping()
        .is_some_and(|map| map.values().all(|entry| entry.is_mapping() || entry.is_null()))
}

/// Turn one loaded document into its event units (none for a base group).
pub fn parse_units(raw: &RawSchema) -> Result<Vec<EventUnit>> {
    let kind = match classify(&raw.tree) {
        Some(kind) => kind,
        None => return Err(GenError::parse(&raw.path, "expected a mapping at the document root")),
    };
    match kind {
        DocumentKind::Events => parse_events_document(raw),
        DocumentKind::PerEvent => parse_per_event_document(raw),
        DocumentKind::BaseGroup => {
            debug!(path = %raw.path.display(), "skipping base group document");
            Ok(Vec::new())
        }
    }
}

/// The `params` map of a base group document. Its own references are ignored.
pub fn base_group_params(raw: &RawSchema) -> std::result::Result<ParamMap, String> {
    let params = raw
        .tree
        .as_mapping()
        .and_then(|map| map.get("params"))
        .ok_or_else(|| "file has no top-level `params` map".to_string())?;
    if params.is_null() {
        return Ok(ParamMap::new());
    }
    from_value_with_path::<ParamMap>(params.clone())
}

fn parse_events_document(raw: &RawSchema) -> Result<Vec<EventUnit>> {
    let doc = from_value_with_path::<EventsDocument>(raw.tree.clone())
        .map_err(|message| GenError::parse(&raw.path, message))?;

    let mut units = Vec::with_capacity(doc.events.len());
    for (method_name, entry) in doc.events {
        let mut bases = Vec::with_capacity(entry.bases.len());
        for (role, reference) in &entry.bases {
            let target = parse_reference(&raw.path, &method_name, role, reference, Some(&doc.components))?;
            bases.push(BaseRef { role: role.clone(), target });
        }
        let mut required = entry.required;
        for (name, param) in &entry.parameters {
            if param.required == Some(true) && !required.contains(name) {
                required.push(name.clone());
            }
        }
        units.push(EventUnit {
            origin: raw.path.clone(),
            shape: Shape::MultiEvent,
            method_name,
            description: entry.description,
            event_name: entry.name,
            supported_platforms: entry.supported_platforms,
            required,
            params: entry.parameters,
            bases,
        });
    }
    Ok(units)
}

fn parse_per_event_document(raw: &RawSchema) -> Result<Vec<EventUnit>> {
    let doc = from_value_with_path::<IndexMap<String, UnitEntry>>(raw.tree.clone())
        .map_err(|message| GenError::parse(&raw.path, message))?;

    let mut units = Vec::with_capacity(doc.len());
    for (method_name, entry) in doc {
        let mut unit = EventUnit {
            origin: raw.path.clone(),
            shape: Shape::PerEvent,
            method_name,
            description: entry.description,
            event_name: None,
            supported_platforms: entry.supported_platforms,
            required: entry.required,
            params: ParamMap::new(),
            bases: Vec::new(),
        };
        // a missing block is reported by the definition builder
        if let Some(properties) = entry.properties {
            read_properties(&raw.path, &mut unit, properties)?;
        }
        for (name, param) in &unit.params {
            if param.required == Some(true) && !unit.required.contains(name) {
                unit.required.push(name.clone());
            }
        }
        units.push(unit);
    }
    Ok(units)
}

/// `properties: { <eventName>: { params: {...}, <role>: <path>, ... } }`
fn read_properties(path: &Path, unit: &mut EventUnit, properties: Mapping) -> Result<()> {
    let key = unit.method_name.clone();
    let mut entries = properties.into_iter();
    let (event_key, block) = match entries.next() {
        Some(x) => x,
        None => return Err(GenError::malformed(path, &key, "`properties` block is empty")),
    };
    let event_name = match event_key {
        Value::String(s) => s,
        other => {
            return Err(GenError::malformed(path, &key, format!("event name must be a string, found {other:?}")));
        }
    };
    for (extra, _) in entries {
        warn!(path = %path.display(), key = %key, extra = ?extra, "ignoring extra key in `properties`");
    }

    let block = match block {
        Value::Null => Mapping::new(),
        Value::Mapping(map) => map,
        _ => {
            return Err(GenError::malformed(path, &key, format!("`properties.{event_name}` must be a mapping")));
        }
    };

    for (field, value) in block {
        let field = match field {
            Value::String(s) => s,
            other => {
                return Err(GenError::malformed(path, &key, format!("unexpected key {other:?} in `properties.{event_name}`")));
            }
        };
        if field == "params" {
            if !value.is_null() {
                unit.params = from_value_with_path::<ParamMap>(value).map_err(|message| {
                    GenError::parse(path, format!("in `{key}.properties.{event_name}.params` {message}"))
                })?;
            }
            continue;
        }
        let reference = match value {
            Value::String(s) => s,
            Value::Mapping(map) => match map.get("$ref").and_then(Value::as_str) {
                Some(s) => s.to_string(),
                None => {
                    return Err(base_error(path, &key, &field, "expected a relative path or `{ $ref: path }`"));
                }
            },
            _ => return Err(base_error(path, &key, &field, "expected a relative path or `{ $ref: path }`")),
        };
        let target = parse_reference(path, &key, &field, &reference, None)?;
        unit.bases.push(BaseRef { role: field, target });
    }
    unit.event_name = Some(event_name);
    Ok(())
}

fn parse_reference(
    path: &Path,
    key: &str,
    role: &str,
    reference: &str,
    components: Option<&Components>,
) -> Result<BaseTarget> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(base_error(path, key, role, "reference is empty"));
    }
    if let Some(name) = reference.strip_prefix(COMPONENT_REF_PREFIX) {
        let components = match components {
            Some(x) => x,
            None => {
                return Err(base_error(path, key, role, "component references need a multi-event document"));
            }
        };
        return match components.parameters.get(name) {
            Some(params) => Ok(BaseTarget::Component { name: name.to_string(), params: params.clone() }),
            None => Err(base_error(path, key, role, format!("no component parameter group named `{name}`"))),
        };
    }
    Ok(BaseTarget::File(PathBuf::from(reference)))
}

fn base_error(path: &Path, key: &str, role: &str, reason: impl Into<String>) -> GenError {
    GenError::BaseReference {
        path: path.to_path_buf(),
        key: key.to_string(),
        role: role.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(src: &str) -> RawSchema {
        RawSchema {
            path: PathBuf::from("schemas/events.yml"),
            tree: serde_yaml::from_str(src).unwrap(),
        }
    }

    #[test]
    fn classifies_the_three_shapes() {
        assert_eq!(classify(&raw("events: {}").tree), Some(DocumentKind::Events));
        assert_eq!(classify(&raw("params: {}").tree), Some(DocumentKind::BaseGroup));
        assert_eq!(classify(&raw("trackX: {}").tree), Some(DocumentKind::PerEvent));
        assert_eq!(classify(&raw("[1, 2]").tree), None);
    }

    #[test]
    fn per_event_methods_named_events_or_params_stay_per_event() {
        let src = "events:\n  supported_platforms: [ios]\n  properties:\n    app_events: {}\n";
        assert_eq!(classify(&raw(src).tree), Some(DocumentKind::PerEvent));
        let units = parse_units(&raw(src)).unwrap();
        assert_eq!(units[0].method_name, "events");
        assert_eq!(units[0].event_name.as_deref(), Some("app_events"));

        let src = "params:\n  description: Parameter screen.\n  supported_platforms: [web]\n";
        assert_eq!(classify(&raw(src).tree), Some(DocumentKind::PerEvent));
        assert_eq!(classify(&raw("params:\n").tree), Some(DocumentKind::BaseGroup));
    }

    #[test]
    fn multi_event_document_with_component_base() {
        let units = parse_units(&raw(
            r##"
components:
  parameters:
    order:
      orderId: { type: string }
events:
  trackOrderPlaced:
    name: order_placed
    description: An order went through.
    supported_platforms: [ios, android]
    bases:
      order: "#/components/parameters/order"
    parameters:
      promoCode: { type: string }
      channel: { type: string, required: true }
"##,
        ))
        .unwrap();
        assert_eq!(units.len(), 1);
        let unit = &units[0];
        assert_eq!(unit.shape, Shape::MultiEvent);
        assert_eq!(unit.method_name, "trackOrderPlaced");
        assert_eq!(unit.event_name.as_deref(), Some("order_placed"));
        assert_eq!(unit.required, ["channel"]);
        assert_eq!(unit.params.keys().collect::<Vec<_>>(), ["promoCode", "channel"]);
        match &unit.bases[0].target {
            BaseTarget::Component { name, params } => {
                assert_eq!(name, "order");
                assert!(params.contains_key("orderId"));
            }
            other => panic!("unexpected target {other:?}"),
        }
    }

    #[test]
    fn unknown_component_is_a_base_reference_error() {
        let err = parse_units(&raw(
            r##"
events:
  trackX:
    name: x
    supported_platforms: [ios]
    bases: { general: "#/components/parameters/missing" }
"##,
        ))
        .unwrap_err();
        assert!(matches!(err, GenError::BaseReference { ref role, .. } if role == "general"), "{err}");
    }

    #[test]
    fn per_event_document_reads_event_name_params_and_roles() {
        let units = parse_units(&raw(
            r#"
trackCheckIn:
  description: Guest checked in.
  required: [bookingId]
  supported_platforms: [android]
  properties:
    check_in:
      params:
        bookingId: { type: string }
      general: ./general.yml
      check_in_base: { $ref: ./check_in.yml }
"#,
        ))
        .unwrap();
        let unit = &units[0];
        assert_eq!(unit.shape, Shape::PerEvent);
        assert_eq!(unit.event_name.as_deref(), Some("check_in"));
        let roles: Vec<_> = unit.bases.iter().map(|b| b.role.as_str()).collect();
        assert_eq!(roles, ["general", "check_in_base"]);
        assert!(matches!(&unit.bases[1].target, BaseTarget::File(p) if p == Path::new("./check_in.yml")));
    }

    #[test]
    fn per_event_without_properties_leaves_event_name_unset() {
        let units = parse_units(&raw("trackX:\n  supported_platforms: [ios]\n")).unwrap();
        assert!(units[0].event_name.is_none());
    }

    #[test]
    fn numeric_base_reference_is_rejected() {
        let err = parse_units(&raw(
            "trackX:\n  supported_platforms: [ios]\n  properties:\n    x:\n      general: 42\n",
        ))
        .unwrap_err();
        assert!(matches!(err, GenError::BaseReference { .. }), "{err}");
    }

    #[test]
    fn base_group_document_yields_nothing() {
        assert!(parse_units(&raw("params:\n  a: { type: string }\n")).unwrap().is_empty());
    }

    #[test]
    fn base_group_params_requires_params_key() {
        assert!(base_group_params(&raw("other: 1")).is_err());
        let params = base_group_params(&raw("params:\n  a: { type: string }\n  b: { type: string }\n")).unwrap();
        assert_eq!(params.keys().collect::<Vec<_>>(), ["a", "b"]);
    }
}
