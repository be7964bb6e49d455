//! Definition Builder: one canonical, fully merged [`EventDefinition`] per unit.
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::document::{EventUnit, Shape};
use crate::error::{GenError, Result};
use crate::merge::{merge_parameters, DuplicatePolicy, ParamSpec};
use crate::resolve::{resolve_bases, BaseGroup};

/// Immutable once built; lives for one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDefinition {
    pub method_name: String,
    pub description: String,
    pub event_name: String,
    pub parameters: Vec<ParamSpec>,
    /// Non-empty, first-seen order, no repeats.
    pub supported_platforms: Vec<String>,
    pub origin: PathBuf,
}

impl EventDefinition {
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|x| x.name.as_str())
    }
}

pub fn build_definition(unit: &EventUnit, bases: &[BaseGroup], policy: DuplicatePolicy) -> Result<EventDefinition> {
    let malformed = |reason: &str| GenError::malformed(&unit.origin, &unit.method_name, reason);

    let event_name = match (&unit.event_name, unit.shape) {
        (Some(name), _) if !name.trim().is_empty() => name.clone(),
        (Some(_), _) => return Err(malformed("event name is empty")),
        (None, Shape::PerEvent) => return Err(malformed("missing `properties` block")),
        (None, Shape::MultiEvent) => return Err(malformed("missing event `name`")),
    };

    let platforms = match &unit.supported_platforms {
        Some(x) => x,
        None => return Err(malformed("missing `supported_platforms`")),
    };
    let mut supported_platforms = Vec::<String>::with_capacity(platforms.len());
    for platform in platforms {
        let platform = platform.trim();
        if platform.is_empty() {
            return Err(malformed("`supported_platforms` contains an empty entry"));
        }
        if !supported_platforms.iter().any(|x| x == platform) {
            supported_platforms.push(platform.to_string());
        }
    }
    if supported_platforms.is_empty() {
        return Err(malformed("`supported_platforms` is empty"));
    }

    let parameters = merge_parameters(unit, bases, policy)?;

    debug!(
        method = %unit.method_name,
        event = %event_name,
        params = parameters.len(),
        bases = bases.len(),
        "built event definition"
    );

    Ok(EventDefinition {
        method_name: unit.method_name.clone(),
        description: unit.description.clone().unwrap_or_default(),
        event_name,
        parameters,
        supported_platforms,
        origin: unit.origin.clone(),
    })
}

/// Resolve and build every unit (in parallel, order kept), then reject
/// method names that occur twice.
pub fn build_definitions(units: &[EventUnit], policy: DuplicatePolicy) -> Result<Vec<EventDefinition>> {
    let definitions = units
        .par_iter()
        .map(|unit| {
            let bases = resolve_bases(unit)?;
            build_definition(unit, &bases, policy)
        })
        .collect::<Result<Vec<_>>>()?;
    check_unique_methods(&definitions)?;
    Ok(definitions)
}

pub fn check_unique_methods(definitions: &[EventDefinition]) -> Result<()> {
    let mut seen = HashMap::<&str, &Path>::with_capacity(definitions.len());
    for definition in definitions {
        if let Some(first) = seen.insert(&definition.method_name, &definition.origin) {
            return Err(GenError::DuplicateMethodName {
                method: definition.method_name.clone(),
                first: first.to_path_buf(),
                second: definition.origin.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ParamDoc, ParamMap};

    fn unit(method: &str, platforms: Option<&[&str]>) -> EventUnit {
        let mut params = ParamMap::new();
        params.insert("orderId".into(), ParamDoc { ty: Some("string".into()), ..ParamDoc::default() });
        EventUnit {
            origin: PathBuf::from(format!("{method}.yml")),
            shape: Shape::PerEvent,
            method_name: method.into(),
            description: None,
            event_name: Some("order_placed".into()),
            supported_platforms: platforms.map(|xs| xs.iter().map(|x| x.to_string()).collect()),
            required: vec!["orderId".into()],
            params,
            bases: Vec::new(),
        }
    }

    #[test]
    fn builds_with_defaults() {
        let def = build_definition(&unit("trackOrderPlaced", Some(&["ios", "android", "ios"])), &[], DuplicatePolicy::FirstWins)
            .unwrap();
        assert_eq!(def.description, "");
        assert_eq!(def.event_name, "order_placed");
        assert_eq!(def.supported_platforms, ["ios", "android"]);
        assert_eq!(def.param_names().collect::<Vec<_>>(), ["orderId"]);
        assert!(def.parameters[0].required);
    }

    #[test]
    fn missing_platforms_is_malformed() {
        let err = build_definition(&unit("trackX", None), &[], DuplicatePolicy::FirstWins).unwrap_err();
        assert!(matches!(err, GenError::MalformedDefinition { ref key, .. } if key == "trackX"));
        assert!(err.to_string().contains("supported_platforms"));
    }

    #[test]
    fn empty_platforms_is_malformed() {
        let err = build_definition(&unit("trackX", Some(&[])), &[], DuplicatePolicy::FirstWins).unwrap_err();
        assert!(matches!(err, GenError::MalformedDefinition { .. }));
    }

    #[test]
    fn missing_properties_is_malformed() {
        let mut u = unit("trackX", Some(&["ios"]));
        u.event_name = None;
        let err = build_definition(&u, &[], DuplicatePolicy::FirstWins).unwrap_err();
        assert!(err.to_string().contains("properties"), "{err}");

        u.shape = Shape::MultiEvent;
        let err = build_definition(&u, &[], DuplicatePolicy::FirstWins).unwrap_err();
        assert!(err.to_string().contains("`name`"), "{err}");
    }

    #[test]
    fn duplicate_method_names_are_rejected() {
        let mut second = unit("trackOrderPlaced", Some(&["ios"]));
        second.origin = PathBuf::from("other.yml");
        let units = [unit("trackOrderPlaced", Some(&["ios"])), second];
        let err = build_definitions(&units, DuplicatePolicy::FirstWins).unwrap_err();
        match err {
            GenError::DuplicateMethodName { method, first, second } => {
                assert_eq!(method, "trackOrderPlaced");
                assert_eq!(first, PathBuf::from("trackOrderPlaced.yml"));
                assert_eq!(second, PathBuf::from("other.yml"));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn keeps_unit_order() {
        let units = [unit("trackB", Some(&["ios"])), unit("trackA", Some(&["ios"])), unit("trackC", Some(&["ios"]))];
        let defs = build_definitions(&units, DuplicatePolicy::FirstWins).unwrap();
        let names: Vec<_> = defs.iter().map(|d| d.method_name.as_str()).collect();
        assert_eq!(names, ["trackB", "trackA", "trackC"]);
    }
}
