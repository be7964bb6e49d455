use crate::codegen::is_identifier;
use crate::config::{GeneratorConfig, TargetPlatform};
use crate::definition::EventDefinition;
use crate::error::{GenError, Result};
use crate::ir::{Api, Binding, DefaultValue, Param, Stmt};
use crate::merge::ParamDefault;

/// Locals declared by every generated dispatch body.
const RESERVED_NAMES: &[&str] = &["params", "supportedPlatforms", "trackingEvent", "eventTrackers"];

pub fn lower_to_ir(definitions: &[EventDefinition], config: &GeneratorConfig) -> Result<Api> {
    let bindings = definitions.iter().map(lower_definition).collect::<Result<Vec<_>>>()?;
    Ok(Api {
        namespace: config.namespace.clone(),
        runtime_namespace: config.runtime_namespace.clone(),
        api_class: config.api_class.clone(),
        impl_class: config.impl_class.clone(),
        js_export: config.platform == TargetPlatform::Js,
        bindings,
    })
}

pub fn lower_definition(def: &EventDefinition) -> Result<Binding> {
    if !is_identifier(&def.method_name) {
        return Err(GenError::malformed(&def.origin, &def.method_name, "method name is not a valid identifier"));
    }

    let mut params = Vec::with_capacity(def.parameters.len());
    let mut body = Vec::with_capacity(def.parameters.len() + 3);
    for spec in &def.parameters {
        if !is_identifier(&spec.name) {
            return Err(GenError::malformed(
                &def.origin,
                &def.method_name,
                format!("parameter `{}` is not a valid identifier", spec.name),
            ));
        }
        if RESERVED_NAMES.contains(&spec.name.as_str()) {
            return Err(GenError::malformed(
                &def.origin,
                &def.method_name,
                format!("parameter name `{}` is reserved by the generated code", spec.name),
            ));
        }

        // nullable ⇔ optional; an optional without explicit default defaults to null
        let nullable = !spec.required;
        let default = match (&spec.default, nullable) {
            (Some(ParamDefault::Expression(expr)), _) => Some(DefaultValue::Expression(expr.clone())),
            (Some(ParamDefault::Literal(text)), _) => Some(DefaultValue::Literal(text.clone())),
            (None, true) => Some(DefaultValue::Null),
            (None, false) => None,
        };
        params.push(Param {
            name: spec.name.clone(),
            doc: spec.description.clone(),
            nullable,
            default,
        });
        body.push(if nullable {
            Stmt::CollectIfPresent { param: spec.name.clone() }
        } else {
            Stmt::Collect { param: spec.name.clone() }
        });
    }
    body.push(Stmt::Platforms(def.supported_platforms.clone()));
    body.push(Stmt::BuildEvent { event_name: def.event_name.clone() });
    body.push(Stmt::Dispatch);

    Ok(Binding {
        method: def.method_name.clone(),
        doc: def.description.clone(),
        params,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::{ParamSource, ParamSpec};
    use std::path::PathBuf;

    fn spec(name: &str, required: bool, default: Option<ParamDefault>) -> ParamSpec {
        ParamSpec {
            name: name.into(),
            ty: "string".into(),
            description: None,
            required,
            default,
            source: ParamSource::Local,
        }
    }

    fn definition(parameters: Vec<ParamSpec>) -> EventDefinition {
        EventDefinition {
            method_name: "trackOrderPlaced".into(),
            description: "Order placed.".into(),
            event_name: "order_placed".into(),
            parameters,
            supported_platforms: vec!["ios".into(), "android".into()],
            origin: PathBuf::from("order.yml"),
        }
    }

    #[test]
    fn nullability_follows_required() {
        let binding = lower_definition(&definition(vec![spec("orderId", true, None), spec("promoCode", false, None)])).unwrap();
        assert!(!binding.params[0].nullable);
        assert_eq!(binding.params[0].default, None);
        assert!(binding.params[1].nullable);
        assert_eq!(binding.params[1].default, Some(DefaultValue::Null));
    }

    #[test]
    fn body_collects_in_declaration_order_then_dispatches() {
        let promo = spec("promoCode", false, Some(ParamDefault::Literal("NONE".into())));
        let binding = lower_definition(&definition(vec![spec("orderId", true, None), promo])).unwrap();
        assert_eq!(
            binding.body,
            vec![
                Stmt::Collect { param: "orderId".into() },
                Stmt::CollectIfPresent { param: "promoCode".into() },
                Stmt::Platforms(vec!["ios".into(), "android".into()]),
                Stmt::BuildEvent { event_name: "order_placed".into() },
                Stmt::Dispatch,
            ]
        );
        assert_eq!(binding.params[1].default, Some(DefaultValue::Literal("NONE".into())));
    }

    #[test]
    fn expression_default_on_required_param_is_kept() {
        let expr = ParamDefault::Expression("DEFAULT_CURRENCY".into());
        let binding = lower_definition(&definition(vec![spec("currency", true, Some(expr))])).unwrap();
        assert!(!binding.params[0].nullable);
        assert_eq!(binding.params[0].default, Some(DefaultValue::Expression("DEFAULT_CURRENCY".into())));
    }

    #[test]
    fn reserved_and_invalid_names_are_malformed() {
        for bad in ["params", "order-id", "1st"] {
            let err = lower_definition(&definition(vec![spec(bad, true, None)])).unwrap_err();
            assert!(matches!(err, GenError::MalformedDefinition { .. }), "{bad}: {err}");
        }
    }

    #[test]
    fn js_platform_exports() {
        let config = GeneratorConfig { platform: TargetPlatform::Js, ..GeneratorConfig::default() };
        let api = lower_to_ir(&[definition(vec![])], &config).unwrap();
        assert!(api.js_export);
        assert_eq!(api.bindings.len(), 1);
    }
}
