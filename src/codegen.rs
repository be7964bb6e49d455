//! Kotlin rendering of the binding IR.
//!
//! Output is a pure function of the [`Api`]: no timestamps, no hash-ordered
//! collections, so unchanged input yields byte-identical files.
use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::{Api, Binding, DefaultValue, Param, Stmt};

const HEADER: &str = "// Code generated by trackgen. DO NOT EDIT.";
const INDENT: &str = "    ";
const MAX_LINE: usize = 100;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

const HARD_KEYWORDS: &[&str] = &[
    "as", "break", "class", "continue", "do", "else", "false", "for", "fun", "if", "in", "interface", "is",
    "null", "object", "package", "return", "super", "this", "throw", "true", "try", "typealias", "typeof",
    "val", "var", "when", "while",
];

pub fn is_identifier(s: &str) -> bool {
    IDENTIFIER.is_match(s)
}

/// Backtick-escape Kotlin hard keywords.
pub fn escape_ident(name: &str) -> Cow<'_, str> {
    if HARD_KEYWORDS.contains(&name) {
        Cow::Owned(format!("`{name}`"))
    } else {
        Cow::Borrowed(name)
    }
}

pub fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

// ————————————————————————————————————————————————————————————————————————————
// CODEGEN
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Default)]
pub struct Codegen {
    out: String,
    depth: usize,
}

impl Codegen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_string(self) -> String {
        self.out
    }

    /// Artifact 1: the abstract API calling code depends on.
    pub fn emit_api(&mut self, api: &Api) {
        self.preamble(api, &[]);
        if api.js_export {
            self.line("@JsExport");
        }
        self.line(&format!("public abstract class {} {{", api.api_class));
        self.depth += 1;
        for (i, binding) in api.bindings.iter().enumerate() {
            if i > 0 {
                self.blank();
            }
            self.kdoc(&binding.doc, &binding.params);
            let params = binding.params.iter().map(|p| render_param(p, true)).collect::<Vec<_>>();
            let prefix = format!("public abstract fun {}", escape_ident(&binding.method));
            self.signature(&prefix, &params, "");
        }
        self.depth -= 1;
        self.line("}");
    }

    /// Artifact 2: one override per abstract method, dispatching to trackers.
    pub fn emit_impl(&mut self, api: &Api) {
        let imports = if api.runtime_namespace == api.namespace {
            Vec::new()
        } else {
            vec![
                format!("{}.EventTracker", api.runtime_namespace),
                format!("{}.TrackingEvent", api.runtime_namespace),
            ]
        };
        self.preamble(api, &imports);
        if api.js_export {
            self.line("@JsExport");
        }
        self.line(&format!("public class {}(", api.impl_class));
        self.depth += 1;
        self.line("private val eventTrackers: Array<EventTracker>,");
        self.depth -= 1;
        self.line(&format!(") : {}() {{", api.api_class));
        self.depth += 1;
        for (i, binding) in api.bindings.iter().enumerate() {
            if i > 0 {
                self.blank();
            }
            self.override_fun(binding);
        }
        self.depth -= 1;
        self.line("}");
    }

    fn override_fun(&mut self, binding: &Binding) {
        let params = binding.params.iter().map(|p| render_param(p, false)).collect::<Vec<_>>();
        let prefix = format!("override fun {}", escape_ident(&binding.method));
        self.signature(&prefix, &params, " {");
        self.depth += 1;
        self.line("val params = mutableListOf<TrackingEvent.Parameter>()");
        for stmt in &binding.body {
            match stmt {
                Stmt::Collect { param } => self.line(&collect(param)),
                Stmt::CollectIfPresent { param } => {
                    self.line(&format!("if ({} != null) {{", escape_ident(param)));
                    self.depth += 1;
                    self.line(&collect(param));
                    self.depth -= 1;
                    self.line("}");
                }
                Stmt::Platforms(platforms) => {
                    let list = platforms.iter().map(|x| string_literal(x)).collect::<Vec<_>>().join(", ");
                    self.line(&format!("val supportedPlatforms = arrayOf({list})"));
                }
                Stmt::BuildEvent { event_name } => {
                    self.line(&format!(
                        "val trackingEvent = TrackingEvent({}, params.toTypedArray())",
                        string_literal(event_name)
                    ));
                }
                Stmt::Dispatch => {
                    self.line("eventTrackers.filter { it.supportsEventTracking(supportedPlatforms) }");
                    self.depth += 1;
                    self.line(".forEach { it.trackEvent(trackingEvent) }");
                    self.depth -= 1;
                }
            }
        }
        self.depth -= 1;
        self.line("}");
    }

    fn preamble(&mut self, api: &Api, imports: &[String]) {
        self.line(HEADER);
        if !api.namespace.is_empty() {
            self.line(&format!("package {}", api.namespace));
        }
        let mut imports = imports.to_vec();
        if api.js_export {
            imports.push("kotlin.js.JsExport".to_string());
        }
        imports.sort();
        if !imports.is_empty() {
            self.blank();
            for import in &imports {
                self.line(&format!("import {import}"));
            }
        }
        self.blank();
    }

    /// One line when it fits, otherwise one parameter per line.
    fn signature(&mut self, prefix: &str, params: &[String], suffix: &str) {
        let one_line = format!("{prefix}({}){suffix}", params.join(", "));
        if params.is_empty() || self.depth * INDENT.len() + one_line.len() <= MAX_LINE {
            self.line(&one_line);
            return;
        }
        self.line(&format!("{prefix}("));
        self.depth += 1;
        for param in params {
            self.line(&format!("{param},"));
        }
        self.depth -= 1;
        self.line(&format!("){suffix}"));
    }

    fn kdoc(&mut self, doc: &str, params: &[Param]) {
        let doc_lines = doc.trim().lines().map(str::trim_end).collect::<Vec<_>>();
        let param_lines = params
            .iter()
            .filter_map(|p| {
                let text = p.doc.as_deref()?.split_whitespace().collect::<Vec<_>>().join(" ");
                (!text.is_empty()).then(|| format!("@param {} {text}", p.name))
            })
            .collect::<Vec<_>>();
        if doc_lines.is_empty() && param_lines.is_empty() {
            return;
        }
        self.line("/**");
        for line in &doc_lines {
            self.kdoc_line(line);
        }
        if !doc_lines.is_empty() && !param_lines.is_empty() {
            self.kdoc_line("");
        }
        for line in &param_lines {
            self.kdoc_line(line);
        }
        self.line(" */");
    }

    fn kdoc_line(&mut self, text: &str) {
        // block comments nest in Kotlin, so an opener is as dangerous as a closer
        let text = text.replace("*/", "*&#47;").replace("/*", "/&#42;");
        if text.is_empty() {
            self.line(" *");
        } else {
            self.line(&format!(" * {text}"));
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }
}

pub fn render_api(api: &Api) -> String {
    let mut cg = Codegen::new();
    cg.emit_api(api);
    cg.into_string()
}

pub fn render_impl(api: &Api) -> String {
    let mut cg = Codegen::new();
    cg.emit_impl(api);
    cg.into_string()
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Defaults only exist on the abstract declaration; overrides can't redeclare them.
fn render_param(param: &Param, with_default: bool) -> String {
    let ty = if param.nullable { "String?" } else { "String" };
    let mut out = format!("{}: {ty}", escape_ident(&param.name));
    if with_default {
        match &param.default {
            Some(DefaultValue::Null) => out.push_str(" = null"),
            Some(DefaultValue::Expression(expr)) => {
                out.push_str(" = ");
                out.push_str(expr);
            }
            Some(DefaultValue::Literal(text)) => {
                out.push_str(" = ");
                out.push_str(&string_literal(text));
            }
            None => {}
        }
    }
    out
}

fn collect(param: &str) -> String {
    format!(
        "params += TrackingEvent.Parameter({}, {})",
        string_literal(param),
        escape_ident(param)
    )
}
