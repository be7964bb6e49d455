// Strongly-typed binding IR. Both artifacts are rendered from the same
// `Binding`s, so an abstract method and its override can't drift apart.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Api {
    pub namespace: String,
    pub runtime_namespace: String,
    pub api_class: String,
    pub impl_class: String,
    pub js_export: bool,
    pub bindings: Vec<Binding>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub method: String,
    pub doc: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,     // dispatch implementation, in execution order
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub doc: Option<String>,
    pub nullable: bool,
    pub default: Option<DefaultValue>, // abstract declaration only
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    Null,
    /// Kotlin expression, emitted verbatim.
    Expression(String),
    /// Emitted as a string literal.
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// params += (name, value)
    Collect { param: String },
    /// if (value != null) params += (name, value)
    CollectIfPresent { param: String },
    Platforms(Vec<String>),
    BuildEvent { event_name: String },
    /// hand the event to every tracker supporting one of the platforms
    Dispatch,
}

impl Binding {
    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|x| x.name.as_str()).collect()
    }
}
