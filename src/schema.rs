//! Call-schema generation for registered capabilities.
//!
//! Each capability declares its parameter list up front as a [`ToolSpec`].
//! [`generate`] turns that declaration into the [`ToolDescriptor`] sent to
//! the provider in the `tools` array of every request.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::constants::NO_DESCRIPTION;

/// Declared parameter of a capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    /// Declared type name. `None` and unknown names map to `string`.
    pub type_name: Option<String>,
    pub has_default: bool,
}

impl ParamSpec {
    /// A parameter the caller must supply.
    pub fn required(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: Some(type_name.into()),
            has_default: false,
        }
    }

    /// A parameter with a default value.
    pub fn optional(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            has_default: true,
            ..Self::required(name, type_name)
        }
    }

    /// A parameter with no declared type.
    pub fn untyped(name: impl Into<String>, has_default: bool) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            has_default,
        }
    }
}

/// Declarative description of a capability, supplied at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    pub params: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            params: Vec::new(),
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }
}

/// JSON Schema primitive a parameter is exposed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamKind {
    /// Maps a declared type name onto a schema type. Total: anything
    /// unrecognized is exposed as a string.
    pub fn from_type_name(name: Option<&str>) -> Self {
        let Some(name) = name else {
            return Self::String;
        };
        // Strip generic arguments so `Vec<String>` and `HashMap<K, V>` match.
        let base = name.trim().split('<').next().unwrap_or_default().trim();
        match base {
            "integer" | "int" | "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8"
            | "u16" | "u32" | "u64" | "u128" | "usize" => Self::Integer,
            "number" | "float" | "f32" | "f64" => Self::Number,
            "boolean" | "bool" => Self::Boolean,
            "array" | "list" | "tuple" | "Vec" | "VecDeque" | "HashSet" | "BTreeSet" => {
                Self::Array
            }
            "object" | "dict" | "map" | "Map" | "HashMap" | "BTreeMap" => Self::Object,
            _ => Self::String,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

/// Schema of one parameter as the provider sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSchema {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
}

/// The call schema for one capability. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// In declaration order.
    pub parameters: Vec<ParamSchema>,
    /// Parameters without a default, in declaration order.
    pub required: Vec<String>,
}

impl ToolDescriptor {
    /// The JSON Schema object for the `parameters` field.
    pub fn parameters_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    json!({ "type": p.kind.as_str(), "description": p.description }),
                )
            })
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }
}

impl Serialize for ToolDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ToolDescriptor", 2)?;
        s.serialize_field("type", "function")?;
        s.serialize_field(
            "function",
            &json!({
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters_schema(),
            }),
        )?;
        s.end()
    }
}

/// Why a capability declaration could not be turned into a schema.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("tool name is empty")]
    EmptyName,
    #[error("tool '{tool}' declares an unnamed parameter")]
    EmptyParamName { tool: String },
    #[error("tool '{tool}' declares parameter '{param}' more than once")]
    DuplicateParam { tool: String, param: String },
}

/// Generates the descriptor for one capability.
///
/// Skips a receiver parameter named `self`. Pure: the same spec always
/// yields the same descriptor.
pub fn generate(spec: &ToolSpec) -> Result<ToolDescriptor, SchemaError> {
    let name = spec.name.trim();
    if name.is_empty() {
        return Err(SchemaError::EmptyName);
    }

    let mut parameters: Vec<ParamSchema> = Vec::with_capacity(spec.params.len());
    let mut required = Vec::new();
    for param in spec.params.iter().filter(|p| p.name != "self") {
        if param.name.trim().is_empty() {
            return Err(SchemaError::EmptyParamName {
                tool: name.to_string(),
            });
        }
        if parameters.iter().any(|p| p.name == param.name) {
            return Err(SchemaError::DuplicateParam {
                tool: name.to_string(),
                param: param.name.clone(),
            });
        }
        parameters.push(ParamSchema {
            name: param.name.clone(),
            kind: ParamKind::from_type_name(param.type_name.as_deref()),
            description: format!("The {} argument", param.name),
        });
        if !param.has_default {
            required.push(param.name.clone());
        }
    }

    let description = spec
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(NO_DESCRIPTION)
        .to_string();

    Ok(ToolDescriptor {
        name: name.to_string(),
        description,
        parameters,
        required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_spec() -> ToolSpec {
        ToolSpec::new("search_jira_issues")
            .description("Search Jira.")
            .param(ParamSpec::required("query", "str"))
            .param(ParamSpec::optional("limit", "int"))
    }

    #[test]
    fn required_lists_params_without_defaults_in_order() {
        let spec = ToolSpec::new("t")
            .param(ParamSpec::required("b", "str"))
            .param(ParamSpec::optional("opt", "bool"))
            .param(ParamSpec::untyped("a", false));
        let desc = generate(&spec).unwrap();
        assert_eq!(desc.required, vec!["b", "a"]);
        assert_eq!(desc.parameters.len(), 3);
    }

    #[test]
    fn type_mapping_is_total() {
        assert_eq!(ParamKind::from_type_name(Some("int")), ParamKind::Integer);
        assert_eq!(ParamKind::from_type_name(Some("u64")), ParamKind::Integer);
        assert_eq!(ParamKind::from_type_name(Some("float")), ParamKind::Number);
        assert_eq!(ParamKind::from_type_name(Some("bool")), ParamKind::Boolean);
        assert_eq!(ParamKind::from_type_name(Some("Vec<String>")), ParamKind::Array);
        assert_eq!(ParamKind::from_type_name(Some("list")), ParamKind::Array);
        assert_eq!(ParamKind::from_type_name(Some("dict")), ParamKind::Object);
        assert_eq!(
            ParamKind::from_type_name(Some("HashMap<String, i32>")),
            ParamKind::Object
        );
        assert_eq!(ParamKind::from_type_name(Some("Frobnicator")), ParamKind::String);
        assert_eq!(ParamKind::from_type_name(Some("")), ParamKind::String);
        assert_eq!(ParamKind::from_type_name(None), ParamKind::String);
    }

    #[test]
    fn skips_self_receiver() {
        let spec = ToolSpec::new("method")
            .param(ParamSpec::untyped("self", false))
            .param(ParamSpec::required("query", "str"));
        let desc = generate(&spec).unwrap();
        assert_eq!(desc.parameters.len(), 1);
        assert_eq!(desc.required, vec!["query"]);
    }

    #[test]
    fn missing_description_uses_placeholder() {
        let desc = generate(&ToolSpec::new("bare")).unwrap();
        assert_eq!(desc.description, NO_DESCRIPTION);
        let blank = generate(&ToolSpec::new("blank").description("   ")).unwrap();
        assert_eq!(blank.description, NO_DESCRIPTION);
    }

    #[test]
    fn parameter_descriptions_reference_their_name() {
        let desc = generate(&search_spec()).unwrap();
        assert_eq!(desc.parameters[0].description, "The query argument");
        assert_eq!(desc.parameters[1].kind, ParamKind::Integer);
    }

    #[test]
    fn rejects_duplicate_and_empty_names() {
        assert_eq!(generate(&ToolSpec::new("  ")), Err(SchemaError::EmptyName));
        let dup = ToolSpec::new("dup")
            .param(ParamSpec::required("q", "str"))
            .param(ParamSpec::optional("q", "int"));
        assert!(matches!(generate(&dup), Err(SchemaError::DuplicateParam { .. })));
    }

    #[test]
    fn serializes_in_function_calling_shape() {
        let desc = generate(&search_spec()).unwrap();
        let value = serde_json::to_value(&desc).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "function",
                "function": {
                    "name": "search_jira_issues",
                    "description": "Search Jira.",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "query": { "type": "string", "description": "The query argument" },
                            "limit": { "type": "integer", "description": "The limit argument" }
                        },
                        "required": ["query"]
                    }
                }
            })
        );
    }

    #[test]
    fn generation_is_deterministic() {
        assert_eq!(generate(&search_spec()), generate(&search_spec()));
    }
}
