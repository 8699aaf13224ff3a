//! Function tool declarations.
//!
//! Tools are declared in configuration and advertised to the model in
//! `session.update` and `response.create`. Every parameter is required.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value, json};

/// JSON Schema type of a tool parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    String,
    Integer,
    Number,
    /// A string restricted to the listed values
    Enum(Vec<String>),
}

impl ParameterKind {
    fn schema(&self) -> Value {
        match self {
            ParameterKind::String => json!({"type": "string"}),
            ParameterKind::Integer => json!({"type": "integer"}),
            ParameterKind::Number => json!({"type": "number"}),
            ParameterKind::Enum(values) => json!({"type": "string", "enum": values}),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawParameter")]
pub struct ToolParameter {
    pub name: String,
    pub kind: ParameterKind,
}

/// Parameter as written in configuration: `{name, type, enum?}`.
#[derive(Deserialize)]
struct RawParameter {
    name: String,
    #[serde(rename = "type", default = "default_parameter_type")]
    kind: String,
    #[serde(rename = "enum", default)]
    values: Option<Vec<String>>,
}

fn default_parameter_type() -> String {
    "string".to_string()
}

impl TryFrom<RawParameter> for ToolParameter {
    type Error = String;

    fn try_from(raw: RawParameter) -> Result<Self, Self::Error> {
        let kind = match (raw.kind.as_str(), raw.values) {
            ("string", Some(values)) => ParameterKind::Enum(values),
            ("string", None) => ParameterKind::String,
            ("integer", None) => ParameterKind::Integer,
            ("number", None) => ParameterKind::Number,
            (other, Some(_)) => {
                return Err(format!(
                    "Parameter '{}': enum values require type 'string', got '{other}'",
                    raw.name
                ));
            }
            (other, None) => {
                return Err(format!(
                    "Parameter '{}': unsupported type '{other}'",
                    raw.name
                ));
            }
        };
        Ok(ToolParameter {
            name: raw.name,
            kind,
        })
    }
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A function the model may call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FunctionTool {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
}

impl FunctionTool {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, kind: ParameterKind) -> Self {
        self.parameters.push(ToolParameter::new(name, kind));
        self
    }

    /// JSON Schema object describing the parameters.
    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::with_capacity(self.parameters.len());
        for param in &self.parameters {
            properties.insert(param.name.clone(), param.kind.schema());
            required.push(Value::String(param.name.clone()));
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

impl Serialize for FunctionTool {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("type", "function")?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("description", &self.description)?;
        map.serialize_entry("parameters", &self.parameters_schema())?;
        map.end()
    }
}
