//! Parameter schemas and argument validation
//!
//! A `ToolSpec` describes a tool's parameters as a list of typed `ParamSpec`s.
//! It produces the JSON Schema advertised in discovery and validates incoming
//! arguments before the tool body runs, coercing the loose encodings models
//! tend to emit (`"true"`, `"3"`, `"3.0"`).

use serde_json::{json, Map, Number, Value};

use super::error::HandlerError;
use crate::types::ToolDescriptor;

/// Kind of a single parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    /// Free text, optionally restricted to a fixed set (matched case-insensitively)
    String { allowed: Option<Vec<String>> },
    /// Whole number with optional inclusive bounds
    Integer { min: Option<i64>, max: Option<i64> },
    Number,
    Boolean,
    Object,
}

impl ParamKind {
    fn json_type(&self) -> &'static str {
        match self {
            ParamKind::String { .. } => "string",
            ParamKind::Integer { .. } => "integer",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Object => "object",
        }
    }
}

/// One named parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
    pub default: Option<Value>,
}

impl ParamSpec {
    fn new(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
            default: None,
        }
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamKind::String { allowed: None }, description)
    }

    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Integer { min: None, max: None }, description)
    }

    pub fn number(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Number, description)
    }

    pub fn boolean(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Boolean, description)
    }

    pub fn object(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Object, description)
    }

    /// Make the parameter optional with a default value
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(default.into());
        self
    }

    /// Make the parameter optional without a default
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Restrict a string parameter to a fixed set of values
    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let ParamKind::String { allowed } = &mut self.kind {
            *allowed = Some(values.into_iter().map(Into::into).collect());
        }
        self
    }

    /// Bound an integer parameter (inclusive)
    pub fn range(mut self, lo: Option<i64>, hi: Option<i64>) -> Self {
        if let ParamKind::Integer { min, max } = &mut self.kind {
            *min = lo;
            *max = hi;
        }
        self
    }

    fn schema(&self) -> Value {
        let mut prop = Map::new();
        prop.insert("type".into(), json!(self.kind.json_type()));
        if !self.description.is_empty() {
            prop.insert("description".into(), json!(self.description));
        }
        match &self.kind {
            ParamKind::String { allowed: Some(values) } => {
                prop.insert("enum".into(), json!(values));
            }
            ParamKind::Integer { min, max } => {
                if let Some(min) = min {
                    prop.insert("minimum".into(), json!(min));
                }
                if let Some(max) = max {
                    prop.insert("maximum".into(), json!(max));
                }
            }
            _ => {}
        }
        if let Some(default) = &self.default {
            prop.insert("default".into(), default.clone());
        }
        Value::Object(prop)
    }

    /// Coerce one raw value to this parameter's kind
    fn coerce(&self, raw: &Value) -> Result<Value, HandlerError> {
        let invalid = |reason: String| HandlerError::invalid(&self.name, reason);

        match &self.kind {
            ParamKind::String { allowed } => {
                let text = match raw {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    other => return Err(invalid(format!("expected a string, got {}", kind_of(other)))),
                };
                match allowed {
                    None => Ok(Value::String(text)),
                    Some(values) => {
                        let wanted = text.trim().to_lowercase();
                        values
                            .iter()
                            .find(|v| v.to_lowercase() == wanted)
                            .map(|v| Value::String(v.clone()))
                            .ok_or_else(|| {
                                invalid(format!("must be one of {}", values.join(", ")))
                            })
                    }
                }
            }
            ParamKind::Integer { min, max } => {
                let n = coerce_integer(raw).ok_or_else(|| {
                    invalid(format!("expected an integer, got {}", describe(raw)))
                })?;
                if let Some(min) = min {
                    if n < *min {
                        return Err(invalid(format!("must be at least {}", min)));
                    }
                }
                if let Some(max) = max {
                    if n > *max {
                        return Err(invalid(format!("must be at most {}", max)));
                    }
                }
                Ok(json!(n))
            }
            ParamKind::Number => {
                let n = match raw {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                }
                .filter(|n| n.is_finite())
                .ok_or_else(|| invalid(format!("expected a number, got {}", describe(raw))))?;
                Number::from_f64(n)
                    .map(Value::Number)
                    .ok_or_else(|| invalid("not a finite number".to_string()))
            }
            ParamKind::Boolean => coerce_bool(raw)
                .map(Value::Bool)
                .ok_or_else(|| invalid(format!("expected a boolean, got {}", describe(raw)))),
            ParamKind::Object => match raw {
                Value::Object(_) => Ok(raw.clone()),
                Value::String(s) => match serde_json::from_str::<Value>(s) {
                    Ok(v @ Value::Object(_)) => Ok(v),
                    _ => Err(invalid("expected an object".to_string())),
                },
                other => Err(invalid(format!("expected an object, got {}", kind_of(other)))),
            },
        }
    }
}

fn coerce_integer(raw: &Value) -> Option<i64> {
    let as_float = match raw {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(i);
            }
            n.as_f64()?
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Some(i);
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    if as_float.is_finite() && as_float.fract() == 0.0 && as_float.abs() < i64::MAX as f64 {
        Some(as_float as i64)
    } else {
        None
    }
}

fn coerce_bool(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Some(true),
            "false" | "f" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s),
        other => kind_of(other).to_string(),
    }
}

/// Schema-described tool: name, description and parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// JSON Schema object for the parameters
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.clone(), p.schema()))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(&self.name, &self.description).with_schema(self.input_schema())
    }

    /// Validate and coerce raw arguments
    ///
    /// `null` counts as an empty object. Keys not named by any parameter are
    /// dropped. An explicit `null` value is treated as absent.
    pub fn validate(&self, arguments: &Value) -> Result<ToolArgs, HandlerError> {
        let empty = Map::new();
        let raw = match arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(HandlerError::InvalidArguments(format!(
                    "expected a JSON object, got {}",
                    kind_of(other)
                )))
            }
        };

        let mut values = Map::new();
        for param in &self.params {
            match raw.get(&param.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    values.insert(param.name.clone(), param.coerce(value)?);
                }
                None => match (&param.default, param.required) {
                    (Some(default), _) => {
                        values.insert(param.name.clone(), default.clone());
                    }
                    (None, true) => return Err(HandlerError::MissingParameter(param.name.clone())),
                    (None, false) => {}
                },
            }
        }

        Ok(ToolArgs { values })
    }
}

/// Validated arguments with typed accessors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs {
    values: Map<String, Value>,
}

impl ToolArgs {
    fn required(&self, name: &str) -> Result<&Value, HandlerError> {
        self.values
            .get(name)
            .ok_or_else(|| HandlerError::MissingParameter(name.to_string()))
    }

    pub fn get_str(&self, name: &str) -> Result<&str, HandlerError> {
        self.required(name)?
            .as_str()
            .ok_or_else(|| HandlerError::invalid(name, "expected a string"))
    }

    pub fn get_i64(&self, name: &str) -> Result<i64, HandlerError> {
        self.required(name)?
            .as_i64()
            .ok_or_else(|| HandlerError::invalid(name, "expected an integer"))
    }

    pub fn get_f64(&self, name: &str) -> Result<f64, HandlerError> {
        self.required(name)?
            .as_f64()
            .ok_or_else(|| HandlerError::invalid(name, "expected a number"))
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, HandlerError> {
        self.required(name)?
            .as_bool()
            .ok_or_else(|| HandlerError::invalid(name, "expected a boolean"))
    }

    pub fn get_object(&self, name: &str) -> Result<&Map<String, Value>, HandlerError> {
        self.required(name)?
            .as_object()
            .ok_or_else(|| HandlerError::invalid(name, "expected an object"))
    }

    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn opt_i64(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(Value::as_i64)
    }

    pub fn opt_bool(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(Value::as_bool)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather_spec() -> ToolSpec {
        ToolSpec::new("get_weather", "Fetch weather")
            .param(ParamSpec::string("city", "City name"))
            .param(ParamSpec::boolean("current", "Current conditions").with_default(true))
            .param(ParamSpec::integer("days", "Forecast days").with_default(1).range(Some(1), None))
            .param(
                ParamSpec::string("forecast_type", "daily or hourly")
                    .with_default("daily")
                    .one_of(["daily", "hourly"]),
            )
    }

    #[test]
    fn test_input_schema() {
        let schema = weather_spec().input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["city"]));
        assert_eq!(schema["properties"]["city"]["type"], "string");
        assert_eq!(schema["properties"]["days"]["minimum"], 1);
        assert_eq!(schema["properties"]["days"]["default"], 1);
        assert_eq!(schema["properties"]["forecast_type"]["enum"], json!(["daily", "hourly"]));

        let descriptor = weather_spec().descriptor();
        assert_eq!(descriptor.name, "get_weather");
        assert_eq!(descriptor.input_schema, schema);
    }

    #[test]
    fn test_defaults_filled() {
        let args = weather_spec().validate(&json!({"city": "Pune"})).unwrap();
        assert_eq!(args.get_str("city").unwrap(), "Pune");
        assert!(args.get_bool("current").unwrap());
        assert_eq!(args.get_i64("days").unwrap(), 1);
        assert_eq!(args.get_str("forecast_type").unwrap(), "daily");
    }

    #[test]
    fn test_loose_encodings_coerced() {
        let args = weather_spec()
            .validate(&json!({
                "city": "Pune",
                "current": "No",
                "days": "3.0",
                "forecast_type": " Hourly ",
                "unknown_extra": [1, 2, 3]
            }))
            .unwrap();
        assert!(!args.get_bool("current").unwrap());
        assert_eq!(args.get_i64("days").unwrap(), 3);
        assert_eq!(args.get_str("forecast_type").unwrap(), "hourly");
        assert!(!args.contains("unknown_extra"));
    }

    #[test]
    fn test_missing_and_invalid() {
        let spec = weather_spec();
        assert!(matches!(
            spec.validate(&json!({})),
            Err(HandlerError::MissingParameter(p)) if p == "city"
        ));
        assert!(matches!(
            spec.validate(&json!({"city": "Pune", "days": 0})),
            Err(HandlerError::InvalidParameter { name, .. }) if name == "days"
        ));
        assert!(matches!(
            spec.validate(&json!({"city": "Pune", "days": "2.5"})),
            Err(HandlerError::InvalidParameter { .. })
        ));
        assert!(matches!(
            spec.validate(&json!({"city": "Pune", "forecast_type": "weekly"})),
            Err(HandlerError::InvalidParameter { .. })
        ));
        assert!(matches!(
            spec.validate(&json!({"city": "Pune", "current": "maybe"})),
            Err(HandlerError::InvalidParameter { .. })
        ));
        assert!(matches!(
            spec.validate(&json!(["Pune"])),
            Err(HandlerError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_null_arguments_and_values() {
        let spec = ToolSpec::new("get_datetime", "Now");
        assert!(spec.validate(&Value::Null).is_ok());

        // Explicit null falls back to the default
        let args = weather_spec()
            .validate(&json!({"city": "Pune", "days": null}))
            .unwrap();
        assert_eq!(args.get_i64("days").unwrap(), 1);
    }

    #[test]
    fn test_number_and_object_kinds() {
        let spec = ToolSpec::new("t", "")
            .param(ParamSpec::number("x", ""))
            .param(ParamSpec::object("o", "").optional());
        let args = spec.validate(&json!({"x": "2.5", "o": "{\"a\": 1}"})).unwrap();
        assert_eq!(args.get_f64("x").unwrap(), 2.5);
        assert_eq!(args.get_object("o").unwrap()["a"], 1);

        let args = spec.validate(&json!({"x": 1})).unwrap();
        assert!(!args.contains("o"));
        assert!(spec.validate(&json!({"x": "abc"})).is_err());
    }
}
