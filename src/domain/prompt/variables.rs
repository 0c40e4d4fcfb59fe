//! Variables supplied when compiling a prompt

use std::collections::HashMap;

use serde_json::Value;

use super::TemplateError;

/// Named values substituted into `{{ name }}` placeholders.
///
/// Values are kept as JSON scalars: strings are inserted verbatim, numbers and
/// booleans use their textual form. `null`, arrays and objects have no textual
/// form and are rejected when a placeholder refers to them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateVariables {
    values: HashMap<String, Value>,
}

impl TemplateVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Textual form of a variable, `Ok(None)` when it was not supplied
    pub fn render_value(&self, name: &str) -> Result<Option<String>, TemplateError> {
        let Some(value) = self.values.get(name) else {
            return Ok(None);
        };

        match value {
            Value::String(s) => Ok(Some(s.clone())),
            Value::Number(n) => Ok(Some(n.to_string())),
            Value::Bool(b) => Ok(Some(b.to_string())),
            Value::Null => Err(TemplateError::UnsupportedValue {
                name: name.to_string(),
                value_type: "null".to_string(),
            }),
            Value::Array(_) => Err(TemplateError::UnsupportedValue {
                name: name.to_string(),
                value_type: "array".to_string(),
            }),
            Value::Object(_) => Err(TemplateError::UnsupportedValue {
                name: name.to_string(),
                value_type: "object".to_string(),
            }),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for TemplateVariables
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let values = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { values }
    }
}

impl From<HashMap<String, String>> for TemplateVariables {
    fn from(values: HashMap<String, String>) -> Self {
        values.into_iter().collect()
    }
}
