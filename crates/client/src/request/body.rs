use serde_json::{Map, Value};

/// MIME type for JSON bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Request body as handed to the request helper.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Key/value data; serialized as JSON or turned into a form depending on
    /// the content type.
    Object(Map<String, Value>),

    /// A prebuilt multipart form, sent unchanged.
    Form(FormData),
}

impl Payload {
    /// Payload from a JSON value; anything but an object becomes `None`.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::Object(map)),
            _ => None,
        }
    }
}

/// A multipart form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    parts: Vec<FormPart>,
}

/// One field of a [`FormData`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub value: PartValue,
}

/// Field content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    Text(String),
    File {
        file_name: String,
        mime: Option<String>,
        bytes: Vec<u8>,
    },
}

impl FormData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field. Repeated names are kept, in order.
    pub fn text(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.parts.push(FormPart {
            name: name.into(),
            value: PartValue::Text(value.into()),
        });
        self
    }

    /// Append a file field.
    pub fn file(
        &mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: Option<String>,
        bytes: Vec<u8>,
    ) -> &mut Self {
        self.parts.push(FormPart {
            name: name.into(),
            value: PartValue::File {
                file_name: file_name.into(),
                mime,
                bytes,
            },
        });
        self
    }

    #[must_use]
    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    /// First text value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match &part.value {
            PartValue::Text(text) if part.name == name => Some(text.as_str()),
            _ => None,
        })
    }

    /// Build a form from object fields.
    ///
    /// Arrays become one field per element, nulls are skipped, nested
    /// objects are sent as their JSON text.
    #[must_use]
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let mut form = Self::new();

        for (name, value) in object {
            match value {
                Value::Array(items) => {
                    for item in items {
                        if let Some(text) = field_text(item) {
                            form.text(name.as_str(), text);
                        }
                    }
                }
                other => {
                    if let Some(text) = field_text(other) {
                        form.text(name.as_str(), text);
                    }
                }
            }
        }

        form
    }
}

fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            Some(value.to_string())
        }
    }
}

/// Body after encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedBody {
    Empty,
    Json(String),
    Form(FormData),
}

/// Expand the `"json"` shorthand; other values pass through.
#[must_use]
pub fn normalize_content_type(content_type: Option<&str>) -> Option<String> {
    content_type.map(|content_type| {
        if content_type.eq_ignore_ascii_case("json") {
            JSON_CONTENT_TYPE.to_string()
        } else {
            content_type.to_string()
        }
    })
}

/// Encode `payload` for the wire.
///
/// Returns the header to send together with the body. Objects are
/// serialized when the content type is JSON and become a multipart form
/// otherwise; a prebuilt form is never touched.
///
/// # Errors
///
/// Returns an error when the object cannot be serialized.
pub fn encode(
    payload: Option<&Payload>,
    content_type: Option<&str>,
) -> Result<(Option<String>, EncodedBody), serde_json::Error> {
    let content_type = normalize_content_type(content_type);
    let is_json = content_type.as_deref() == Some(JSON_CONTENT_TYPE);

    let body = match payload {
        None => EncodedBody::Empty,
        Some(Payload::Form(form)) => EncodedBody::Form(form.clone()),
        Some(Payload::Object(object)) if is_json => EncodedBody::Json(serde_json::to_string(object)?),
        Some(Payload::Object(object)) => EncodedBody::Form(FormData::from_object(object)),
    };

    Ok((content_type, body))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    fn object(value: Value) -> Payload {
        Payload::from_value(value).unwrap_or(Payload::Form(FormData::new()))
    }

    #[test]
    fn json_shorthand_serializes_object() -> TestResult {
        let payload = object(json!({"bucket": "alias-bucket", "start": "", "limit": -1}));

        let (content_type, body) = encode(Some(&payload), Some("json"))?;

        assert_eq!(content_type.as_deref(), Some(JSON_CONTENT_TYPE));

        let EncodedBody::Json(text) = body else {
            return Err("expected a JSON body".into());
        };

        let decoded: Value = serde_json::from_str(&text)?;
        assert_eq!(decoded, json!({"bucket": "alias-bucket", "start": "", "limit": -1}));

        Ok(())
    }

    #[test]
    fn object_without_content_type_becomes_form() -> TestResult {
        let payload = object(json!({"id": "20240101", "tags": ["a", "b"], "skip": null, "n": 3}));

        let (content_type, body) = encode(Some(&payload), None)?;

        assert_eq!(content_type, None);

        let EncodedBody::Form(form) = body else {
            return Err("expected a form body".into());
        };

        let names: Vec<&str> = form.parts().iter().map(|part| part.name.as_str()).collect();

        assert_eq!(form.get("id"), Some("20240101"));
        assert_eq!(form.get("n"), Some("3"));
        assert_eq!(names.iter().filter(|name| **name == "tags").count(), 2);
        assert!(!names.contains(&"skip"));

        Ok(())
    }

    #[test]
    fn prebuilt_form_passes_through() -> TestResult {
        let mut form = FormData::new();
        form.text("password", "abc")
            .file("upload", "a.txt", None, b"hi".to_vec());

        let (_, body) = encode(Some(&Payload::Form(form.clone())), Some("json"))?;

        assert_eq!(body, EncodedBody::Form(form));

        Ok(())
    }

    #[test]
    fn missing_payload_is_empty() -> TestResult {
        let (_, body) = encode(None, Some("json"))?;

        assert_eq!(body, EncodedBody::Empty);

        Ok(())
    }

    #[test]
    fn other_content_types_pass_through() {
        assert_eq!(
            normalize_content_type(Some("text/plain")).as_deref(),
            Some("text/plain")
        );
        assert_eq!(
            normalize_content_type(Some("JSON")).as_deref(),
            Some(JSON_CONTENT_TYPE)
        );
    }
}
