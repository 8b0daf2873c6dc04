//! Request bodies for the zone API.
//!
//! Bodies are decoded in two steps so that authorization can run before any
//! field is validated: first into a loose [`RequestBody`] (any JSON object),
//! then into the operation's typed request via `TryFrom<&RequestBody>`.

use serde_json::{Map, Value};

/// Why a request body was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("Invalid JSON body: {0}")]
    Malformed(String),
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{field} must be {expected}")]
    Invalid {
        field: &'static str,
        expected: &'static str,
    },
}

/// A decoded JSON object whose fields have not been validated yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestBody {
    fields: Map<String, Value>,
}

impl RequestBody {
    /// Decode raw bytes. Anything other than a JSON object is malformed.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, FieldError> {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(fields)) => Ok(Self { fields }),
            Ok(_) => Err(FieldError::Malformed(
                "body must be a JSON object".to_string(),
            )),
            Err(e) => Err(FieldError::Malformed(e.to_string())),
        }
    }

    /// Bearer token, if present as a non-empty string.
    pub fn token(&self) -> Option<&str> {
        self.fields
            .get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
    }

    fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    fn non_empty_str(&self, field: &'static str) -> Result<&str, FieldError> {
        match self.get(field) {
            None => Err(FieldError::Missing(field)),
            Some(Value::String(s)) if s.is_empty() => Err(FieldError::Missing(field)),
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(FieldError::Invalid {
                field,
                expected: "a string",
            }),
        }
    }

    /// Namespace name.
    pub fn memory(&self) -> Result<&str, FieldError> {
        self.non_empty_str("memory")
    }

    fn string_list(&self, field: &'static str) -> Result<Vec<String>, FieldError> {
        let invalid = FieldError::Invalid {
            field,
            expected: "an array of strings",
        };
        match self.get(field) {
            None => Err(FieldError::Missing(field)),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string).ok_or_else(|| invalid.clone()))
                .collect(),
            Some(_) => Err(invalid),
        }
    }

    fn string_map(&self, field: &'static str) -> Result<Vec<(String, String)>, FieldError> {
        let invalid = FieldError::Invalid {
            field,
            expected: "an object of string values",
        };
        match self.get(field) {
            None => Err(FieldError::Missing(field)),
            Some(Value::Object(entries)) => entries
                .iter()
                .map(|(k, v)| {
                    v.as_str()
                        .map(|s| (k.clone(), s.to_string()))
                        .ok_or_else(|| invalid.clone())
                })
                .collect(),
            Some(_) => Err(invalid),
        }
    }
}

/// Implemented by every typed request: the namespace it targets.
pub trait ZoneRequest {
    fn memory(&self) -> &str;
}

macro_rules! zone_request {
    ($($ty:ty),* $(,)?) => {
        $(impl ZoneRequest for $ty {
            fn memory(&self) -> &str {
                &self.memory
            }
        })*
    };
}

zone_request!(
    KeyRequest,
    SetRequest,
    MGetRequest,
    MSetRequest,
    KeysRequest,
    MDeleteRequest,
);

/// get / delete / exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRequest {
    pub memory: String,
    pub key: String,
}

impl TryFrom<&RequestBody> for KeyRequest {
    type Error = FieldError;

    fn try_from(body: &RequestBody) -> Result<Self, Self::Error> {
        Ok(Self {
            key: body.non_empty_str("key")?.to_string(),
            memory: body.memory()?.to_string(),
        })
    }
}

/// set. An empty `value` is a value; only an absent or null one is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetRequest {
    pub memory: String,
    pub key: String,
    pub value: String,
}

impl TryFrom<&RequestBody> for SetRequest {
    type Error = FieldError;

    fn try_from(body: &RequestBody) -> Result<Self, Self::Error> {
        let key = body.non_empty_str("key")?.to_string();
        let value = match body.get("value") {
            None => return Err(FieldError::Missing("value")),
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(FieldError::Invalid {
                    field: "value",
                    expected: "a string",
                })
            }
        };
        Ok(Self {
            memory: body.memory()?.to_string(),
            key,
            value,
        })
    }
}

/// mget: `key` holds the list of keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MGetRequest {
    pub memory: String,
    pub keys: Vec<String>,
}

impl TryFrom<&RequestBody> for MGetRequest {
    type Error = FieldError;

    fn try_from(body: &RequestBody) -> Result<Self, Self::Error> {
        Ok(Self {
            keys: body.string_list("key")?,
            memory: body.memory()?.to_string(),
        })
    }
}

/// mset: `key` holds an object of key -> value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MSetRequest {
    pub memory: String,
    pub entries: Vec<(String, String)>,
}

impl TryFrom<&RequestBody> for MSetRequest {
    type Error = FieldError;

    fn try_from(body: &RequestBody) -> Result<Self, Self::Error> {
        Ok(Self {
            entries: body.string_map("key")?,
            memory: body.memory()?.to_string(),
        })
    }
}

/// keys: only the namespace is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysRequest {
    pub memory: String,
}

impl TryFrom<&RequestBody> for KeysRequest {
    type Error = FieldError;

    fn try_from(body: &RequestBody) -> Result<Self, Self::Error> {
        Ok(Self {
            memory: body.memory()?.to_string(),
        })
    }
}

/// mdelete: `value` holds the list of keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MDeleteRequest {
    pub memory: String,
    pub keys: Vec<String>,
}

impl TryFrom<&RequestBody> for MDeleteRequest {
    type Error = FieldError;

    fn try_from(body: &RequestBody) -> Result<Self, Self::Error> {
        Ok(Self {
            keys: body.string_list("value")?,
            memory: body.memory()?.to_string(),
        })
    }
}

/// Content of get/set responses.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ValueContent {
    pub value: Option<String>,
}
