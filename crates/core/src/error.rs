use std::collections::BTreeMap;
use std::fmt;

/// The single domain error raised when an entity invariant is violated.
///
/// Either a plain message (illegal transitions, cross-entity rules) or a
/// mapping of field name to a short machine-readable reason code, as
/// produced by field-level validation (e.g. `{"question": "under_100_words"}`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0}")]
    Message(String),

    #[error("{}", FieldCodes(.0))]
    Fields(BTreeMap<String, String>),
}

impl ValidationError {
    pub fn message(msg: impl Into<String>) -> Self {
        ValidationError::Message(msg.into())
    }

    pub fn field(field: impl Into<String>, code: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.into(), code.into());
        ValidationError::Fields(fields)
    }

    /// The reason code recorded for `field`, if this is a field error.
    pub fn field_code(&self, field: &str) -> Option<&str> {
        match self {
            ValidationError::Fields(fields) => fields.get(field).map(String::as_str),
            ValidationError::Message(_) => None,
        }
    }

    /// Message text for [`ValidationError::Message`], `None` for field errors.
    pub fn as_message(&self) -> Option<&str> {
        match self {
            ValidationError::Message(msg) => Some(msg),
            ValidationError::Fields(_) => None,
        }
    }
}

struct FieldCodes<'a>(&'a BTreeMap<String, String>);

impl fmt::Display for FieldCodes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, code) in self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{field}: {code}")?;
            first = false;
        }
        Ok(())
    }
}
