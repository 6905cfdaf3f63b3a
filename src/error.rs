//! Binding errors
//!
//! Every failure is terminal for the document being bound. Callers branch on
//! [`BindError::kind`] and translate it into a protocol-level response using
//! [`status_code`].

use thiserror::Error;

type Cause = Box<dyn std::error::Error + Send + Sync>;

/// Coarse classification of a [`BindError`]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    MalformedDocument,
    UnprocessableDocument,
    UnknownResourceType,
    UnknownRelationship,
    InvalidNullRelationship,
    DuplicateIncludedResource,
    TypeConversionFailed,
}

#[derive(Debug, Error)]
pub enum BindError {
    /// The request body could not be parsed into a document.
    #[error("Failed to deserialize request body: {message}")]
    MalformedDocument {
        message: String,
        #[source]
        source: Option<Cause>,
    },

    /// The document parsed but carries no primary data.
    #[error("Failed to deserialize document as json:api: {0}")]
    UnprocessableDocument(String),

    #[error("This API does not contain a json:api resource named '{type_name}'. {detail}")]
    UnknownResourceType { type_name: String, detail: String },

    #[error("{resource_type} does not contain a relationship '{relationship}'")]
    UnknownRelationship {
        resource_type: String,
        relationship: String,
    },

    #[error(
        "Cannot set required relationship identifier '{foreign_key}' to null because it is a non-nullable type"
    )]
    InvalidNullRelationship { foreign_key: String },

    #[error(
        "A compound document MUST NOT include more than one resource object for each type and id pair. \
         The duplicate pair was '{type_name}, {id}'"
    )]
    DuplicateIncludedResource { type_name: String, id: String },

    #[error("Could not convert {raw} to {target}")]
    TypeConversionFailed {
        raw: String,
        target: String,
        #[source]
        source: Option<Cause>,
    },
}

impl BindError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BindError::MalformedDocument { .. } => ErrorKind::MalformedDocument,
            BindError::UnprocessableDocument(_) => ErrorKind::UnprocessableDocument,
            BindError::UnknownResourceType { .. } => ErrorKind::UnknownResourceType,
            BindError::UnknownRelationship { .. } => ErrorKind::UnknownRelationship,
            BindError::InvalidNullRelationship { .. } => ErrorKind::InvalidNullRelationship,
            BindError::DuplicateIncludedResource { .. } => ErrorKind::DuplicateIncludedResource,
            BindError::TypeConversionFailed { .. } => ErrorKind::TypeConversionFailed,
        }
    }

    /// HTTP status equivalent for this error
    pub fn status(&self) -> u16 {
        status_code(self.kind())
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        BindError::MalformedDocument {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn malformed_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        BindError::MalformedDocument {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn unregistered(type_name: impl Into<String>) -> Self {
        BindError::UnknownResourceType {
            type_name: type_name.into(),
            detail: "This resource is not registered on the resource graph. \
                     Check that the resource type was added with the expected public name."
                .to_string(),
        }
    }

    /// Conversion failure for a raw wire value; the value is rendered as JSON.
    pub(crate) fn conversion(raw: &serde_json::Value, target: impl Into<String>) -> Self {
        BindError::TypeConversionFailed {
            raw: raw.to_string(),
            target: target.into(),
            source: None,
        }
    }

    pub(crate) fn conversion_with(
        raw: &serde_json::Value,
        target: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        BindError::TypeConversionFailed {
            raw: raw.to_string(),
            target: target.into(),
            source: Some(Box::new(source)),
        }
    }
}

pub fn status_code(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::UnprocessableDocument => 422,
        ErrorKind::MalformedDocument
        | ErrorKind::UnknownResourceType
        | ErrorKind::UnknownRelationship
        | ErrorKind::InvalidNullRelationship
        | ErrorKind::DuplicateIncludedResource
        | ErrorKind::TypeConversionFailed => 400,
    }
}

pub type Result<T> = std::result::Result<T, BindError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_mapping_is_stable() {
        let cases = [
            (ErrorKind::MalformedDocument, 400),
            (ErrorKind::UnprocessableDocument, 422),
            (ErrorKind::UnknownResourceType, 400),
            (ErrorKind::UnknownRelationship, 400),
            (ErrorKind::InvalidNullRelationship, 400),
            (ErrorKind::DuplicateIncludedResource, 400),
            (ErrorKind::TypeConversionFailed, 400),
        ];

        for (kind, code) in cases {
            assert_eq!(status_code(kind), code);
        }
    }

    #[test]
    fn test_messages_name_offending_input() {
        let err = BindError::unregistered("widgets");
        assert_eq!(err.kind(), ErrorKind::UnknownResourceType);
        assert!(err.to_string().contains("'widgets'"));

        let err = BindError::DuplicateIncludedResource {
            type_name: "people".to_string(),
            id: "9".to_string(),
        };
        assert!(err.to_string().contains("'people, 9'"));

        let err = BindError::conversion(&json!("abc"), "i32");
        assert_eq!(err.to_string(), "Could not convert \"abc\" to i32");
    }

    #[test]
    fn test_nested_cause_is_exposed() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = BindError::malformed_with("invalid json", parse_err);
        assert_eq!(err.status(), 400);
        assert!(std::error::Error::source(&err).is_some());
    }
}
