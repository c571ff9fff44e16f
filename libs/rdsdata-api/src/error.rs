use crate::wire::WireField;

/// Boxed cause attached to [`MappingError::CannotCreateInstance`] and
/// [`MappingError::CannotSetValue`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every way mapping between native values and wire fields can fail.
///
/// Variants are terminal: nothing in this crate retries or recovers from them,
/// except the `ignore_missing_setters` opt-out which suppresses
/// `NoFieldOrSetter` during property population.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("Unknown parameter type: {type_name}")]
    UnsupportedParameterType { type_name: String },

    #[error("Cannot convert field {field} to type {target}")]
    CannotConvert { field: String, target: String },

    #[error("Class '{type_name}' does not contain field '{field}' or a corresponding setter")]
    NoFieldOrSetter { type_name: String, field: String },

    #[error("Field '{field}' in class {type_name} is static")]
    StaticField { type_name: String, field: String },

    #[error("Cannot access field '{field}' in class {type_name}")]
    CannotAccessField { type_name: String, field: String },

    #[error("Ambiguous setter for field '{field}': {}", .candidates.join(", "))]
    AmbiguousSetter { field: String, candidates: Vec<String> },

    #[error("Cannot create instance of type {type_name}")]
    CannotCreateInstance {
        type_name: String,
        #[source]
        source: BoxError,
    },

    /// A setter accepted the decoded value's type but rejected the value.
    #[error("Cannot set value '{field}'")]
    CannotSetValue {
        field: String,
        #[source]
        source: BoxError,
    },

    #[error("Cannot create instance of type {type_name}: public no args constructor not found")]
    CannotCreateInstanceViaNoArgsConstructor { type_name: String },

    #[error("Void return type is not supported")]
    VoidReturnTypeNotSupported { method: String },

    #[error("Cannot find field or getter corresponding to placeholder '{field}' in object '{object}'")]
    FieldNotFound { field: String, object: String },

    #[error("No variant '{name}' in enum {type_name}")]
    UnknownEnumVariant { type_name: String, name: String },

    #[error("Result set is empty")]
    EmptyResultSet,
}

impl MappingError {
    pub fn cannot_convert(field: &WireField, target: impl Into<String>) -> Self {
        MappingError::CannotConvert {
            field: field.to_string(),
            target: target.into(),
        }
    }

    /// Wraps a constructor failure for type `T`.
    pub fn cannot_create_instance<T>(cause: impl Into<BoxError>) -> Self {
        MappingError::CannotCreateInstance {
            type_name: std::any::type_name::<T>().to_string(),
            source: cause.into(),
        }
    }

    pub fn cannot_set_value(field: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        MappingError::CannotSetValue {
            field: field.into(),
            source: cause.into(),
        }
    }

    /// `true` for failures caused by how the target type is shaped
    /// (missing, static, ambiguous or inaccessible members, constructors).
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(
            self,
            MappingError::NoFieldOrSetter { .. }
                | MappingError::StaticField { .. }
                | MappingError::CannotAccessField { .. }
                | MappingError::AmbiguousSetter { .. }
                | MappingError::CannotCreateInstance { .. }
                | MappingError::CannotCreateInstanceViaNoArgsConstructor { .. }
                | MappingError::VoidReturnTypeNotSupported { .. }
                | MappingError::FieldNotFound { .. }
        )
    }
}

/// Raised by [`ResultSet::single_value`](crate::result::ResultSet::single_value)
/// when there is no first row, or the first row has no columns.
///
/// Kept apart from [`MappingError`]: it reports result cardinality, not a
/// mapping defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Result set is empty or has no columns")]
pub struct EmptyResultSetError;

#[derive(Debug, thiserror::Error)]
pub enum SingleValueError {
    #[error(transparent)]
    Empty(#[from] EmptyResultSetError),

    #[error(transparent)]
    Mapping(#[from] MappingError),
}
