use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while validating or resolving requests locally,
/// before anything is sent upstream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid entity id '{0}': expected <domain>.<name>")]
    InvalidEntityId(String),

    #[error("unknown component type '{0}': expected automation, script, scene or dashboard")]
    UnknownComponentKind(String),

    #[error("object_id must not be empty")]
    EmptyObjectId,

    #[error("object_id '{0}' must not be '.' or '..' nor contain '/', '\\', '?', '#' or '%'")]
    InvalidObjectId(String),

    #[error("configuration for {0} must be a JSON object")]
    ConfigNotObject(String),

    #[error("no attributes given for {0}")]
    EmptyAttributes(String),

    #[error("attribute '{attribute}' is not supported by {operation}")]
    UnsupportedAttribute { attribute: String, operation: String },

    #[error("unknown dashboard action '{0}': expected create, update, delete or get")]
    UnknownDashboardAction(String),

    #[error("dashboard {action} requires {field}")]
    MissingDashboardField {
        action: &'static str,
        field: &'static str,
    },
}
