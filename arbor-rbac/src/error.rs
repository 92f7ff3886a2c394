//! Error types for authorization workflows

use thiserror::Error;

use crate::config::ConfigError;

/// Result type for authorization operations
pub type RbacResult<T> = Result<T, RbacError>;

/// Authorization errors
///
/// Workflow errors carry no context beyond their kind; callers match on the
/// variant, never on the message text.
#[derive(Error, Debug)]
pub enum RbacError {
    /// An entry identity was zero where one is required
    #[error("empty id")]
    EmptyId,

    #[error("already exists")]
    AlreadyExists,

    #[error("not exists")]
    NotExists,

    #[error("no read permission")]
    NoReadPermission,

    #[error("no write permission")]
    NoWritePermission,

    #[error("is not superadmin")]
    NotSuperadmin,

    #[error("superadmin is not enabled")]
    SuperadminNotEnabled,

    /// Root entries (parent id 0) can only be changed by a superadmin
    #[error("can not operate root object without superadmin")]
    CannotOperateRootWithoutSuperadmin,

    /// The current-context provider could not resolve (user, domain)
    #[error("provider can't get current status")]
    ProviderGet,

    #[error("invalid object")]
    InvalidObject,

    #[error("invalid object type")]
    InvalidObjectType,

    /// Reparenting would make an entry its own ancestor
    #[error("circular hierarchy")]
    CircularHierarchy,

    #[error("domain creator is nil")]
    InitializationNilDomainCreator,

    #[error("enforcer is nil")]
    InitializationNilEnforcer,

    #[error("entry factory is nil")]
    InitializationNilEntryFactory,

    #[error("metadata store is nil")]
    InitializationNilMetadataStore,

    #[error("input user role pair array are not belong to same user")]
    InputArrayNotBelongSameUser,

    #[error("input user role pair array are not belong to same role")]
    InputArrayNotBelongSameRole,

    #[error("input policy array are not belong to same role")]
    InputPolicyListNotBelongSameRole,

    #[error("input policy array are not belong to same object")]
    InputPolicyListNotBelongSameObject,

    /// An engine string could not be decoded into an entry
    #[error("can not decode entry: {value}")]
    Decode { value: String },

    /// Metadata store failure
    #[error("Store error: {message}")]
    Store { message: String },

    /// Casbin operation failed
    #[error("Casbin error: {0}")]
    Casbin(#[from] casbin::Error),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl RbacError {
    /// Create a new store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a new decode error
    pub fn decode(value: impl Into<String>) -> Self {
        Self::Decode {
            value: value.into(),
        }
    }

    /// Check if this is a permission denied error
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::NoReadPermission | Self::NoWritePermission)
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotExists | Self::InvalidObject)
    }

    /// Check if this error comes from superadmin gating
    pub fn is_superadmin_error(&self) -> bool {
        matches!(
            self,
            Self::NotSuperadmin
                | Self::SuperadminNotEnabled
                | Self::CannotOperateRootWithoutSuperadmin
        )
    }
}
