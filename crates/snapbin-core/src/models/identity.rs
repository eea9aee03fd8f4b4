//! Client identity, resolved once at the request boundary and passed down
//! explicitly. Ownership of assets and short links is always scoped to an
//! identity, nullable for anonymous clients.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    User(String),
    Admin,
}

impl Identity {
    /// Owner id recorded on assets and short links created by this identity.
    pub fn owner(&self) -> Option<&str> {
        match self {
            Identity::User(id) => Some(id),
            Identity::Anonymous | Identity::Admin => None,
        }
    }

    /// Whether this identity may modify a record with the given owner.
    /// Anonymous-owned records are only modifiable by an admin.
    pub fn can_modify(&self, record_owner: Option<&str>) -> bool {
        match self {
            Identity::Admin => true,
            Identity::User(id) => record_owner == Some(id.as_str()),
            Identity::Anonymous => false,
        }
    }

    /// Short label recorded in audit entries.
    pub fn audit_label(&self) -> String {
        match self {
            Identity::Anonymous => "anonymous".to_string(),
            Identity::User(id) => format!("user:{id}"),
            Identity::Admin => "admin".to_string(),
        }
    }
}
