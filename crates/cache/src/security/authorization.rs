//! Authorization of registry mutations

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Registry operations that change state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryOperation {
    Create,
    Update,
    Delete,
    DeleteAll,
    /// Removal of an expired slot found while listing
    Expire,
}

impl RegistryOperation {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::DeleteAll => "delete_all",
            Self::Expire => "expire",
        }
    }
}

impl fmt::Display for RegistryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a call originates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerSource {
    Cli,
    Web,
    /// The registry acting on its own behalf (self-healing expiry)
    System,
}

/// Identity of the caller as seen by the authorizer and the audit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    pub principal: String,
    pub source: CallerSource,
}

impl CallerContext {
    pub fn cli(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            source: CallerSource::Cli,
        }
    }

    pub fn web(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            source: CallerSource::Web,
        }
    }

    pub fn system() -> Self {
        Self {
            principal: "system".to_string(),
            source: CallerSource::System,
        }
    }
}

/// Authorization result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Allowed,
    Denied(String),
}

impl Authorization {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Authorization::Allowed)
    }
}

/// Policy deciding whether a caller may perform a mutation
pub trait Authorizer: Send + Sync {
    fn authorize(&self, operation: RegistryOperation, ctx: &CallerContext) -> Authorization;
}

/// Allows everything; for trusted single-user hosts and tests
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _operation: RegistryOperation, _ctx: &CallerContext) -> Authorization {
        Authorization::Allowed
    }
}

/// Denies every mutation except housekeeping done by the registry itself
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnly;

impl Authorizer for ReadOnly {
    fn authorize(&self, operation: RegistryOperation, ctx: &CallerContext) -> Authorization {
        if ctx.source == CallerSource::System && operation == RegistryOperation::Expire {
            Authorization::Allowed
        } else {
            Authorization::Denied(format!("registry is read-only, {operation} is not allowed"))
        }
    }
}

/// Allows a fixed set of operations, optionally only for listed principals
#[derive(Debug, Clone, Default)]
pub struct OperationAllowList {
    operations: HashSet<RegistryOperation>,
    principals: Option<HashSet<String>>,
}

impl OperationAllowList {
    pub fn new(operations: impl IntoIterator<Item = RegistryOperation>) -> Self {
        Self {
            operations: operations.into_iter().collect(),
            principals: None,
        }
    }

    /// Restrict the allowed operations to these principals
    #[must_use]
    pub fn for_principals(
        mut self,
        principals: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.principals = Some(principals.into_iter().map(Into::into).collect());
        self
    }
}

impl Authorizer for OperationAllowList {
    fn authorize(&self, operation: RegistryOperation, ctx: &CallerContext) -> Authorization {
        if !self.operations.contains(&operation) {
            return Authorization::Denied(format!("{operation} is not permitted"));
        }
        match &self.principals {
            Some(principals) if !principals.contains(&ctx.principal) => Authorization::Denied(
                format!("'{}' may not perform {operation}", ctx.principal),
            ),
            _ => Authorization::Allowed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_allows_only_system_expiry() {
        let policy = ReadOnly;
        assert!(policy
            .authorize(RegistryOperation::Expire, &CallerContext::system())
            .is_allowed());
        assert!(!policy
            .authorize(RegistryOperation::Expire, &CallerContext::cli("ops"))
            .is_allowed());
        assert!(!policy
            .authorize(RegistryOperation::Create, &CallerContext::system())
            .is_allowed());
    }

    #[test]
    fn test_allow_list_checks_operation_and_principal() {
        let policy =
            OperationAllowList::new([RegistryOperation::Create, RegistryOperation::Update])
                .for_principals(["alice"]);

        assert!(policy
            .authorize(RegistryOperation::Create, &CallerContext::web("alice"))
            .is_allowed());
        assert_eq!(
            policy.authorize(RegistryOperation::Create, &CallerContext::web("bob")),
            Authorization::Denied("'bob' may not perform create".to_string())
        );
        assert!(!policy
            .authorize(RegistryOperation::DeleteAll, &CallerContext::web("alice"))
            .is_allowed());
    }
}
