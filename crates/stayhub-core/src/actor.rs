//! # Actors and Capabilities
//!
//! Every mutating manager call receives an [`Actor`]: the authenticated staff
//! member plus the request metadata that goes into the audit log.
//!
//! ```text
//! Capability          admin manager receptionist accountant others
//! ─────────────────── ───── ─────── ──────────── ────────── ──────
//! FrontDesk             ✓      ✓         ✓
//! PaymentStatus         ✓      ✓         ✓           ✓
//! RateOverride          ✓
//! ReviewModification    ✓
//! ViewHistory           ✓      ✓                     ✓
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};

// =============================================================================
// Role
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Receptionist,
    Accountant,
    Maintenance,
    Restaurant,
    Storekeeper,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Receptionist => "receptionist",
            Role::Accountant => "accountant",
            Role::Maintenance => "maintenance",
            Role::Restaurant => "restaurant",
            Role::Storekeeper => "storekeeper",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "receptionist" => Ok(Role::Receptionist),
            "accountant" => Ok(Role::Accountant),
            "maintenance" => Ok(Role::Maintenance),
            "restaurant" => Ok(Role::Restaurant),
            "storekeeper" => Ok(Role::Storekeeper),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: [
                    "admin",
                    "manager",
                    "receptionist",
                    "accountant",
                    "maintenance",
                    "restaurant",
                    "storekeeper",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            }),
        }
    }
}

// =============================================================================
// Capability
// =============================================================================

/// What an actor is trying to do, at the granularity roles are granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Create, confirm, cancel, assign, check in and check out.
    FrontDesk,
    PaymentStatus,
    /// Apply, confirm and reverse rate overrides.
    RateOverride,
    ReviewModification,
    ViewHistory,
}

impl Capability {
    fn description(&self) -> &'static str {
        match self {
            Capability::FrontDesk => "perform front desk operations",
            Capability::PaymentStatus => "update payment status",
            Capability::RateOverride => "override booking rates",
            Capability::ReviewModification => "review booking modifications",
            Capability::ViewHistory => "view audit history",
        }
    }
}

impl Role {
    pub fn can(&self, capability: Capability) -> bool {
        use Capability::*;
        use Role::*;
        match capability {
            FrontDesk => matches!(self, Admin | Manager | Receptionist),
            PaymentStatus => matches!(self, Admin | Manager | Receptionist | Accountant),
            RateOverride | ReviewModification => matches!(self, Admin),
            ViewHistory => matches!(self, Admin | Manager | Accountant),
        }
    }
}

// =============================================================================
// Actor
// =============================================================================

/// The authenticated caller of a manager operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Actor {
            id: id.into(),
            role,
            ip_address: None,
            user_agent: None,
        }
    }

    /// Attaches request metadata recorded in the audit log.
    pub fn with_request(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails with `Forbidden` unless the actor's role grants `capability`.
    pub fn require(&self, capability: Capability) -> CoreResult<()> {
        if self.role.can(capability) {
            Ok(())
        } else {
            Err(CoreError::Forbidden {
                role: self.role.to_string(),
                operation: capability.description(),
            })
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_front_desk_roles() {
        assert!(Role::Receptionist.can(Capability::FrontDesk));
        assert!(Role::Manager.can(Capability::FrontDesk));
        assert!(!Role::Accountant.can(Capability::FrontDesk));
        assert!(!Role::Maintenance.can(Capability::FrontDesk));
    }

    #[test]
    fn test_override_is_admin_only() {
        for role in [Role::Manager, Role::Receptionist, Role::Accountant] {
            assert!(!role.can(Capability::RateOverride));
        }
        assert!(Role::Admin.can(Capability::RateOverride));
    }

    #[test]
    fn test_require_returns_forbidden() {
        let actor = Actor::new("staff-1", Role::Receptionist);
        let err = actor.require(Capability::RateOverride).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.to_string(), "receptionist is not allowed to override booking rates");
        assert!(actor.require(Capability::FrontDesk).is_ok());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("storekeeper".parse::<Role>().unwrap(), Role::Storekeeper);
        assert!("guest".parse::<Role>().is_err());
    }
}
