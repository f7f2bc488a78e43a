//! User and role models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user account, always bound to exactly one organization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub country: String,
    pub currency: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role of a user within their organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "VARCHAR", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Admin,
    Manager,
}

/// Operations that are restricted to some roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Delete categories, items, suppliers and orders
    DeleteRecords,
    /// Read any financial or inventory report
    ViewReports,
    ListOrganizations,
    /// Add users to the organization and list them
    ManageUsers,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::DeleteRecords,
        Capability::ViewReports,
        Capability::ListOrganizations,
        Capability::ManageUsers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::DeleteRecords => "delete_records",
            Capability::ViewReports => "view_reports",
            Capability::ListOrganizations => "list_organizations",
            Capability::ManageUsers => "manage_users",
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            _ => None,
        }
    }

    /// Whether this role grants the capability
    pub fn can(&self, capability: Capability) -> bool {
        match self {
            Role::Admin => true,
            Role::Manager => match capability {
                Capability::DeleteRecords
                | Capability::ViewReports
                | Capability::ListOrganizations
                | Capability::ManageUsers => false,
            },
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_every_capability() {
        for cap in Capability::ALL {
            assert!(Role::Admin.can(cap), "admin lacks {}", cap.as_str());
        }
    }

    #[test]
    fn manager_has_no_restricted_capability() {
        for cap in Capability::ALL {
            assert!(!Role::Manager.can(cap), "manager has {}", cap.as_str());
        }
    }

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!(Role::from_str("admin"), Some(Role::Admin));
        assert_eq!(Role::from_str("manager"), Some(Role::Manager));
        assert_eq!(Role::from_str("Admin"), None);
        assert_eq!(Role::Manager.to_string(), "manager");
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$2b$12$secret".into(),
            country: "NZ".into(),
            currency: "NZD".into(),
            role: Role::Manager,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "manager");
        assert!(json.get("organizationId").is_some());
    }
}
