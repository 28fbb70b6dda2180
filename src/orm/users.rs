//! SeaORM Entity for users table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role. Single source of truth for authorization decisions.
///
/// The legacy client sends a `userType` field with overlapping values; it is
/// mapped onto this enum at the API boundary and never stored separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(20))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "superadmin")]
    Superadmin,
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "founder")]
    Founder,
    #[sea_orm(string_value = "investor")]
    Investor,
    #[sea_orm(string_value = "organization")]
    Organization,
    #[sea_orm(string_value = "mentor")]
    Mentor,
    #[sea_orm(string_value = "other")]
    Other,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Superadmin => "superadmin",
            Self::Admin => "admin",
            Self::Founder => "founder",
            Self::Investor => "investor",
            Self::Organization => "organization",
            Self::Mentor => "mentor",
            Self::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "superadmin" => Some(Self::Superadmin),
            "admin" => Some(Self::Admin),
            "founder" => Some(Self::Founder),
            "investor" => Some(Self::Investor),
            "organization" => Some(Self::Organization),
            "mentor" => Some(Self::Mentor),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Admins and superadmins mediate all cross-party communication.
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Admin | Self::Superadmin)
    }
}

/// Founder document-verification gate state.
///
/// Meaningful for founders only; other roles stay at `NotSubmitted` and the
/// gate never consults it for them. Advances only via admin review or
/// founder resubmission, never automatically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(24))")]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum VerificationStatus {
    #[sea_orm(string_value = "not_submitted")]
    #[default]
    NotSubmitted,
    #[sea_orm(string_value = "pending_verification")]
    PendingVerification,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotSubmitted => "not_submitted",
            Self::PendingVerification => "pending_verification",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Display name shown once identities are revealed.
    pub name: String,
    /// Unique login handle, stored lowercased.
    #[sea_orm(unique)]
    pub username: String,
    pub email: String,
    /// Argon2id hash.
    pub password: String,
    pub role: Role,
    pub verification_status: VerificationStatus,
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::products::Entity")]
    Products,
    #[sea_orm(has_many = "super::founder_documents::Entity")]
    FounderDocuments,
    #[sea_orm(has_many = "super::sessions::Entity")]
    Sessions,
    #[sea_orm(has_many = "super::notifications::Entity")]
    Notifications,
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::founder_documents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FounderDocuments.def()
    }
}

impl Related<super::sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl Related<super::notifications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
