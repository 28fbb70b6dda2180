//! SeaORM Entity for call_requests table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Video-call request lifecycle. Admin-gated at each advance:
/// pending -> approved -> scheduled -> completed, with rejection possible
/// from pending only. `Rejected` and `Completed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(12))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum CallStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
        }
    }

    /// The single status an admin may advance this one to, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Approved),
            Self::Approved => Some(Self::Scheduled),
            Self::Scheduled => Some(Self::Completed),
            Self::Rejected | Self::Completed => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "call_requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub requester_id: i32,
    /// Role the requester wants to speak with (e.g. "mentor", "admin").
    pub target_role: String,
    /// Specific counterparty once one is attached by an admin.
    pub target_user_id: Option<i32>,
    pub topic: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub proposed_date: DateTime,
    pub status: CallStatus,
    pub reviewer_id: Option<i32>,
    pub admin_note: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::RequesterId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Requester,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ReviewerId",
        to = "super::users::Column::Id"
    )]
    Reviewer,
}

impl ActiveModelBehavior for ActiveModel {}
