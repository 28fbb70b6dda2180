//! SeaORM Entity for queries table (investor-founder mediation records)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Mediation lifecycle for one investor question thread.
///
/// Every transition handler checks the current status as its precondition;
/// the column is the single source of truth, so a stale or duplicate request
/// fails with a conflict instead of overwriting an approved hop.
/// `DeliveredToInvestor` and `Rejected` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    /// Investor question submitted, waiting on an admin to filter it.
    #[sea_orm(string_value = "pending_admin_review")]
    PendingAdminReview,
    /// Admin approved the investor side; founder may now respond.
    #[sea_orm(string_value = "forwarded_to_founder")]
    ForwardedToFounder,
    /// Founder replied, waiting on an admin to filter the reply.
    #[sea_orm(string_value = "pending_response_review")]
    PendingResponseReview,
    /// Admin approved the founder side; investor sees the reply. Terminal.
    #[sea_orm(string_value = "delivered_to_investor")]
    DeliveredToInvestor,
    /// Admin rejected at a review point. Terminal.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingAdminReview => "pending_admin_review",
            Self::ForwardedToFounder => "forwarded_to_founder",
            Self::PendingResponseReview => "pending_response_review",
            Self::DeliveredToInvestor => "delivered_to_investor",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "queries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub product_id: i32,
    pub investor_id: i32,
    pub founder_id: i32,
    /// One of `mediation::PRIMARY_INTENTS`, or "Other".
    pub primary_intent: String,
    /// Free text accompanying an "Other" intent.
    pub intent_detail: Option<String>,
    /// Raw investor question. Never exposed to the founder.
    #[sea_orm(column_type = "Text")]
    pub original_question: String,
    /// Admin-filtered question, the only investor-side text a founder sees.
    #[sea_orm(column_type = "Text", nullable)]
    pub approved_question: Option<String>,
    /// Raw founder reply. Never exposed to the investor.
    #[sea_orm(column_type = "Text", nullable)]
    pub original_response: Option<String>,
    /// Admin-filtered reply, the only founder-side text an investor sees.
    #[sea_orm(column_type = "Text", nullable)]
    pub approved_response: Option<String>,
    pub status: QueryStatus,
    /// Admin who performed the most recent review action.
    pub reviewer_id: Option<i32>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub question_approved_at: Option<DateTime>,
    pub responded_at: Option<DateTime>,
    pub response_approved_at: Option<DateTime>,
    pub rejected_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::InvestorId",
        to = "super::users::Column::Id"
    )]
    Investor,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::FounderId",
        to = "super::users::Column::Id"
    )]
    Founder,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ReviewerId",
        to = "super::users::Column::Id"
    )]
    Reviewer,
    #[sea_orm(has_many = "super::query_topics::Entity")]
    Topics,
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::query_topics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Topics.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
