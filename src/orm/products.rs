//! SeaORM Entity for products table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product listing lifecycle.
///
/// `Draft` is founder-private; submission for review requires the founder to
/// have passed the verification gate. Only `Approved` listings surface in
/// the investor catalog. Rejected listings are kept (editable and
/// resubmittable), never deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum ProductStatus {
    #[sea_orm(string_value = "draft")]
    #[default]
    Draft,
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub founder_id: i32,
    pub name: String,
    pub category: String,
    /// One-line pitch shown in the catalog.
    pub summary: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub business_model: Option<String>,
    pub pricing: Option<String>,
    /// Comma-separated display tags. Not queried server-side.
    pub tags: Option<String>,
    pub benefits: Option<String>,
    pub status: ProductStatus,
    /// Number of investor queries ever opened against this listing.
    pub interest_count: i32,
    pub reviewer_id: Option<i32>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::FounderId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Founder,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ReviewerId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Reviewer,
    #[sea_orm(has_many = "super::queries::Entity")]
    Queries,
}

impl Related<super::queries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Queries.def()
    }
}

// Founder is the canonical user relation; the reviewer link stays join-only.
impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Founder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
