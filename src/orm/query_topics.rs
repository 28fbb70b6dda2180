//! SeaORM Entity for query_topics table
//!
//! Topic tags attached to a mediation record, one row per tag. The investor
//! and founder sides keep separate tag sets on the same record, discriminated
//! by `side`. Uniqueness of (query_id, side, topic) gives the sets their
//! duplicates-collapse semantics.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which party's tag set a row belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(10))")]
#[serde(rename_all = "lowercase")]
pub enum TopicSide {
    /// Investor's areas of interest, chosen at submission.
    #[sea_orm(string_value = "interest")]
    Interest,
    /// Founder's selected response topics, chosen when replying.
    #[sea_orm(string_value = "response")]
    Response,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "query_topics")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub query_id: i32,
    pub side: TopicSide,
    pub topic: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::queries::Entity",
        from = "Column::QueryId",
        to = "super::queries::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Query,
}

impl Related<super::queries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Query.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
