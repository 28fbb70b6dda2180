use crate::orm::users;
use crate::orm::users::{Role, VerificationStatus};
use sea_orm::{entity::*, query::*, DatabaseConnection};
use serde::Serialize;

/// A struct to hold all client-visible information for a user.
///
/// Deliberately excludes the password hash and lockout bookkeeping so a
/// Profile can be serialized straight into API responses.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: i32,
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub verification_status: VerificationStatus,
    pub created_at: chrono::NaiveDateTime,
}

impl From<users::Model> for Profile {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            role: user.role,
            verification_status: user.verification_status,
            created_at: user.created_at,
        }
    }
}

impl Profile {
    /// Returns a full user profile by id.
    pub async fn get_by_id(
        db: &DatabaseConnection,
        id: i32,
    ) -> Result<Option<Self>, sea_orm::DbErr> {
        Ok(users::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(Self::from))
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// True once the founder document gate is resolved in the founder's
    /// favor. Non-founders trivially pass.
    pub fn is_verified_founder(&self) -> bool {
        self.role == Role::Founder && self.verification_status == VerificationStatus::Approved
    }
}

pub async fn get_user_id_from_username(db: &DatabaseConnection, username: &str) -> Option<i32> {
    users::Entity::find()
        .filter(users::Column::Username.eq(username.to_lowercase()))
        .one(db)
        .await
        .unwrap_or(None)
        .map(|user| user.id)
}
