use crate::{
    db::DbPool,
    entities::{
        enums::UserType,
        user::{self, Entity as UserEntity},
    },
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{EntityTrait, PaginatorTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Public view of a user, as returned by `GET /api/users/:userId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
    pub user_type: UserType,
}

impl From<user::Model> for UserProfile {
    fn from(model: user::Model) -> Self {
        Self {
            username: model.full_name(),
            user_id: model.user_id,
            email: model.email,
            user_type: model.user_type,
        }
    }
}

/// Row of the employee-facing user list.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
    pub is_active: bool,
    pub is_admin: bool,
    pub customer_id: Option<Uuid>,
    pub last_login: Option<DateTime<Utc>>,
    pub login_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserSummary {
    fn from(m: user::Model) -> Self {
        Self {
            user_id: m.user_id,
            email: m.email,
            first_name: m.first_name,
            last_name: m.last_name,
            user_type: m.user_type,
            is_active: m.is_active,
            is_admin: m.is_admin,
            customer_id: m.customer_id,
            last_login: m.last_login,
            login_count: m.login_count,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub users: Vec<UserSummary>,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
}

#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: Uuid) -> Result<UserProfile, ServiceError> {
        UserEntity::find_by_id(user_id)
            .one(&*self.db_pool)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| ServiceError::not_found("User"))
    }

    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        query: UserListQuery,
        default_limit: u64,
        max_limit: u64,
    ) -> Result<UserPage, ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(default_limit).clamp(1, max_limit.max(1));

        let paginator = UserEntity::find()
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Email)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let users = paginator.fetch_page(page - 1).await?;

        Ok(UserPage {
            users: users.into_iter().map(UserSummary::from).collect(),
            total,
            page,
            total_pages: total.div_ceil(limit),
        })
    }
}
