use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, Statement,
};

use crate::domain::{NewUser, Page, PageRequest, User, UserId};
use crate::entities::users;
use crate::services::user_store::{StoreError, UserStore};

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: UserId::new(model.id),
            username: model.username,
            email: model.email,
            active: model.active,
            activation_token: model.activation_token,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Maps unique-index violations onto the store's typed conflicts.
fn map_insert_error(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) if detail.contains("activation_token") => {
            StoreError::DuplicateToken
        }
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::DuplicateEmail,
        _ => StoreError::from(err),
    }
}

#[derive(Clone)]
pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    /// Create a repository over `conn`
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get the raw row by email (includes the password hash)
    async fn find_model_by_email(&self, email: &str) -> Result<Option<users::Model>, StoreError> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await?;

        Ok(user)
    }
}

#[async_trait]
impl UserStore for UserRepository {
    /// Insert a pending user, mapping unique-index violations
    async fn insert_pending(&self, user: NewUser) -> Result<User, StoreError> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = users::ActiveModel {
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            active: Set(false),
            activation_token: Set(Some(user.activation_token)),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .map_err(map_insert_error)?;

        Ok(User::from(model))
    }

    /// Get user by ID
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let user = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await?;

        Ok(user.map(User::from))
    }

    /// Get user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.find_model_by_email(email).await?.map(User::from))
    }

    /// Get user by email together with the stored password hash
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, StoreError> {
        Ok(self.find_model_by_email(email).await?.map(|u| {
            let password_hash = u.password_hash.clone();
            (User::from(u), password_hash)
        }))
    }

    /// Get the user holding an activation token
    async fn find_by_activation_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let user = users::Entity::find()
            .filter(users::Column::ActivationToken.eq(token))
            .one(&self.conn)
            .await?;

        Ok(user.map(User::from))
    }

    /// Activate the pending user holding `token`, clearing it in the same update
    async fn activate_by_token(&self, token: &str) -> Result<bool, StoreError> {
        let now = chrono::Utc::now().to_rfc3339();

        // The token filter is evaluated at write time, so two concurrent
        // activations cannot both match the row.
        let result = users::Entity::update_many()
            .col_expr(users::Column::Active, Expr::value(true))
            .col_expr(
                users::Column::ActivationToken,
                Expr::value(Option::<String>::None),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::ActivationToken.eq(token))
            .filter(users::Column::Active.eq(false))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// List users by ascending ID, optionally leaving one out
    async fn list(
        &self,
        request: PageRequest,
        exclude: Option<UserId>,
    ) -> Result<Page<User>, StoreError> {
        let mut query = users::Entity::find().order_by_asc(users::Column::Id);
        if let Some(id) = exclude {
            query = query.filter(users::Column::Id.ne(id.value()));
        }

        let paginator = query.paginate(&self.conn, request.size);
        let totals = paginator.num_items_and_pages().await?;
        let models = paginator.fetch_page(request.page).await?;

        Ok(Page {
            content: models.into_iter().map(User::from).collect(),
            page: request.page,
            size: request.size,
            total_elements: totals.number_of_items,
            total_pages: totals.number_of_pages,
        })
    }

    /// Update the display name of a user
    async fn update_username(
        &self,
        id: UserId,
        username: &str,
    ) -> Result<Option<User>, StoreError> {
        let Some(user) = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.username = Set(username.to_string());
        active.updated_at = Set(now);
        let updated = active.update(&self.conn).await?;

        Ok(Some(User::from(updated)))
    }

    /// Check the connection with `SELECT 1`
    async fn ping(&self) -> Result<(), StoreError> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }
}
