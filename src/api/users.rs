use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::HeaderMap,
};
use std::sync::Arc;

use super::auth::{optional_caller, require_caller};
use super::context::RequestContext;
use super::error::AppError;
use super::types::{
    CreateUserRequest, GenericMessage, PageDto, PageQuery, ResendActivationRequest,
    UpdateUserRequest, UserDto,
};
use super::validation;
use super::AppState;
use crate::domain::FieldErrors;
use crate::i18n::Message;

fn malformed(field: &'static str) -> FieldErrors {
    FieldErrors::single(field, Message::MalformedRequest)
}

/// `POST /api/v1/users`
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<GenericMessage>, AppError> {
    let Json(request) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected registration body");
        ctx.fail(malformed("body"))
    })?;
    let registration = validation::validate_create_user(request).map_err(|e| ctx.fail(e))?;

    state
        .registration
        .register(registration)
        .await
        .map_err(|e| ctx.fail(e))?;

    Ok(Json(GenericMessage::new(
        Message::UserCreated.resolve(ctx.locale),
    )))
}

/// `PATCH /api/v1/users/{id}/active`
///
/// The segment carries the activation token.
pub async fn activate_user(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(token): Path<String>,
) -> Result<Json<GenericMessage>, AppError> {
    state
        .activation
        .activate(&token)
        .await
        .map_err(|e| ctx.fail(e))?;

    Ok(Json(GenericMessage::new(
        Message::UserActivated.resolve(ctx.locale),
    )))
}

/// `GET /api/v1/userList`
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    headers: HeaderMap,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<PageDto<UserDto>>, AppError> {
    let Query(query) = query.map_err(|_| ctx.fail(malformed("query")))?;
    let request = validation::validate_page(&query).map_err(|e| ctx.fail(e))?;

    let caller = optional_caller(&state, &headers)
        .await
        .map_err(|e| ctx.fail(e))?;

    let page = state
        .users
        .list_users(request, caller.map(|user| user.id))
        .await
        .map_err(|e| ctx.fail(e))?;

    Ok(Json(page.into()))
}

/// `GET /api/v1/users/{id}`
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<UserDto>, AppError> {
    let id = validation::parse_user_id(&id).map_err(|e| ctx.fail(e))?;
    let user = state.users.get_user(id).await.map_err(|e| ctx.fail(e))?;
    Ok(Json(user.into()))
}

/// `PUT /api/v1/users/{id}`
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserDto>, AppError> {
    let caller = require_caller(&state, &headers)
        .await
        .map_err(|e| ctx.fail(e))?;

    let id = validation::parse_user_id(&id).map_err(|e| ctx.fail(e))?;
    let Json(request) = body.map_err(|_| ctx.fail(malformed("body")))?;
    let username = validation::validate_update_user(request).map_err(|e| ctx.fail(e))?;

    let user = state
        .users
        .update_username(&caller, id, &username)
        .await
        .map_err(|e| ctx.fail(e))?;

    Ok(Json(user.into()))
}

/// `POST /api/v1/activation-emails`
pub async fn resend_activation(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    body: Result<Json<ResendActivationRequest>, JsonRejection>,
) -> Result<Json<GenericMessage>, AppError> {
    let Json(request) = body.map_err(|_| ctx.fail(malformed("body")))?;
    let email = validation::validate_email(request.email).map_err(|e| ctx.fail(e))?;

    state
        .registration
        .resend_activation(&email)
        .await
        .map_err(|e| ctx.fail(e))?;

    Ok(Json(GenericMessage::new(
        Message::ActivationResent.resolve(ctx.locale),
    )))
}
