use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::{
    api::{
        dto::{CreatedResponse, CredentialsRequest, UserResponse},
        errors::AppError,
        extract::{AppJson, AppPath},
    },
    users::{UserPatch, UserService},
};

#[utoipa::path(
    post,
    path = "/api/user",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User created", body = CreatedResponse),
        (status = 400, description = "Username or password missing"),
        (status = 409, description = "Username already exists"),
    ),
    tag = "users"
)]
pub async fn create_user(
    State(users): State<UserService>,
    AppJson(body): AppJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let username = body.username.clone().unwrap_or_default();
    let id = users.create(body.username, body.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id,
            message: format!("User {username} created successfully."),
        }),
    ))
}

/// Check credentials and return the user's id.
#[utoipa::path(
    post,
    path = "/api/user/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login successful", body = UserResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Login failed"),
    ),
    tag = "users"
)]
pub async fn login(
    State(users): State<UserService>,
    AppJson(body): AppJson<CredentialsRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user_id = users.login(body.username, body.password).await?;
    Ok(Json(UserResponse {
        message: "Login successful".into(),
        user_id,
    }))
}

#[utoipa::path(
    patch,
    path = "/api/user/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "No fields supplied"),
        (status = 404, description = "No such user"),
        (status = 409, description = "Username already exists"),
    ),
    tag = "users"
)]
pub async fn update_user(
    State(users): State<UserService>,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<CredentialsRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let patch = UserPatch {
        username: body.username,
        password: body.password,
    };
    let user_id = users.update(id, patch).await?;

    Ok(Json(UserResponse {
        message: "User updated successfully.".into(),
        user_id,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/user/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = UserResponse),
        (status = 404, description = "No such user"),
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(users): State<UserService>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user_id = users.delete(id).await?;
    Ok(Json(UserResponse {
        message: "User deleted successfully.".into(),
        user_id,
    }))
}
