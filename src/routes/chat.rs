use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
};

use crate::{
    error::AppError,
    message::{ChatReply, ChatRequest},
    services::relay::{read_form, relay},
    state::SharedState,
};

pub async fn chat_handler(
    State(state): State<SharedState>,
    form: Result<Multipart, MultipartRejection>,
) -> Result<Json<ChatReply>, AppError> {
    // A body that is not a multipart form carries neither field.
    let request = match form {
        Ok(multipart) => read_form(multipart).await?,
        Err(rejection) => {
            tracing::debug!(%rejection, "chat request is not multipart/form-data");
            ChatRequest::default()
        }
    };

    let reply = relay(state.provider.as_ref(), &state.models, request).await?;
    Ok(Json(reply))
}

pub async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
