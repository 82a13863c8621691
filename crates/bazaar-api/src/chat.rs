use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use bazaar_types::api::{
    ChatMessageResponse, ChatResponse, ChatsResponse, Claims, OpenChatRequest,
    SendChatMessageRequest,
};

use crate::error::ApiError;
use crate::run_blocking;
use crate::state::AppState;

/// GET /chat
pub async fn list_chats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ChatsResponse>, ApiError> {
    let chats = run_blocking(move || state.chats.list(claims.sub)).await?;
    Ok(Json(ChatsResponse { chats }))
}

/// POST /chat. The caller is the buyer.
pub async fn open_chat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<OpenChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload?;
    let chat = run_blocking(move || state.chats.open(req.seller_id, claims.sub)).await?;
    Ok(Json(ChatResponse { chat }))
}

/// GET /chat/{chat_id}, with the full message history oldest first.
pub async fn get_chat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(chat_id): Path<String>,
) -> Result<Json<ChatResponse>, ApiError> {
    let chat = run_blocking(move || state.chats.get(&chat_id, claims.sub)).await?;
    Ok(Json(ChatResponse { chat }))
}

/// POST /chat/{chat_id}/messages
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(chat_id): Path<String>,
    payload: Result<Json<SendChatMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let message =
        run_blocking(move || state.chats.send(&chat_id, claims.sub, &req.message)).await?;
    Ok((StatusCode::CREATED, Json(ChatMessageResponse { message })))
}
