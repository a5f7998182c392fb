//! Chat REST routes
//!
//! Thin handlers over [`crate::chat::ChatService`]. Real-time delivery lives
//! in the websocket module; these routes create chats and read history.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use familyflow_shared::{Chat, ChatParticipant, Message};
use serde::{Deserialize, Serialize};

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddParticipantRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateChatWithParticipantsRequest {
    pub name: String,
    pub participant_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCreatedResponse {
    pub chat_id: String,
}

fn require_name(name: &str) -> ApiResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("name is required".to_string()));
    }
    Ok(name)
}

// =============================================================================
// Handlers
// =============================================================================

/// Create an empty chat
pub async fn create_chat(
    State(state): State<AppState>,
    Json(req): Json<CreateChatRequest>,
) -> ApiResult<Json<ChatCreatedResponse>> {
    let name = require_name(&req.name)?;
    let chat_id = state.chat_service.create_chat(name).await?;

    Ok(Json(ChatCreatedResponse { chat_id }))
}

/// Add a user to an existing chat
pub async fn add_participant(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(req): Json<AddParticipantRequest>,
) -> ApiResult<Json<&'static str>> {
    if req.user_id.trim().is_empty() {
        return Err(ApiError::Validation("user_id is required".to_string()));
    }

    state
        .chat_service
        .add_participant(&chat_id, &req.user_id)
        .await?;

    Ok(Json("Participant added successfully"))
}

/// Create a chat with the given participants plus the caller
pub async fn create_chat_with_participants(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(req): Json<CreateChatWithParticipantsRequest>,
) -> ApiResult<Json<ChatCreatedResponse>> {
    let name = require_name(&req.name)?;

    // Repeats would trip the store's uniqueness check halfway through
    let mut participant_ids: Vec<String> = Vec::with_capacity(req.participant_ids.len() + 1);
    for user_id in req.participant_ids.into_iter().chain([auth_user.user_id]) {
        if !participant_ids.contains(&user_id) {
            participant_ids.push(user_id);
        }
    }

    let chat_id = state
        .chat_service
        .create_chat_with_participants(name, &participant_ids)
        .await?;

    Ok(Json(ChatCreatedResponse { chat_id }))
}

/// Chats of the caller, each with its most recent message
pub async fn list_chats_with_last_message(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Chat>>> {
    let chats = state
        .chat_service
        .chats_with_last_message(&auth_user.user_id)
        .await?;

    Ok(Json(chats))
}

/// Chats of the caller with participant lists
pub async fn list_chats_with_participants(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Chat>>> {
    let chats = state
        .chat_service
        .chats_with_participants(&auth_user.user_id)
        .await?;

    Ok(Json(chats))
}

/// Full message history of a chat
pub async fn list_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<Vec<Message>>> {
    let messages = state.chat_service.messages_by_chat(&chat_id).await?;

    tracing::debug!(chat_id = %chat_id, message_count = messages.len(), "Messages retrieved");
    Ok(Json(messages))
}

pub async fn list_participants(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<Vec<ChatParticipant>>> {
    Ok(Json(state.chat_service.participants(&chat_id).await?))
}
