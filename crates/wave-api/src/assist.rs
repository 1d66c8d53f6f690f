use axum::{Extension, Json, extract::State};

use wave_types::api::{
    Claims, SmartRepliesRequest, SmartRepliesResponse, SuggestEmojisRequest, SuggestEmojisResponse,
    SummaryRequest, SummaryResponse,
};

use crate::auth::AppState;

// These affordances are advisory: the handlers are infallible and any
// upstream failure has already collapsed into an empty or placeholder
// result inside the assist client.

pub async fn suggest_emojis(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Json(req): Json<SuggestEmojisRequest>,
) -> Json<SuggestEmojisResponse> {
    Json(SuggestEmojisResponse {
        emojis: state.assist.suggest_emojis(&req.message).await,
    })
}

pub async fn smart_replies(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Json(req): Json<SmartRepliesRequest>,
) -> Json<SmartRepliesResponse> {
    Json(SmartRepliesResponse {
        replies: state.assist.smart_replies(&req.chat_history).await,
    })
}

pub async fn summarize(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Json(req): Json<SummaryRequest>,
) -> Json<SummaryResponse> {
    Json(SummaryResponse {
        summary: state.assist.summarize(&req.chat_history).await,
    })
}
