use crate::{
    app::{
        server::dto::{AskPayload, AskResponse, SessionResponse, TurnDto},
        state::AppState,
    },
    error::GroundedError,
    map_err,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validify::Validify;

#[utoipa::path(
    post,
    path = "/sessions",
    responses(
        (status = 201, description = "Session started with an empty transcript", body = SessionResponse),
    )
)]
pub(in crate::app::server) async fn create_session(
    state: State<AppState>,
) -> (StatusCode, Json<SessionResponse>) {
    let id = state.sessions.create();
    (StatusCode::CREATED, Json(SessionResponse::new(id, &[])))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    responses(
        (status = 200, description = "Session transcript in chronological order", body = SessionResponse),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Session is answering a question"),
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID")
    )
)]
pub(in crate::app::server) async fn get_session(
    state: State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, GroundedError> {
    let transcript = state.sessions.transcript(id)?;
    Ok(Json(SessionResponse::new(id, &transcript)))
}

#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    responses(
        (status = 204, description = "Session and its transcript dropped"),
        (status = 404, description = "Session not found"),
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID")
    )
)]
pub(in crate::app::server) async fn delete_session(
    state: State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, GroundedError> {
    state.sessions.remove(id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/messages",
    responses(
        (status = 200, description = "Question answered, possibly with the degraded apology", body = AskResponse),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Session is already answering a question"),
        (status = 422, description = "Empty question"),
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    request_body = AskPayload
)]
pub(in crate::app::server) async fn ask(
    state: State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<AskPayload>,
) -> Result<Json<AskResponse>, GroundedError> {
    map_err!(payload.validify());

    let (reply, transcript) = state
        .sessions
        .ask(&state.chat, id, &payload.question)
        .await?;

    Ok(Json(AskResponse {
        answer: reply.answer,
        degraded: reply.degraded,
        transcript: transcript.iter().map(TurnDto::from).collect(),
    }))
}
