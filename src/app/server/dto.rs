//! Http specific DTOs.

use crate::core::model::{Role, Turn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validify::Validify;

/// A question for the assistant.
#[derive(Debug, Deserialize, Validify, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AskPayload {
    /// The user's question. Surrounding whitespace is ignored.
    #[modify(trim)]
    #[validate(length(min = 1))]
    pub question: String,
}

/// A single message of a transcript.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TurnDto {
    /// Either `user` or `assistant`.
    #[schema(value_type = String, example = "user")]
    pub role: Role,

    pub content: String,

    pub created_at: DateTime<Utc>,
}

impl From<&Turn> for TurnDto {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role(),
            content: turn.content().to_string(),
            created_at: turn.created_at(),
        }
    }
}

/// A session and its transcript in chronological order.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: Uuid,
    pub transcript: Vec<TurnDto>,
}

impl SessionResponse {
    pub fn new(id: Uuid, transcript: &[Turn]) -> Self {
        Self {
            id,
            transcript: transcript.iter().map(TurnDto::from).collect(),
        }
    }
}

/// The assistant's answer and the transcript after the exchange.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    pub answer: String,

    /// `true` if the answer could not be produced and a fixed apology was recorded instead.
    pub degraded: bool,

    pub transcript: Vec<TurnDto>,
}
