#[rustfmt::skip]
use super::router::{
    // App config
    __path_health_check,
    __path_app_config,
    // Sessions
    chat::{
        __path_create_session,
        __path_get_session,
        __path_delete_session,
        __path_ask,
    },
};
use super::dto::{AskPayload, AskResponse, SessionResponse, TurnDto};
use crate::app::state::AppConfig;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        // App config
        health_check,
        app_config,
        // Sessions
        create_session,
        get_session,
        delete_session,
        ask,
    ),
    components(schemas(
        AskPayload,
        AskResponse,
        SessionResponse,
        TurnDto,
        AppConfig,
    ))
)]
pub struct ApiDoc;
