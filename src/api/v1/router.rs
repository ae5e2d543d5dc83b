use super::error::*;
use super::handler;
use crate::application_port::*;
use crate::domain_model::PrincipalId;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let issue = warp::get()
        .and(warp::path("token"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(with_call_context(server.clone()))
        .and(with(server.credential_service.clone()))
        .and_then(handler::issue_token);

    let refresh = warp::post()
        .and(warp::path("token"))
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_call_context(server.clone()))
        .and(with(server.credential_service.clone()))
        .and_then(handler::refresh_token);

    let whoami = warp::get()
        .and(warp::path("whoami"))
        .and(warp::path::end())
        .and(with_verification(server.credential_service.clone()))
        .and_then(handler::whoami);

    refresh.or(issue).or(whoami)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_call_context(
    server: Arc<Server>,
) -> impl Filter<Extract = (CallContext,), Error = Infallible> + Clone {
    warp::any().map(move || server.call_context())
}

fn with_verification(
    credential_service: Arc<dyn CredentialService>,
) -> impl Filter<Extract = (PrincipalId,), Error = warp::Rejection> + Clone {
    warp::header::<String>(http::header::AUTHORIZATION.as_ref()).and_then(move |token: String| {
        let credential_service = credential_service.clone();
        async move {
            if let Some(token) = token.strip_prefix("Bearer ") {
                let principal_id = credential_service
                    .authenticate(token)
                    .await
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)?;
                Ok(principal_id)
            } else {
                Err(reject::custom(ApiErrorCode::InvalidToken))
            }
        }
    })
}
