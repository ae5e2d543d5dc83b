use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

pub mod v1;

/// Every route under `/api/v1`, with rejections rendered as JSON errors.
pub fn api(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    warp::path("api")
        .and(warp::path("v1"))
        .and(v1::routes(server))
        .recover(v1::recover_error)
}
