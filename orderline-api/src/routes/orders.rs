//! Order lookup routes.
//!
//! Both lookups go through the same read-through entry point and answer with
//! the stored payload bytes verbatim.

use axum::{
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Form,
};
use orderline_storage::CacheRead;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::state::OrderReads;
use crate::telemetry::with_metrics;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Form body of `POST /process`.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct ProcessForm {
    /// Missing is treated like empty, which is never found.
    #[serde(default)]
    pub order_uid: String,
}

async fn lookup(reads: &OrderReads, uid: &str) -> ApiResult<Response> {
    let read = reads.get(uid).await?;
    with_metrics(|metrics| metrics.record_read(read.source()));
    Ok(payload_response(read))
}

fn payload_response(read: CacheRead) -> Response {
    (
        [(header::CONTENT_TYPE, "application/json")],
        read.into_payload(),
    )
        .into_response()
}

/// GET / - lookup form
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /orders/:uid - fetch an order by uid
#[utoipa::path(
    get,
    path = "/orders/{uid}",
    tag = "Orders",
    params(
        ("uid" = String, Path, description = "Order uid")
    ),
    responses(
        (status = 200, description = "Order payload as originally validated", content_type = "application/json"),
        (status = 404, description = "Order not found", body = ApiError),
        (status = 500, description = "Record store failure", body = ApiError),
    ),
)]
pub async fn get_order(
    State(reads): State<OrderReads>,
    Path(uid): Path<String>,
) -> ApiResult<Response> {
    lookup(&reads, &uid).await
}

/// POST /process - fetch an order by the uid submitted from the index form
#[utoipa::path(
    post,
    path = "/process",
    tag = "Orders",
    request_body(content = ProcessForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Order payload as originally validated", content_type = "application/json"),
        (status = 404, description = "Order not found", body = ApiError),
        (status = 500, description = "Record store failure", body = ApiError),
    ),
)]
pub async fn process(
    State(reads): State<OrderReads>,
    Form(form): Form<ProcessForm>,
) -> ApiResult<Response> {
    lookup(&reads, &form.order_uid).await
}
