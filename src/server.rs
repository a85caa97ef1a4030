//! HTTP remote control for a running governor.

use std::net::SocketAddr;

use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::battery_level::{BatteryLevel, Threshold};
use crate::governor::{Controller, Request};

/// Thresholds offered as one-click links on the status page.
const PRESETS: [u8; 4] = [60, 80, 90, 100];

#[derive(Template)]
#[template(path = "status.html")]
struct StatusPage {
    enabled: bool,
    threshold: Threshold,
    presets: [u8; 4],
}

pub fn router(controller: Controller) -> Router {
    Router::new()
        .route("/", get(status_page))
        .fallback(dispatch)
        .with_state(controller)
}

pub async fn serve(listen: SocketAddr, controller: Controller) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!("control page served on http://{}", listener.local_addr()?);
    axum::serve(listener, router(controller)).await
}

/// Map a request path segment onto a governor request.
///
/// Unknown or out-of-range segments yield `None` and are ignored.
pub fn parse_action(segment: &str) -> Option<Request> {
    match segment {
        "enable" => Some(Request::Enable(BatteryLevel::Live)),
        "disable" => Some(Request::Disable),
        other => {
            let percentage: u8 = other.parse().ok()?;
            match BatteryLevel::try_from(percentage) {
                Ok(level) => Some(Request::Enable(level)),
                Err(e) => {
                    tracing::debug!(%e, "ignoring threshold request");
                    None
                }
            }
        }
    }
}

async fn status_page(State(controller): State<Controller>) -> Response {
    let status = controller.state().status();
    let page = StatusPage {
        enabled: status.enabled,
        threshold: status.threshold,
        presets: PRESETS,
    };
    match page.render() {
        Ok(body) => Html(body).into_response(),
        Err(e) => {
            tracing::error!(%e, "failed to render status page");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn dispatch(State(controller): State<Controller>, uri: Uri) -> Response {
    let path = uri.path();
    let segment = path.strip_prefix('/').unwrap_or(path);
    if let Some(request) = parse_action(segment) {
        controller.submit(request).await;
    }
    (
        StatusCode::FOUND,
        [(header::LOCATION, "/"), (header::CACHE_CONTROL, "no-store")],
    )
        .into_response()
}
