use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use server_api::{
    create_work_order, delete_work_order, get_work_order, list_work_orders, update_work_order,
    ApiContext,
};
use shared::{
    domain::{NewWorkOrder, WorkOrder, WorkOrderId, WorkOrderPatch},
    error::{ApiError, ErrorCode},
    protocol::{WorkOrderEvent, EVENTS_ROUTE, HEALTH_ROUTE, WORK_ORDERS_ROUTE},
};
use storage::Storage;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, normalize_database_url};

const MAX_BODY_BYTES: usize = 64 * 1024;

type HttpResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    if settings.seed_demo_data {
        let seeded = storage.seed_demo_work_orders().await?;
        info!(seeded, "demo work orders seeded");
    }

    let state = AppState::new(ApiContext {
        storage: storage.clone(),
    });
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    storage.close().await;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to listen for shutdown signal");
    }
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(HEALTH_ROUTE, get(healthz))
        .route(
            WORK_ORDERS_ROUTE,
            get(http_list_work_orders).post(http_create_work_order),
        )
        .route(
            &format!("{WORK_ORDERS_ROUTE}/:id"),
            get(http_get_work_order)
                .patch(http_update_work_order)
                .delete(http_delete_work_order),
        )
        .route(EVENTS_ROUTE, get(ws_handler))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

async fn healthz(State(state): State<Arc<AppState>>) -> HttpResult<&'static str> {
    state
        .api
        .storage
        .health_check()
        .await
        .map_err(|e| reject(ApiError::internal(e.to_string())))?;
    Ok("ok")
}

async fn http_list_work_orders(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<Vec<WorkOrder>>> {
    let orders = list_work_orders(&state.api).await.map_err(reject)?;
    Ok(Json(orders))
}

async fn http_get_work_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HttpResult<Json<WorkOrder>> {
    let order = get_work_order(&state.api, &WorkOrderId(id))
        .await
        .map_err(reject)?;
    Ok(Json(order))
}

async fn http_create_work_order(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewWorkOrder>,
) -> HttpResult<(StatusCode, Json<WorkOrder>)> {
    let created = create_work_order(&state.api, new).await.map_err(reject)?;
    state.publish(WorkOrderEvent::Created {
        work_order: created.clone(),
    });
    Ok((StatusCode::CREATED, Json(created)))
}

async fn http_update_work_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<WorkOrderPatch>,
) -> HttpResult<Json<WorkOrder>> {
    let updated = update_work_order(&state.api, &WorkOrderId(id), patch)
        .await
        .map_err(reject)?;
    state.publish(WorkOrderEvent::Updated {
        work_order: updated.clone(),
    });
    Ok(Json(updated))
}

async fn http_delete_work_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HttpResult<StatusCode> {
    let id = WorkOrderId(id);
    delete_work_order(&state.api, &id).await.map_err(reject)?;
    state.publish(WorkOrderEvent::Deleted { id });
    Ok(StatusCode::NO_CONTENT)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: Arc<AppState>, socket: axum::extract::ws::WebSocket) {
    use axum::extract::ws::Message;
    use futures::{SinkExt, StreamExt};

    let (mut sender, mut receiver) = socket.split();
    let mut events_rx = state.events.subscribe();

    let send_task = tokio::spawn(async move {
        while let Some(event) = next_event(&mut events_rx).await {
            let text = match serde_json::to_string(&event) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(_msg)) = receiver.next().await {}

    send_task.abort();
}

/// Next event for a subscriber. A subscriber that fell behind skips what it
/// missed and keeps going; `None` only once the channel is closed.
async fn next_event(rx: &mut broadcast::Receiver<WorkOrderEvent>) -> Option<WorkOrderEvent> {
    loop {
        match rx.recv().await {
            Ok(event) => return Some(event),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "event subscriber lagged, skipping missed events");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
