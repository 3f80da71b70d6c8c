use crate::config::ResolvedConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{
    FaturamentoPaginadoRequest, FaturamentoPaginadoResponse, FaturamentoRequest,
    FaturamentoResponse, HealthResponse, ServiceKind,
};
use crate::service;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::info;

pub const FULL_SCAN_ROUTE: &str = "/api/faturamento-emissao";
pub const PAGINATED_ROUTE: &str = "/api/faturamento-paginado-emissao";

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared, read-only handler state. Nothing per-request lives here.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ResolvedConfig>,
}

/// Builds the router for the selected service(s).
pub fn router(config: ResolvedConfig, service: ServiceKind) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };

    let mut app = Router::new();
    app = if service.serves_paginated() {
        app.route("/", get(paginated_health))
    } else {
        app.route("/", get(full_scan_health))
    };
    if service.serves_full_scan() {
        app = app.route(FULL_SCAN_ROUTE, post(faturamento_emissao));
    }
    if service.serves_paginated() {
        app = app.route(PAGINATED_ROUTE, post(faturamento_paginado));
    }

    app.with_state(state)
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(config: ResolvedConfig) -> AppResult<()> {
    let addr = config.socket_addr()?;
    let service = config.service_kind();
    let app = router(config, service);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::IoError(format!("Failed to bind {addr}: {e}")))?;

    info!(
        addr = %addr,
        service = service.display_name(),
        version = APP_VERSION,
        "HTTP server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::IoError(format!("HTTP server error: {e}")))?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

async fn full_scan_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        message: "API Extrator NFS-e por Data de Emissão online".into(),
        version: None,
    })
}

async fn paginated_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        message: "API Extrator NFS-e Paginado por Data de Emissão online".into(),
        version: Some(APP_VERSION.into()),
    })
}

fn reject_body(rejection: JsonRejection) -> AppError {
    AppError::InvalidInput(format!("Corpo da requisição inválido: {}", rejection.body_text()))
}

async fn faturamento_emissao(
    State(state): State<AppState>,
    payload: Result<Json<FaturamentoRequest>, JsonRejection>,
) -> AppResult<Json<FaturamentoResponse>> {
    let Json(request) = payload.map_err(reject_body)?;
    let response = service::faturamento_emissao(&state.config, request).await?;
    Ok(Json(response))
}

async fn faturamento_paginado(
    State(state): State<AppState>,
    payload: Result<Json<FaturamentoPaginadoRequest>, JsonRejection>,
) -> AppResult<Json<FaturamentoPaginadoResponse>> {
    let Json(request) = payload.map_err(reject_body)?;
    let response = service::faturamento_paginado(&state.config, request).await?;
    Ok(Json(response))
}
