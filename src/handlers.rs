use crate::errors::AppError;
use crate::models::{Cliente, ClientePayload};
use crate::services::ClienteService;
use crate::viacep::ViaCepClient;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Client for the ViaCEP lookup service.
    pub viacep: ViaCepClient,
}

impl AppState {
    fn service(&self) -> ClienteService {
        ClienteService::new(self.db.clone(), self.viacep.clone())
    }
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "clientes-api",
            "version": "0.1.0"
        })),
    )
}

/// GET /clientes
pub async fn listar_clientes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Cliente>>, AppError> {
    tracing::info!("GET /clientes");

    let clientes = state.service().listar_todos().await?;
    Ok(Json(clientes))
}

/// GET /clientes/:id
pub async fn buscar_cliente(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Cliente>, AppError> {
    tracing::info!("GET /clientes/{}", id);

    let cliente = state.service().buscar_por_id(id).await?;
    Ok(Json(cliente))
}

/// POST /clientes
///
/// Validates the payload, resolves the endereco by CEP (consulting ViaCEP on
/// first sight of the CEP) and returns the persisted cliente with its
/// generated id.
pub async fn inserir_cliente(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ClientePayload>,
) -> Result<Json<Cliente>, AppError> {
    tracing::info!("POST /clientes");

    let novo = payload.validate()?;
    let cliente = state.service().inserir(novo).await?;
    Ok(Json(cliente))
}

/// PUT /clientes/:id
pub async fn atualizar_cliente(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<ClientePayload>,
) -> Result<Json<Cliente>, AppError> {
    tracing::info!("PUT /clientes/{}", id);

    let novo = payload.validate()?;
    let cliente = state.service().atualizar(id, novo).await?;
    Ok(Json(cliente))
}

/// DELETE /clientes/:id
///
/// Returns 204 No Content on success.
pub async fn deletar_cliente(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    tracing::info!("DELETE /clientes/{}", id);

    state.service().deletar(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
