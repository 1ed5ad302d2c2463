use crate::{constants::CHAIN_PATH, AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use beecoin_core::{BlockRecord, ChainSnapshot, LedgerError, TransactionRequest};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/mine", get(mine))
        .route("/transactions/new", post(new_transaction))
        .route(CHAIN_PATH, get(full_chain))
        .route("/nodes/register", post(register_nodes))
        .route("/nodes/resolve", get(consensus))
        .route("/balance/{address}", get(balance))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    Internal(String),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Ledger(LedgerError::Validation(rejection.body_text()))
    }
}

#[derive(Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Ledger(err @ LedgerError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::Ledger(err @ LedgerError::PeerUnreachable { .. }) => {
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            ApiError::Ledger(err @ LedgerError::InvalidChain(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            ApiError::Internal(message) => {
                error!(%message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[derive(Serialize, Deserialize)]
pub struct Health {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct MineParams {
    /// Address credited with the reward; defaults to the node id.
    pub miner: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct MineResponse {
    pub message: String,
    pub block: BlockRecord,
}

#[derive(Serialize, Deserialize)]
pub struct TransactionAccepted {
    pub message: String,
    pub ack_hash: String,
}

#[derive(Serialize, Deserialize)]
pub struct RegisterRequest {
    pub nodes: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub total_nodes: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ResolveResponse {
    pub message: String,
    pub replaced: bool,
    pub chain: Vec<BlockRecord>,
    pub length: usize,
}

#[derive(Serialize, Deserialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: i128,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".into(),
    })
}

async fn mine(
    State(state): State<AppState>,
    Query(params): Query<MineParams>,
) -> Result<Json<MineResponse>, ApiError> {
    let miner = params
        .miner
        .unwrap_or_else(|| state.node_id.to_string());
    let ledger = state.ledger.clone();
    // Proof of work is CPU bound; keep it off the async workers and hold the
    // lock for the whole round.
    let block = tokio::task::spawn_blocking(move || {
        let mut ledger = ledger.blocking_lock();
        BlockRecord::from(ledger.mine_pending_transactions(&miner))
    })
    .await
    .map_err(|e| ApiError::Internal(format!("mining task failed: {e}")))?;

    Ok(Json(MineResponse {
        message: "New Block Forged".into(),
        block,
    }))
}

async fn new_transaction(
    State(state): State<AppState>,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionAccepted>), ApiError> {
    let Json(request) = payload?;
    let tx = request.into_transaction()?;
    let ack_hash = state.ledger.lock().await.add_transaction(tx);
    Ok((
        StatusCode::CREATED,
        Json(TransactionAccepted {
            message: "Transaction will be added to the next block.".into(),
            ack_hash,
        }),
    ))
}

async fn full_chain(State(state): State<AppState>) -> Json<ChainSnapshot> {
    Json(state.ledger.lock().await.snapshot())
}

async fn register_nodes(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let Json(request) = payload?;
    let nodes = request.nodes.ok_or_else(|| {
        LedgerError::Validation("please supply a valid list of nodes".into())
    })?;

    let mut peers = state.peers.write().await;
    let mut updated = peers.clone();
    for node in &nodes {
        updated.register(node)?;
    }
    *peers = updated;
    info!(total = peers.len(), "peers registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "New nodes have been added".into(),
            total_nodes: peers.to_vec(),
        }),
    ))
}

async fn consensus(State(state): State<AppState>) -> Result<Json<ResolveResponse>, ApiError> {
    let (resolution, snapshot) = state
        .resolve()
        .await
        .map_err(|e| ApiError::Internal(format!("consensus task failed: {e}")))?;
    let message = if resolution.replaced() {
        "Our chain was replaced"
    } else {
        "Our chain is authoritative"
    };
    Ok(Json(ResolveResponse {
        message: message.into(),
        replaced: resolution.replaced(),
        chain: snapshot.chain,
        length: snapshot.length,
    }))
}

async fn balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Json<BalanceResponse> {
    let balance = state.ledger.lock().await.balance_of(&address);
    Json(BalanceResponse { address, balance })
}
