use crate::constants::{BLOCKS_PER_PAGE, MAX_BLOCKS_PER_REQUEST};
use crate::error::ApiError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use ledger_core::{
    constants::SIGNATURE_SCHEME, crypto::validate_address, Admission, Block, Ledger, Transaction,
};
use ledger_storage::SledStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

/// One ledger, one writer: every handler goes through this mutex.
///
/// Readers wait on it asynchronously. Mining holds it from a blocking thread,
/// so a long proof-of-work search never parks an async worker.
#[derive(Clone)]
pub struct AppState {
    ledger: Arc<Mutex<Ledger<SledStore>>>,
}

impl AppState {
    pub fn new(ledger: Ledger<SledStore>) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
        }
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Serialize)]
struct Head {
    height: usize,
    tip: Option<String>,
    pending: usize,
    difficulty: usize,
    signature_scheme: &'static str,
}

#[derive(Serialize)]
struct Verification {
    linked: bool,
    work: bool,
}

#[derive(Serialize)]
struct Balance {
    address: String,
    balance: i128,
}

#[derive(Serialize)]
struct Submitted {
    status: &'static str,
    hash: String,
    blocks_committed: usize,
}

#[derive(Serialize)]
struct Flushed {
    blocks_committed: usize,
    height: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TxView {
    pub hash: String,
    pub from: String,
    pub to: String,
    pub amount: u64,
    pub timestamp: u64,
    pub sender_public_key: String,
    pub signature: Option<String>,
}

impl From<&Transaction> for TxView {
    fn from(tx: &Transaction) -> Self {
        Self {
            hash: hex::encode(tx.hash()),
            from: tx.from.clone(),
            to: tx.to.clone(),
            amount: tx.amount,
            timestamp: tx.timestamp,
            sender_public_key: hex::encode(&tx.sender_public_key),
            signature: tx.signature.as_ref().map(hex::encode),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BlockView {
    pub index: usize,
    pub hash: String,
    pub prev_hash: Option<String>,
    pub timestamp: u64,
    pub nonce: u64,
    pub transactions: Vec<TxView>,
}

impl BlockView {
    fn new(index: usize, block: &Block) -> Self {
        Self {
            index,
            hash: block.hash_hex(),
            prev_hash: block.prev_hash.map(hex::encode),
            timestamp: block.timestamp,
            nonce: block.nonce,
            transactions: block.transactions.iter().map(TxView::from).collect(),
        }
    }
}

/// A signed transfer as submitted over HTTP, binary fields hex-encoded.
#[derive(Debug, Deserialize)]
pub struct TxIn {
    pub from: String,
    pub to: String,
    pub amount: u64,
    pub timestamp: u64,
    pub sender_public_key: String,
    pub signature: String,
}

impl TryFrom<TxIn> for Transaction {
    type Error = ApiError;

    fn try_from(tx: TxIn) -> Result<Self, Self::Error> {
        let sender_public_key = hex::decode(&tx.sender_public_key)
            .map_err(|e| ApiError::BadRequest(format!("sender_public_key: {e}")))?;
        let signature = hex::decode(&tx.signature)
            .map_err(|e| ApiError::BadRequest(format!("signature: {e}")))?;
        Ok(Transaction {
            from: tx.from,
            to: tx.to,
            amount: tx.amount,
            sender_public_key,
            signature: Some(signature),
            timestamp: tx.timestamp,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Page {
    start: Option<usize>,
    limit: Option<usize>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(Health { status: "ok" }) }))
        .route("/chain/head", get(head))
        .route("/chain/blocks", get(blocks))
        .route("/chain/blocks/{index}", get(block))
        .route("/chain/verify", get(verify))
        .route("/chain/flush", post(flush))
        .route("/balance/{address}", get(balance))
        .route("/mempool", get(mempool))
        .route("/tx", post(submit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn head(State(state): State<AppState>) -> Result<Json<Head>, ApiError> {
    let ledger = state.ledger.lock().await;
    Ok(Json(Head {
        height: ledger.len(),
        tip: ledger.tip_hash().map(hex::encode),
        pending: ledger.pending().len(),
        difficulty: ledger.config().difficulty,
        signature_scheme: SIGNATURE_SCHEME,
    }))
}

async fn blocks(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<BlockView>>, ApiError> {
    let ledger = state.ledger.lock().await;
    let start = page.start.unwrap_or(0);
    let limit = page
        .limit
        .unwrap_or(BLOCKS_PER_PAGE)
        .min(MAX_BLOCKS_PER_REQUEST);
    let views = ledger
        .blocks()
        .iter()
        .enumerate()
        .skip(start)
        .take(limit)
        .map(|(i, b)| BlockView::new(i, b))
        .collect();
    Ok(Json(views))
}

async fn block(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<BlockView>, ApiError> {
    let ledger = state.ledger.lock().await;
    let block = ledger
        .block(index)
        .ok_or_else(|| ApiError::NotFound(format!("no block at index {index}")))?;
    Ok(Json(BlockView::new(index, block)))
}

async fn verify(State(state): State<AppState>) -> Result<Json<Verification>, ApiError> {
    let ledger = state.ledger.lock().await;
    Ok(Json(Verification {
        linked: ledger.verify(),
        work: ledger.verify_work(),
    }))
}

async fn balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<Balance>, ApiError> {
    validate_address(&address)?;
    let ledger = state.ledger.lock().await;
    let balance = ledger.find_balance(&address);
    Ok(Json(Balance { address, balance }))
}

async fn mempool(State(state): State<AppState>) -> Result<Json<Vec<TxView>>, ApiError> {
    let ledger = state.ledger.lock().await;
    Ok(Json(ledger.pending().iter().map(TxView::from).collect()))
}

async fn submit(
    State(state): State<AppState>,
    Json(body): Json<TxIn>,
) -> Result<(StatusCode, Json<Submitted>), ApiError> {
    let tx = Transaction::try_from(body)?;
    let hash = hex::encode(tx.hash());
    // Submission may mine; keep it off the async workers.
    let admission = tokio::task::spawn_blocking(move || -> Result<Admission, ApiError> {
        let mut ledger = state.ledger.blocking_lock();
        Ok(ledger.add_transaction(tx)?)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("submit task failed: {e}")))??;

    let (status, body) = match admission {
        Admission::Queued => (
            StatusCode::ACCEPTED,
            Submitted {
                status: "queued",
                hash,
                blocks_committed: 0,
            },
        ),
        // The queue was mined but this transaction was discarded.
        Admission::Dropped { blocks_committed } => (
            StatusCode::CONFLICT,
            Submitted {
                status: "dropped",
                hash,
                blocks_committed,
            },
        ),
    };
    Ok((status, Json(body)))
}

async fn flush(State(state): State<AppState>) -> Result<Json<Flushed>, ApiError> {
    let flushed = tokio::task::spawn_blocking(move || -> Result<Flushed, ApiError> {
        let mut ledger = state.ledger.blocking_lock();
        let blocks_committed = ledger.flush()?;
        Ok(Flushed {
            blocks_committed,
            height: ledger.len(),
        })
    })
    .await
    .map_err(|e| ApiError::Internal(format!("flush task failed: {e}")))??;
    Ok(Json(flushed))
}
