//! # テスト用共通ヘルパー
//!
//! ミント実装・エンドポイントのテストで共有するモックJSON-RPCノードと状態構築。

use std::sync::{Arc, Mutex};

use alloy_primitives::U256;
use alloy_sol_types::{SolCall, SolEvent, SolValue};
use axum::extract::State;
use axum::Json;
use quizcert_crypto::Address;
use quizcert_types::{CertificateRecord, MintRequest, MintResult};

use crate::minter::contract::{getCertificatesOfCall, CertificateData, Transfer};
use crate::minter::{CertificateMinter, MinterError};

/// モックノードが返すトランザクションハッシュ
pub const MOCK_TX_HASH: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

/// モックノードのレシート応答
#[derive(Debug, Clone, Copy)]
pub enum ReceiptBehavior {
    /// 1回目は未確定、2回目以降に成功レシート
    Success,
    /// status 0x0
    Reverted,
    /// 常に未確定
    Pending,
    /// eth_sendTransactionがエラーを返す
    RpcError,
    /// レシート照会に応答しない
    Hang,
}

struct NodeState {
    contract: Address,
    behavior: ReceiptBehavior,
    requests: Mutex<Vec<serde_json::Value>>,
}

/// 起動済みのモックノード。
pub struct MockEthNode {
    pub url: String,
    state: Arc<NodeState>,
}

impl MockEthNode {
    /// 受信したJSON-RPCリクエスト一覧。
    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.state.requests.lock().unwrap().clone()
    }
}

fn word_hex(word: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(word))
}

fn uint_topic(value: u64) -> String {
    word_hex(U256::from(value).to_be_bytes::<32>())
}

async fn handle_rpc(
    State(state): State<Arc<NodeState>>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let polls_so_far = {
        let mut requests = state.requests.lock().unwrap();
        let polls = requests
            .iter()
            .filter(|r| r["method"] == "eth_getTransactionReceipt")
            .count();
        requests.push(body.clone());
        polls
    };

    let method = body["method"].as_str().unwrap_or_default();
    let result = match method {
        "eth_sendTransaction" => {
            if matches!(state.behavior, ReceiptBehavior::RpcError) {
                return Json(serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "error": {"code": -32000, "message": "execution reverted: already certified"}
                }));
            }
            serde_json::json!(MOCK_TX_HASH)
        }
        "eth_getTransactionReceipt" => {
            if matches!(state.behavior, ReceiptBehavior::Hang) {
                std::future::pending::<()>().await;
            }
            let status = match state.behavior {
                ReceiptBehavior::Pending => None,
                _ if polls_so_far == 0 => None,
                ReceiptBehavior::Reverted => Some("0x0"),
                _ => Some("0x1"),
            };
            match status {
                None => serde_json::Value::Null,
                Some(status) => {
                    let transfer = word_hex(Transfer::SIGNATURE_HASH);
                    let zero = word_hex([0u8; 32]);
                    let recipient = word_hex([0u8; 32]);
                    serde_json::json!({
                        "transactionHash": MOCK_TX_HASH,
                        "status": status,
                        "logs": [
                            // 別コントラクトのTransfer（無視される）
                            {
                                "address": "0x0000000000000000000000000000000000000001",
                                "topics": [transfer, zero, recipient, uint_topic(99)],
                                "data": "0x"
                            },
                            {
                                "address": word_hex(state.contract.as_slice()),
                                "topics": [transfer, zero, recipient, uint_topic(42)],
                                "data": "0x"
                            }
                        ]
                    })
                }
            }
        }
        "eth_call" => {
            let data = body["params"][0]["data"].as_str().unwrap_or_default();
            let data = hex::decode(data.trim_start_matches("0x")).unwrap_or_default();
            let selector = data.get(..4).unwrap_or_default();

            if selector == getCertificatesOfCall::SELECTOR {
                let out = vec![U256::from(42), U256::from(43)].abi_encode();
                serde_json::json!(word_hex(out))
            } else {
                let token_id = U256::from_be_slice(data.get(4..36).unwrap_or_default());
                let out = CertificateData {
                    quizName: format!("Quiz #{token_id}"),
                    score: U256::from(5),
                    totalQuestions: U256::from(6),
                    timestamp: U256::from(1_700_000_000u64),
                    difficulty: "beginner".to_string(),
                    category: "docker".to_string(),
                }
                .abi_encode();
                serde_json::json!(word_hex(out))
            }
        }
        _ => serde_json::Value::Null,
    };

    Json(serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": result}))
}

/// モックJSON-RPCノードを起動する。
pub async fn start_mock_eth_node(contract: Address, behavior: ReceiptBehavior) -> MockEthNode {
    let state = Arc::new(NodeState {
        contract,
        behavior,
        requests: Mutex::new(Vec::new()),
    });

    let app = axum::Router::new()
        .route("/", axum::routing::post(handle_rpc))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    MockEthNode {
        url: format!("http://127.0.0.1:{port}"),
        state,
    }
}

/// 接続を受け付けるが一切応答しないリスナーを起動し、URLを返す。
pub async fn start_silent_listener() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    format!("http://127.0.0.1:{port}")
}

/// 常に失敗するミント実装
#[derive(Debug, Clone, Copy)]
pub enum FailingMinter {
    /// トランザクションがリバートする（未発行が確定）
    Reverted,
    /// 送信後に確定を確認できない
    Unconfirmed,
}

#[async_trait::async_trait]
impl CertificateMinter for FailingMinter {
    fn kind(&self) -> &'static str {
        "failing"
    }

    async fn mint(&self, _request: &MintRequest) -> Result<MintResult, MinterError> {
        match self {
            FailingMinter::Reverted => Err(MinterError::Reverted("0xdead (status: 0x0)".to_string())),
            FailingMinter::Unconfirmed => Err(MinterError::ReceiptTimeout("0xdead".to_string())),
        }
    }

    async fn certificates_of(
        &self,
        _owner: &Address,
    ) -> Result<Vec<CertificateRecord>, MinterError> {
        Err(MinterError::Rpc("eth_call: connection refused".to_string()))
    }
}
