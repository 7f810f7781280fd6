//! # Ethereum JSON-RPC 証明書ミント
//!
//! 証明書コントラクトをJSON-RPCで呼び出す。トランザクションの署名は
//! ノード管理（アンロック済み）アカウントで行い、Gatewayは秘密鍵を持たない。
//!
//! ## ミントの流れ
//! 1. `mintCertificate(...)` の呼び出しデータをABIエンコードする
//! 2. `eth_sendTransaction` で送信する
//! 3. `eth_getTransactionReceipt` をレシートが得られるまでポーリングする
//! 4. `status == 0x1` を確認し、コントラクトが発行した `Transfer` ログからトークンIDを得る
//!
//! ## タイムアウト
//! 各JSON-RPC呼び出しとレシート待ち全体の双方に `receipt_timeout` を上限として課す。
//! 送信後のタイムアウト・通信失敗は発行済みの可能性があるため、
//! `Rpc` ではなく `ReceiptTimeout` / `Unconfirmed` として返す。

use std::time::Duration;

use alloy_primitives::{B256, U256};
use alloy_sol_types::{SolCall, SolEvent};
use quizcert_crypto::{parse_address, Address};
use quizcert_types::{CertificateRecord, MintRequest, MintResult};

use super::contract::{getCertificateDataCall, getCertificatesOfCall, mintCertificateCall, Transfer};
use super::{CertificateMinter, MinterError};

/// レシートのポーリング間隔のデフォルト値
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// JSON-RPC経由の証明書ミント実装。
pub struct EthRpcMinter {
    http_client: reqwest::Client,
    rpc_url: String,
    contract: Address,
    from: Address,
    receipt_timeout: Duration,
    poll_interval: Duration,
}

impl EthRpcMinter {
    pub fn new(
        rpc_url: String,
        contract: Address,
        from: Address,
        receipt_timeout: Duration,
    ) -> Result<Self, MinterError> {
        let http_client = reqwest::Client::builder()
            .timeout(receipt_timeout)
            .build()
            .map_err(|e| MinterError::InvalidRequest(format!("HTTPクライアントの構築に失敗: {e}")))?;

        Ok(Self {
            http_client,
            rpc_url,
            contract,
            from,
            receipt_timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// レシートのポーリング間隔を変更する。
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// JSON-RPCメソッドを呼び出し、`result` を返す。
    async fn rpc(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, MinterError> {
        let rpc_request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let rpc_response = self
            .http_client
            .post(&self.rpc_url)
            .json(&rpc_request)
            .send()
            .await
            .map_err(|e| transport_error(method, "送信失敗", e))?;

        let rpc_body: serde_json::Value = rpc_response
            .json()
            .await
            .map_err(|e| transport_error(method, "レスポンスのパースに失敗", e))?;

        if let Some(error) = rpc_body.get("error") {
            return Err(MinterError::Rpc(format!("{method}: {error}")));
        }

        rpc_body
            .get("result")
            .cloned()
            .ok_or_else(|| MinterError::InvalidResponse(format!("{method}: resultがありません")))
    }

    /// コントラクトの読み取り専用呼び出し。
    async fn eth_call(&self, data: &[u8]) -> Result<Vec<u8>, MinterError> {
        let result = self
            .rpc(
                "eth_call",
                serde_json::json!([
                    {"to": self.contract.to_checksum(None), "data": to_hex_data(data)},
                    "latest"
                ]),
            )
            .await?;
        let hex_str = result
            .as_str()
            .ok_or_else(|| MinterError::InvalidResponse("eth_callの結果が文字列ではありません".into()))?;
        decode_hex_data(hex_str)
    }

    /// レシートが得られるまでポーリングする。全体で `receipt_timeout` を超えない。
    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<serde_json::Value, MinterError> {
        let poll = async {
            loop {
                let receipt = self
                    .rpc("eth_getTransactionReceipt", serde_json::json!([tx_hash]))
                    .await
                    .map_err(|e| match e {
                        MinterError::RpcTimeout(_) => MinterError::ReceiptTimeout(tx_hash.to_string()),
                        other => MinterError::Unconfirmed(format!("{tx_hash}: {other}")),
                    })?;
                if !receipt.is_null() {
                    return Ok::<_, MinterError>(receipt);
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        tokio::time::timeout(self.receipt_timeout, poll)
            .await
            .map_err(|_| MinterError::ReceiptTimeout(tx_hash.to_string()))?
    }

    /// レシートのログから、このコントラクトによる新規発行の `Transfer` のトークンIDを得る。
    fn minted_token_id(&self, receipt: &serde_json::Value) -> Result<String, MinterError> {
        let logs = receipt
            .get("logs")
            .and_then(|v| v.as_array())
            .ok_or_else(|| MinterError::InvalidResponse("レシートにlogsがありません".into()))?;

        for log in logs {
            let from_contract = log
                .get("address")
                .and_then(|v| v.as_str())
                .and_then(|s| parse_address(s).ok())
                .is_some_and(|addr| addr == self.contract);
            if !from_contract {
                continue;
            }

            let topics: Vec<B256> = log
                .get("topics")
                .and_then(|v| v.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|t| t.as_str())
                        .filter_map(|t| t.parse::<B256>().ok())
                        .collect()
                })
                .unwrap_or_default();
            if topics.len() != 4 || topics[0] != Transfer::SIGNATURE_HASH || topics[1] != B256::ZERO {
                continue;
            }

            return Ok(U256::from_be_bytes(topics[3].0).to_string());
        }

        Err(MinterError::InvalidResponse(
            "レシートにミントのTransferログがありません".into(),
        ))
    }
}

#[async_trait::async_trait]
impl CertificateMinter for EthRpcMinter {
    fn kind(&self) -> &'static str {
        "eth-rpc"
    }

    fn contract_address(&self) -> Option<Address> {
        Some(self.contract)
    }

    async fn mint(&self, request: &MintRequest) -> Result<MintResult, MinterError> {
        let recipient = parse_address(&request.recipient)
            .map_err(|e| MinterError::InvalidRequest(e.to_string()))?;

        // Step 1: 呼び出しデータ
        let data = mintCertificateCall {
            to: recipient,
            quizName: request.quiz_name.clone(),
            score: U256::from(request.score),
            totalQuestions: U256::from(request.total_questions),
            difficulty: request.difficulty.as_str().to_string(),
            category: request.category.as_str().to_string(),
        }
        .abi_encode();

        // Step 2: 送信
        let result = self
            .rpc(
                "eth_sendTransaction",
                serde_json::json!([{
                    "from": self.from.to_checksum(None),
                    "to": self.contract.to_checksum(None),
                    "data": to_hex_data(&data),
                }]),
            )
            .await?;
        let tx_hash = result
            .as_str()
            .ok_or_else(|| {
                MinterError::InvalidResponse("トランザクションハッシュが文字列ではありません".into())
            })?
            .to_string();
        tracing::info!(tx_hash = %tx_hash, recipient = %recipient, "ミントトランザクションを送信");

        // Step 3: レシート待ち
        let receipt = self.wait_for_receipt(&tx_hash).await?;

        // Step 4: 成否とトークンID
        let status = receipt.get("status").and_then(|v| v.as_str()).unwrap_or("");
        if status != "0x1" {
            return Err(MinterError::Reverted(format!("{tx_hash} (status: {status})")));
        }
        let token_id = self.minted_token_id(&receipt)?;

        Ok(MintResult {
            token_id,
            transaction_hash: tx_hash,
        })
    }

    async fn certificates_of(
        &self,
        owner: &Address,
    ) -> Result<Vec<CertificateRecord>, MinterError> {
        let ids_data = self
            .eth_call(&getCertificatesOfCall { owner: *owner }.abi_encode())
            .await?;
        let token_ids = getCertificatesOfCall::abi_decode_returns(&ids_data)
            .map_err(|e| MinterError::InvalidResponse(format!("getCertificatesOf: {e}")))?;

        let mut certificates = Vec::with_capacity(token_ids.len());
        for token_id in token_ids {
            let data = self
                .eth_call(&getCertificateDataCall { tokenId: token_id }.abi_encode())
                .await?;
            let data = getCertificateDataCall::abi_decode_returns(&data)
                .map_err(|e| MinterError::InvalidResponse(format!("getCertificateData: {e}")))?;

            certificates.push(CertificateRecord {
                token_id: token_id.to_string(),
                quiz_name: data.quizName,
                score: narrow(data.score, "score")?,
                total_questions: narrow(data.totalQuestions, "totalQuestions")?,
                timestamp: narrow(data.timestamp, "timestamp")?,
                difficulty: data.difficulty,
                category: data.category,
            });
        }
        Ok(certificates)
    }
}

/// 通信エラーの分類。応答待ちのタイムアウトは送信済みの可能性がある。
fn transport_error(method: &str, context: &str, e: reqwest::Error) -> MinterError {
    if e.is_timeout() {
        MinterError::RpcTimeout(format!("{method}: {e}"))
    } else {
        MinterError::Rpc(format!("{method}: {context}: {e}"))
    }
}

fn narrow<T: TryFrom<U256>>(value: U256, field: &str) -> Result<T, MinterError> {
    T::try_from(value)
        .map_err(|_| MinterError::InvalidResponse(format!("{field}が範囲外です: {value}")))
}

fn to_hex_data(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

fn decode_hex_data(s: &str) -> Result<Vec<u8>, MinterError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| MinterError::InvalidResponse(format!("16進数デコードに失敗: {e}")))
}
