//! # インメモリ証明書ミント
//!
//! ブロックチェーンに接続せずに動作する開発・テスト用実装。
//! トークンIDは0からの連番、トランザクションハッシュは内容から合成する。

use std::time::{SystemTime, UNIX_EPOCH};

use quizcert_crypto::{keccak256, parse_address, Address};
use quizcert_types::{CertificateRecord, MintRequest, MintResult};
use tokio::sync::Mutex;

use super::{CertificateMinter, MinterError};

/// 発行済み証明書（保有者つき）
struct Minted {
    owner: Address,
    record: CertificateRecord,
}

/// インメモリの証明書台帳。
pub struct InMemoryMinter {
    certificates: Mutex<Vec<Minted>>,
}

impl InMemoryMinter {
    pub fn new() -> Self {
        Self {
            certificates: Mutex::new(Vec::new()),
        }
    }
}

impl Default for InMemoryMinter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CertificateMinter for InMemoryMinter {
    fn kind(&self) -> &'static str {
        "mock"
    }

    async fn mint(&self, request: &MintRequest) -> Result<MintResult, MinterError> {
        let owner = parse_address(&request.recipient)
            .map_err(|e| MinterError::InvalidRequest(e.to_string()))?;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| MinterError::InvalidResponse(format!("時刻取得失敗: {e}")))?
            .as_secs();

        let mut certificates = self.certificates.lock().await;
        let token_id = certificates.len() as u64;

        let mut preimage = owner.as_slice().to_vec();
        preimage.extend_from_slice(&token_id.to_be_bytes());
        preimage.extend_from_slice(request.quiz_name.as_bytes());
        preimage.extend_from_slice(&timestamp.to_be_bytes());
        let transaction_hash = format!("0x{}", hex::encode(keccak256(&preimage)));

        certificates.push(Minted {
            owner,
            record: CertificateRecord {
                token_id: token_id.to_string(),
                quiz_name: request.quiz_name.clone(),
                score: request.score,
                total_questions: request.total_questions,
                timestamp,
                difficulty: request.difficulty.to_string(),
                category: request.category.to_string(),
            },
        });

        tracing::debug!(token_id, recipient = %owner, "インメモリ証明書を発行");

        Ok(MintResult {
            token_id: token_id.to_string(),
            transaction_hash,
        })
    }

    async fn certificates_of(
        &self,
        owner: &Address,
    ) -> Result<Vec<CertificateRecord>, MinterError> {
        let certificates = self.certificates.lock().await;
        Ok(certificates
            .iter()
            .filter(|m| m.owner == *owner)
            .map(|m| m.record.clone())
            .collect())
    }
}
