//! # リプレイ防止
//!
//! 有効期間内の同一Attestation（`keccak256(signer || message)`）による
//! 二重ミントを防ぐインメモリのガード。
//! プロセス再起動や複数インスタンス間では共有されないため、
//! 最終的な一意性は証明書コントラクト側に依存する。

use std::collections::HashMap;

use tokio::sync::Mutex;

/// 予約済みAttestationの集合。
pub struct ReplayGuard {
    /// Attestationの有効期間（ミリ秒）
    window_ms: i64,
    /// replay_digest → 有効期限（UNIXミリ秒）
    entries: Mutex<HashMap<[u8; 32], i64>>,
}

impl ReplayGuard {
    pub fn new(window_ms: i64) -> Self {
        Self {
            window_ms,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Attestationを予約する。有効期間内に予約済みの場合は `false` を返す。
    ///
    /// 有効期限は `max(timestamp, now) + window`。期限切れのエントリはここで除去する。
    pub async fn try_reserve(&self, digest: [u8; 32], timestamp_ms: i64, now_ms: i64) -> bool {
        let mut entries = self.entries.lock().await;
        entries.retain(|_, expiry| *expiry >= now_ms);

        if entries.contains_key(&digest) {
            return false;
        }
        let expiry = timestamp_ms.max(now_ms).saturating_add(self.window_ms);
        entries.insert(digest, expiry);
        true
    }

    /// 予約を取り消す（ミント失敗時に再送を許可する）。
    pub async fn release(&self, digest: &[u8; 32]) {
        self.entries.lock().await.remove(digest);
    }

    /// 予約中のエントリ数。
    #[cfg(test)]
    pub async fn reserved_count(&self) -> usize {
        self.entries.lock().await.len()
    }
}
