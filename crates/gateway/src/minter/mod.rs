//! # 証明書ミント
//!
//! 検証済みのミント要求をブロックチェーン（証明書コントラクト）に渡す協調者。
//! Gatewayはトレイト経由でのみ利用し、実装は起動時に選択する。
//!
//! - [`InMemoryMinter`]: 開発・テスト用（連番トークンID、合成トランザクションハッシュ）
//! - [`EthRpcMinter`]: Ethereum JSON-RPC経由で証明書コントラクトを呼び出す

pub mod contract;
pub mod eth_rpc;
pub mod mock;

use quizcert_crypto::Address;
use quizcert_types::{CertificateRecord, MintRequest, MintResult};

pub use eth_rpc::EthRpcMinter;
pub use mock::InMemoryMinter;

/// ミント協調者のエラー型
#[derive(Debug, thiserror::Error)]
pub enum MinterError {
    /// ミント要求が不正
    #[error("ミント要求が不正です: {0}")]
    InvalidRequest(String),
    /// JSON-RPC通信・エラー応答（トランザクションは受理されていない）
    #[error("JSON-RPCエラー: {0}")]
    Rpc(String),
    /// ノードが時間内に応答しない
    #[error("JSON-RPCの応答がタイムアウトしました: {0}")]
    RpcTimeout(String),
    /// トランザクションがリバートした
    #[error("トランザクションが失敗しました: {0}")]
    Reverted(String),
    /// レシート待ちのタイムアウト
    #[error("トランザクションの確定を待機中にタイムアウトしました: {0}")]
    ReceiptTimeout(String),
    /// 送信後にレシートを確認できない
    #[error("トランザクションの確定を確認できませんでした: {0}")]
    Unconfirmed(String),
    /// ノードの応答が想定外
    #[error("ノードの応答が不正です: {0}")]
    InvalidResponse(String),
}

impl MinterError {
    /// 証明書が発行された可能性が残るか。
    ///
    /// 送信前の失敗とリバートのみfalse。
    pub fn may_have_minted(&self) -> bool {
        !matches!(
            self,
            MinterError::InvalidRequest(_) | MinterError::Rpc(_) | MinterError::Reverted(_)
        )
    }
}

/// 証明書コントラクトへのアクセスの抽象。
#[async_trait::async_trait]
pub trait CertificateMinter: Send + Sync {
    /// 実装の種別（`/.well-known/quizcert-info` で公開）。
    fn kind(&self) -> &'static str;

    /// 証明書コントラクトのアドレス。
    fn contract_address(&self) -> Option<Address> {
        None
    }

    /// 証明書をミントする。
    async fn mint(&self, request: &MintRequest) -> Result<MintResult, MinterError>;

    /// アドレスが保有する証明書を取得する。
    async fn certificates_of(&self, owner: &Address)
        -> Result<Vec<CertificateRecord>, MinterError>;
}
