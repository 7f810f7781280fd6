//! # ウォレット
//!
//! 鍵を保持し、アドレスの提供とメッセージ署名を行うエージェントの抽象。
//! ブラウザ拡張などの実装は外部にあり、ここではトレイトと
//! 開発・CLI・テスト用のインメモリ実装 [`LocalWallet`] を提供する。
//!
//! 接続中の署名者はグローバル状態として持たず、[`WalletSession`] の値として
//! 呼び出し側が明示的に受け渡す。

use std::time::Duration;

use quizcert_crypto::{
    address_of, generate_signing_key, sign_personal_message, signing_key_from_hex,
    signing_key_to_hex, Address, CryptoError, Signature, Secp256k1SigningKey,
};

/// ウォレット操作のエラー型
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// ユーザーが署名を拒否した
    #[error("署名が拒否されました: {0}")]
    SigningRejected(String),
    /// ウォレットに到達できない
    #[error("ウォレットに接続できません: {0}")]
    Unreachable(String),
    /// 署名待ちがタイムアウトした
    #[error("署名がタイムアウトしました（{0:?}）")]
    SigningTimedOut(Duration),
}

/// 鍵保持エージェント。
#[async_trait::async_trait]
pub trait Wallet: Send + Sync {
    /// 署名に使われるアドレスを返す。
    async fn address(&self) -> Result<Address, WalletError>;

    /// UTF-8文字列にpersonal_sign署名する。ユーザーの承認待ちで中断しうる。
    async fn sign_message(&self, message: &str) -> Result<Signature, WalletError>;
}

/// インメモリのsecp256k1鍵によるウォレット。
pub struct LocalWallet {
    signing_key: Secp256k1SigningKey,
    address: Address,
}

impl LocalWallet {
    /// 秘密鍵から構築する。
    pub fn new(signing_key: Secp256k1SigningKey) -> Self {
        let address = address_of(&signing_key);
        Self {
            signing_key,
            address,
        }
    }

    /// 新しい鍵をランダムに生成する。
    pub fn random() -> Self {
        Self::new(generate_signing_key())
    }

    /// 16進数の秘密鍵から構築する。
    pub fn from_hex(private_key: &str) -> Result<Self, CryptoError> {
        Ok(Self::new(signing_key_from_hex(private_key)?))
    }

    /// 秘密鍵を16進数で返す。
    pub fn private_key_hex(&self) -> String {
        signing_key_to_hex(&self.signing_key)
    }

    /// 鍵のアドレス（同期版）。
    pub fn local_address(&self) -> Address {
        self.address
    }
}

#[async_trait::async_trait]
impl Wallet for LocalWallet {
    async fn address(&self) -> Result<Address, WalletError> {
        Ok(self.address)
    }

    async fn sign_message(&self, message: &str) -> Result<Signature, WalletError> {
        sign_personal_message(&self.signing_key, message.as_bytes())
            .map_err(|e| WalletError::SigningRejected(e.to_string()))
    }
}

/// 接続済みのウォレットセッション。
///
/// 接続時に取得したアドレスを保持する。セッションを破棄すると
/// ウォレットが返却される。
pub struct WalletSession<W: Wallet> {
    wallet: W,
    address: Address,
}

impl<W: Wallet> WalletSession<W> {
    /// ウォレットに接続し、アドレスを取得する。
    pub async fn connect(wallet: W) -> Result<Self, WalletError> {
        let address = wallet.address().await?;
        Ok(Self { wallet, address })
    }

    /// 接続時に取得したアドレス。
    pub fn address(&self) -> Address {
        self.address
    }

    /// メッセージへの署名をウォレットに依頼する。
    pub async fn sign_message(&self, message: &str) -> Result<Signature, WalletError> {
        self.wallet.sign_message(message).await
    }

    /// セッションを終了し、ウォレットを返す。
    pub fn disconnect(self) -> W {
        self.wallet
    }
}
