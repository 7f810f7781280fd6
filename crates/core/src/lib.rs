//! # Quiz Certificate Core
//!
//! 証明書請求パスの中核ロジックを実装する。
//!
//! ## 構成
//! - [`attestation`]: ResultAttestationの正規エンコーディングと正答率計算
//! - [`wallet`]: 署名を行うウォレット（鍵保持エージェント）の抽象とセッション
//! - [`builder`]: クライアント側のAttestation構築（署名付きメッセージの生成）
//! - [`verifier`]: サーバー側のAttestation検証（署名者復元・整合性・鮮度）
//!
//! ## 処理フロー
//! 1. クライアントがクイズ結果から正規メッセージを作り、ウォレットで署名する
//! 2. (message, signature, recipient) をHTTPでGatewayに送る
//! 3. Gatewayが署名者を復元し、受取人・パラメータ・タイムスタンプを照合する
//! 4. すべて一致した場合にのみミント要求を生成する

pub mod attestation;
pub mod builder;
pub mod verifier;
pub mod wallet;

pub use attestation::{is_eligible, percentage, unix_time_ms, PASSING_PERCENTAGE};
pub use builder::{AttestationBuilder, BuildError, QuizResult, SignedAttestation};
pub use verifier::{
    AttestationFacts, AttestationVerifier, VerificationError, VerificationPolicy, VerifiedClaim,
    DEFAULT_MAX_ATTESTATION_AGE_MS,
};
pub use wallet::{LocalWallet, Wallet, WalletError, WalletSession};
