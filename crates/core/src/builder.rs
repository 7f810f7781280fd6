//! # Attestation Builder
//!
//! クライアント側でクイズ結果の署名付きAttestationを作る。
//! ネットワーク通信は行わない。
//!
//! ## 処理フロー
//! 1. 入力の整合性を確認する（`totalQuestions > 0`、`score <= totalQuestions`）
//! 2. 正答率を計算し、現在時刻を付けて正規エンコーディングする
//! 3. ウォレットに署名を依頼する（タイムアウト任意）
//! 4. `{message, signature, recipient}` を返す

use std::time::Duration;

use quizcert_crypto::{signature_to_hex, Address, Signature};
use quizcert_types::{Category, Difficulty, MintCertificateRequest, ResultAttestation};

use crate::attestation::{self, percentage, unix_time_ms};
use crate::wallet::{Wallet, WalletError, WalletSession};

/// Attestation構築のエラー型
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// クイズ結果が矛盾している
    #[error("クイズ結果が不正です: {0}")]
    InvalidResult(String),
    /// エンコードに失敗
    #[error("Attestationのエンコードに失敗しました: {0}")]
    Encoding(String),
    /// ウォレットエラー
    #[error(transparent)]
    Wallet(#[from] WalletError),
}

/// 請求対象のクイズ結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    /// クイズの表示タイトル
    pub quiz: String,
    pub score: u32,
    pub total_questions: u32,
    pub difficulty: Difficulty,
    pub category: Category,
}

impl QuizResult {
    /// 正答率（%）。
    pub fn percentage(&self) -> u32 {
        percentage(self.score, self.total_questions)
    }
}

/// 署名済みAttestation。1回の請求につき1つ作られ、1回だけ送信される。
#[derive(Debug, Clone)]
pub struct SignedAttestation {
    /// 署名対象の正規エンコーディング
    pub message: String,
    /// `message` へのpersonal_sign署名
    pub signature: Signature,
    /// 受取人（署名者）アドレス
    pub recipient: Address,
    /// エンコード前のAttestation
    pub attestation: ResultAttestation,
}

impl SignedAttestation {
    /// `POST /api/mint-certificate` のリクエストボディを作る。
    pub fn to_request(&self) -> MintCertificateRequest {
        MintCertificateRequest {
            recipient_address: Some(self.recipient.to_checksum(None)),
            quiz_name: Some(self.attestation.quiz.clone()),
            score: Some(self.attestation.score),
            total_questions: Some(self.attestation.total_questions),
            difficulty: Some(self.attestation.difficulty.to_string()),
            category: Some(self.attestation.category.to_string()),
            message: Some(self.message.clone()),
            signature: Some(signature_to_hex(&self.signature)),
        }
    }
}

/// 署名付きAttestationのビルダー。
#[derive(Debug, Clone, Default)]
pub struct AttestationBuilder {
    signing_timeout: Option<Duration>,
}

impl AttestationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// ウォレットの署名待ちに上限を設ける。
    pub fn with_signing_timeout(mut self, timeout: Duration) -> Self {
        self.signing_timeout = Some(timeout);
        self
    }

    /// 現在時刻でAttestationを構築・署名する。
    pub async fn build<W: Wallet>(
        &self,
        session: &WalletSession<W>,
        result: &QuizResult,
    ) -> Result<SignedAttestation, BuildError> {
        self.build_at(session, result, unix_time_ms()).await
    }

    /// 指定したタイムスタンプ（UNIXミリ秒）でAttestationを構築・署名する。
    pub async fn build_at<W: Wallet>(
        &self,
        session: &WalletSession<W>,
        result: &QuizResult,
        timestamp_ms: i64,
    ) -> Result<SignedAttestation, BuildError> {
        if result.total_questions == 0 {
            return Err(BuildError::InvalidResult(
                "問題数は1以上である必要があります".to_string(),
            ));
        }
        if result.score > result.total_questions {
            return Err(BuildError::InvalidResult(format!(
                "正答数が問題数を超えています: {} > {}",
                result.score, result.total_questions
            )));
        }

        let attestation = ResultAttestation {
            quiz: result.quiz.clone(),
            score: result.score,
            total_questions: result.total_questions,
            percentage: result.percentage(),
            difficulty: result.difficulty,
            category: result.category,
            timestamp: timestamp_ms,
        };
        let message =
            attestation::encode(&attestation).map_err(|e| BuildError::Encoding(e.to_string()))?;

        let signature = match self.signing_timeout {
            Some(timeout) => tokio::time::timeout(timeout, session.sign_message(&message))
                .await
                .map_err(|_| WalletError::SigningTimedOut(timeout))??,
            None => session.sign_message(&message).await?,
        };

        Ok(SignedAttestation {
            message,
            signature,
            recipient: session.address(),
            attestation,
        })
    }
}
