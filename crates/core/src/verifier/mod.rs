//! # Attestation Verifier
//!
//! サーバー側でミント要求を認可する前の検証を行う。
//! 状態を持たない純粋関数で、入力と現在時刻のみに依存する。
//!
//! ## 検証順序
//! 1. 必須パラメータ（`totalQuestions == 0` は欠落扱い、`score == 0` は有効）
//! 2. 受取人アドレスの形式
//! 3. 難易度・カテゴリの値域
//! 4. `score <= totalQuestions`
//! 5. 署名付きAttestation（message, signatureの両方がある場合）
//!    1. 署名者を復元する
//!    2. 署名者と受取人を照合する（20バイト値で比較）
//!    3. messageをパースする
//!    4. 埋め込まれた値とパラメータを照合する（正答率は再計算して照合）
//!    5. タイムスタンプの鮮度を確認する（未来の時刻は許容）


use quizcert_crypto::{keccak256, parse_address, parse_signature, recover_personal_signer, Address};
use quizcert_types::{Category, Difficulty, MintCertificateRequest, MintRequest};

use crate::attestation::{self, percentage};

/// Attestationの有効期間のデフォルト値（5分）
pub const DEFAULT_MAX_ATTESTATION_AGE_MS: i64 = 5 * 60 * 1000;

/// 検証のエラー型
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    /// 必須パラメータが欠落している
    #[error("必須パラメータが不足しています: {0}")]
    MissingParameter(&'static str),
    /// 受取人アドレスの形式が不正
    #[error("受取人アドレスの形式が不正です: {0}")]
    MalformedAddress(String),
    /// 列挙値の範囲外
    #[error("{field}の値が不正です: {value}")]
    InvalidParameter {
        field: &'static str,
        value: String,
    },
    /// 正答数が問題数を超えている
    #[error("正答数が問題数を超えています: {score} > {total_questions}")]
    InvalidScore { score: u32, total_questions: u32 },
    /// 署名付きAttestationが必要だが提供されていない
    #[error("署名付きのAttestationが必要です")]
    MissingAttestation,
    /// 署名の形式が不正、または署名者を復元できない
    #[error("署名が無効です: {0}")]
    InvalidSignature(String),
    /// 署名者が受取人と一致しない
    #[error("署名者が受取人と一致しません")]
    SignerMismatch { signer: Address, recipient: Address },
    /// messageを正規エンコーディングとしてパースできない
    #[error("Attestationメッセージの形式が不正です: {0}")]
    MalformedMessage(String),
    /// 署名済みの値がパラメータと一致しない
    #[error("Attestationの{0}がパラメータと一致しません")]
    AttestationParameterMismatch(&'static str),
    /// Attestationの有効期限切れ
    #[error("Attestationの有効期限が切れています（経過 {age_ms}ms > {max_age_ms}ms）")]
    AttestationExpired { age_ms: i64, max_age_ms: i64 },
}

impl VerificationError {
    /// 信頼性の検証に失敗したか（403）。`false` の場合は入力不正（400）。
    pub fn is_trust_failure(&self) -> bool {
        !matches!(
            self,
            VerificationError::MissingParameter(_)
                | VerificationError::MalformedAddress(_)
                | VerificationError::InvalidParameter { .. }
                | VerificationError::InvalidScore { .. }
        )
    }
}

/// 検証ポリシー。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPolicy {
    /// Attestationの有効期間（ミリ秒）
    pub max_age_ms: i64,
    /// 署名付きAttestationを必須とするか。
    /// `false` の場合、message/signatureのないリクエストは検証なしで通す。
    pub require_signature: bool,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            max_age_ms: DEFAULT_MAX_ATTESTATION_AGE_MS,
            require_signature: true,
        }
    }
}

/// 検証済みAttestationの情報。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationFacts {
    /// 復元された署名者
    pub signer: Address,
    /// Attestationのタイムスタンプ（UNIXミリ秒）
    pub timestamp: i64,
    /// リプレイ検出キー `keccak256(signer || message)`
    pub replay_digest: [u8; 32],
}

/// 検証に成功したリクエスト。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaim {
    /// ミント要求
    pub mint_request: MintRequest,
    /// 署名付きAttestationで認可された場合のみSome
    pub attestation: Option<AttestationFacts>,
}

/// 必須パラメータを検証済みの型に変換したもの。
struct ClaimParameters<'a> {
    recipient: Address,
    quiz_name: &'a str,
    score: u32,
    total_questions: u32,
    difficulty: Difficulty,
    category: Category,
}

/// Attestation Verifier。
#[derive(Debug, Clone, Default)]
pub struct AttestationVerifier {
    policy: VerificationPolicy,
}

impl AttestationVerifier {
    pub fn new(policy: VerificationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &VerificationPolicy {
        &self.policy
    }

    /// ミントリクエストを検証する。
    ///
    /// `now_ms` は検証時刻（UNIXミリ秒）。
    pub fn verify(
        &self,
        request: &MintCertificateRequest,
        now_ms: i64,
    ) -> Result<VerifiedClaim, VerificationError> {
        let params = check_parameters(request)?;

        let mint_request = MintRequest {
            recipient: params.recipient.to_checksum(None),
            quiz_name: params.quiz_name.to_string(),
            score: params.score,
            total_questions: params.total_questions,
            difficulty: params.difficulty,
            category: params.category,
        };

        let message = non_empty(&request.message);
        let signature = non_empty(&request.signature);
        let (message, signature) = match (message, signature) {
            (Some(m), Some(s)) => (m, s),
            _ if self.policy.require_signature => {
                return Err(VerificationError::MissingAttestation)
            }
            _ => {
                return Ok(VerifiedClaim {
                    mint_request,
                    attestation: None,
                })
            }
        };

        let facts = self.verify_attestation(&params, message, signature, now_ms)?;
        Ok(VerifiedClaim {
            mint_request,
            attestation: Some(facts),
        })
    }

    fn verify_attestation(
        &self,
        params: &ClaimParameters<'_>,
        message: &str,
        signature: &str,
        now_ms: i64,
    ) -> Result<AttestationFacts, VerificationError> {
        // Step 1: 署名者の復元
        let signature = parse_signature(signature)
            .map_err(|e| VerificationError::InvalidSignature(e.to_string()))?;
        let signer = recover_personal_signer(message.as_bytes(), &signature)
            .map_err(|e| VerificationError::InvalidSignature(e.to_string()))?;

        // Step 2: 署名者と受取人の照合
        if signer != params.recipient {
            return Err(VerificationError::SignerMismatch {
                signer,
                recipient: params.recipient,
            });
        }

        // Step 3: messageのパース
        let attestation = attestation::parse(message)
            .map_err(|e| VerificationError::MalformedMessage(e.to_string()))?;

        // Step 4: 署名済みの値とパラメータの照合
        if attestation.quiz != params.quiz_name {
            return Err(VerificationError::AttestationParameterMismatch("quiz"));
        }
        if attestation.score != params.score {
            return Err(VerificationError::AttestationParameterMismatch("score"));
        }
        if attestation.total_questions != params.total_questions {
            return Err(VerificationError::AttestationParameterMismatch(
                "totalQuestions",
            ));
        }
        if attestation.difficulty != params.difficulty {
            return Err(VerificationError::AttestationParameterMismatch("difficulty"));
        }
        if attestation.category != params.category {
            return Err(VerificationError::AttestationParameterMismatch("category"));
        }
        if attestation.percentage != percentage(params.score, params.total_questions) {
            return Err(VerificationError::AttestationParameterMismatch("percentage"));
        }

        // Step 5: 鮮度
        let age_ms = now_ms.saturating_sub(attestation.timestamp);
        if age_ms > self.policy.max_age_ms {
            return Err(VerificationError::AttestationExpired {
                age_ms,
                max_age_ms: self.policy.max_age_ms,
            });
        }

        let mut preimage = Vec::with_capacity(20 + message.len());
        preimage.extend_from_slice(signer.as_slice());
        preimage.extend_from_slice(message.as_bytes());

        Ok(AttestationFacts {
            signer,
            timestamp: attestation.timestamp,
            replay_digest: keccak256(&preimage).0,
        })
    }
}

/// 空文字列を欠落として扱う。
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn check_parameters(
    request: &MintCertificateRequest,
) -> Result<ClaimParameters<'_>, VerificationError> {
    let recipient = non_empty(&request.recipient_address)
        .ok_or(VerificationError::MissingParameter("recipientAddress"))?;
    let quiz_name =
        non_empty(&request.quiz_name).ok_or(VerificationError::MissingParameter("quizName"))?;
    let score = request
        .score
        .ok_or(VerificationError::MissingParameter("score"))?;
    let total_questions = request
        .total_questions
        .filter(|t| *t > 0)
        .ok_or(VerificationError::MissingParameter("totalQuestions"))?;
    let difficulty =
        non_empty(&request.difficulty).ok_or(VerificationError::MissingParameter("difficulty"))?;
    let category =
        non_empty(&request.category).ok_or(VerificationError::MissingParameter("category"))?;

    let recipient = parse_address(recipient)
        .map_err(|_| VerificationError::MalformedAddress(recipient.to_string()))?;

    let difficulty: Difficulty = difficulty
        .parse()
        .map_err(|_| VerificationError::InvalidParameter {
            field: "difficulty",
            value: difficulty.to_string(),
        })?;
    let category: Category = category
        .parse()
        .map_err(|_| VerificationError::InvalidParameter {
            field: "category",
            value: category.to_string(),
        })?;

    if score > total_questions {
        return Err(VerificationError::InvalidScore {
            score,
            total_questions,
        });
    }

    Ok(ClaimParameters {
        recipient,
        quiz_name,
        score,
        total_questions,
        difficulty,
        category,
    })
}
