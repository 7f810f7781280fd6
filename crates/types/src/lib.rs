//! # Quiz Certificate 共有型定義
//!
//! クライアント（Attestation Builder / CLI）とGateway（Attestation Verifier）の間で
//! やり取りされるデータ構造を提供する。
//!
//! ## エンコーディング規則
//! - JSONのキーはcamelCase（Webフロントエンドと同一のワイヤフォーマット）
//! - アドレス: `0x` + 40桁の16進数
//! - 署名: `0x` + 130桁の16進数（r || s || v）

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// 列挙型
// ---------------------------------------------------------------------------

/// クイズの難易度。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// ワイヤ上の文字列表現。
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(format!("不明な難易度です: {other}")),
        }
    }
}

/// クイズのカテゴリ（サブジェクトタグ）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Typescript,
    Solidity,
    Docker,
    Javascript,
    React,
    Nodejs,
}

impl Category {
    /// ワイヤ上の文字列表現。
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Typescript => "typescript",
            Category::Solidity => "solidity",
            Category::Docker => "docker",
            Category::Javascript => "javascript",
            Category::React => "react",
            Category::Nodejs => "nodejs",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "typescript" => Ok(Category::Typescript),
            "solidity" => Ok(Category::Solidity),
            "docker" => Ok(Category::Docker),
            "javascript" => Ok(Category::Javascript),
            "react" => Ok(Category::React),
            "nodejs" => Ok(Category::Nodejs),
            other => Err(format!("不明なカテゴリです: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Attestation
// ---------------------------------------------------------------------------

/// クライアントが主張するクイズ結果。署名対象のメッセージ本体。
///
/// フィールドの宣言順がそのまま正規エンコーディングのキー順になる。
/// 並べ替えると既存クライアントの署名と一致しなくなるため変更しないこと。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultAttestation {
    /// クイズの表示タイトル（識別キーとして使用）
    pub quiz: String,
    /// 正答数
    pub score: u32,
    /// 問題数
    pub total_questions: u32,
    /// 正答率（%、四捨五入）
    pub percentage: u32,
    /// 難易度
    pub difficulty: Difficulty,
    /// カテゴリ
    pub category: Category,
    /// 作成時刻（UNIXミリ秒、クライアント時計）
    pub timestamp: i64,
}

// ---------------------------------------------------------------------------
// POST /api/mint-certificate
// ---------------------------------------------------------------------------

/// 証明書ミントリクエスト（HTTPボディ）。
///
/// 欠落パラメータを400として報告するため、全フィールドをOptionで受け取り
/// 検証はVerifier側で行う。`difficulty`/`category` も文字列のまま受け取る。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintCertificateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// 正規エンコーディングされたResultAttestation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// `message` に対するpersonal_sign署名（16進数）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// 証明書ミント成功レスポンス。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintCertificateResponse {
    /// 常にtrue
    pub success: bool,
    /// 発行されたトークンID（10進数文字列）
    pub token_id: String,
    /// ミントトランザクションのハッシュ
    pub transaction_hash: String,
    /// 人間向けメッセージ
    pub message: String,
}

/// エラーレスポンス。全エンドポイント共通。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Mint collaborator
// ---------------------------------------------------------------------------

/// 検証済みのミント要求。Verifierが検証に成功した場合にのみ生成される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRequest {
    /// 受取人アドレス（EIP-55チェックサム形式）
    pub recipient: String,
    pub quiz_name: String,
    pub score: u32,
    pub total_questions: u32,
    pub difficulty: Difficulty,
    pub category: Category,
}

/// ミント結果。Gatewayは加工せずクライアントに返す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintResult {
    /// トークンID（10進数文字列）
    pub token_id: String,
    /// トランザクションハッシュ
    pub transaction_hash: String,
}

// ---------------------------------------------------------------------------
// GET /api/certificates/{address}
// ---------------------------------------------------------------------------

/// コントラクトに記録された証明書1件。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRecord {
    /// トークンID（10進数文字列）
    pub token_id: String,
    pub quiz_name: String,
    pub score: u32,
    pub total_questions: u32,
    /// ミント時刻（UNIX秒、チェーン時刻）
    pub timestamp: u64,
    /// コントラクトに保存された難易度（未知の値もそのまま返す）
    pub difficulty: String,
    /// コントラクトに保存されたカテゴリ（未知の値もそのまま返す）
    pub category: String,
}

/// 証明書一覧レスポンス。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificatesResponse {
    /// 照会したアドレス（EIP-55チェックサム形式）
    pub address: String,
    pub certificates: Vec<CertificateRecord>,
}

// ---------------------------------------------------------------------------
// GET /.well-known/quizcert-info
// ---------------------------------------------------------------------------

/// Gatewayが受け付けるAttestationの条件。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    /// Attestationの有効期間（ミリ秒）
    pub max_attestation_age_ms: i64,
    /// 署名付きAttestationが必須か
    pub signature_required: bool,
    /// リプレイ防止が有効か
    pub replay_protection: bool,
    /// 証明書を請求できる最低正答率（%）
    pub passing_percentage: u32,
    /// ミント実装の種別（"mock" / "eth-rpc"）
    pub minter: String,
    /// 証明書コントラクトアドレス（eth-rpcの場合）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ResultAttestationがWebクライアントと同じキー順・書式でシリアライズされることを確認
    #[test]
    fn test_result_attestation_key_order() {
        let attestation = ResultAttestation {
            quiz: "TypeScript Basics".to_string(),
            score: 8,
            total_questions: 10,
            percentage: 80,
            difficulty: Difficulty::Intermediate,
            category: Category::Typescript,
            timestamp: 1_700_000_000_000,
        };

        let json = serde_json::to_string(&attestation).unwrap();
        assert_eq!(
            json,
            r#"{"quiz":"TypeScript Basics","score":8,"totalQuestions":10,"percentage":80,"difficulty":"intermediate","category":"typescript","timestamp":1700000000000}"#
        );
    }

    /// 欠落フィールドがNoneとしてパースされることを確認
    #[test]
    fn test_mint_request_partial_body() {
        let body = r#"{"recipientAddress":"0xabc","score":0}"#;
        let request: MintCertificateRequest = serde_json::from_str(body).unwrap();

        assert_eq!(request.recipient_address.as_deref(), Some("0xabc"));
        assert_eq!(request.score, Some(0));
        assert!(request.quiz_name.is_none());
        assert!(request.message.is_none());
        assert!(request.signature.is_none());
    }

    #[test]
    fn test_enum_from_str() {
        assert_eq!("advanced".parse::<Difficulty>(), Ok(Difficulty::Advanced));
        assert!("expert".parse::<Difficulty>().is_err());
        assert_eq!("nodejs".parse::<Category>(), Ok(Category::Nodejs));
        assert!("TypeScript".parse::<Category>().is_err());
    }

    #[test]
    fn test_error_response_shape() {
        let json = serde_json::to_value(ErrorResponse {
            error: "invalid".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"error": "invalid"}));
    }
}
