//! # Gateway エラー型
//!
//! すべてのエラーは `{"error": "..."}` 形式のJSONで返す。
//!
//! | 分類 | ステータス |
//! |------|-----------|
//! | 入力不正（欠落・形式・デコード不能なボディ） | 400 |
//! | 信頼性の検証失敗（署名・鮮度・リプレイ・Attestation欠落） | 403 |
//! | ミント失敗・内部エラー | 500 |

use axum::http::StatusCode;
use axum::Json;
use quizcert_core::VerificationError;
use quizcert_types::ErrorResponse;

use crate::minter::MinterError;

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),
    /// Attestation検証に失敗
    #[error(transparent)]
    Verification(#[from] VerificationError),
    /// 同一のAttestationが既に使用された
    #[error("このAttestationは既に使用されています")]
    AttestationReplayed,
    /// ミントに失敗
    #[error("証明書のミントに失敗しました: {0}")]
    MintFailed(String),
    /// 証明書コントラクトの読み取りに失敗
    #[error("証明書の取得に失敗しました: {0}")]
    Minter(#[from] MinterError),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Verification(e) if e.is_trust_failure() => StatusCode::FORBIDDEN,
            GatewayError::Verification(_) => StatusCode::BAD_REQUEST,
            GatewayError::AttestationReplayed => StatusCode::FORBIDDEN,
            GatewayError::MintFailed(_) | GatewayError::Minter(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
