//! # GET /api/certificates/{address}
//!
//! アドレスが保有する証明書をミント実装の読み取りパス経由で返す。

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use quizcert_crypto::parse_address;
use quizcert_types::CertificatesResponse;

use crate::config::GatewayState;
use crate::error::GatewayError;

/// GET /api/certificates/{address} — 保有証明書の一覧。
pub async fn handle_certificates(
    State(state): State<Arc<GatewayState>>,
    Path(address): Path<String>,
) -> Result<Json<CertificatesResponse>, GatewayError> {
    let owner = parse_address(&address)
        .map_err(|_| GatewayError::BadRequest(format!("アドレスの形式が不正です: {address}")))?;

    let certificates = state.minter.certificates_of(&owner).await.map_err(|e| {
        tracing::error!(owner = %owner, error = %e, "証明書の取得に失敗");
        GatewayError::from(e)
    })?;

    Ok(Json(CertificatesResponse {
        address: owner.to_checksum(None),
        certificates,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minter::{CertificateMinter, InMemoryMinter};
    use crate::test_helpers::FailingMinter;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use quizcert_core::VerificationPolicy;
    use quizcert_types::{Category, Difficulty, MintRequest};

    const OWNER: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    #[tokio::test]
    async fn test_list_certificates() {
        let minter = InMemoryMinter::new();
        minter
            .mint(&MintRequest {
                recipient: OWNER.to_string(),
                quiz_name: "React Hooks".to_string(),
                score: 9,
                total_questions: 10,
                difficulty: Difficulty::Advanced,
                category: Category::React,
            })
            .await
            .unwrap();
        let state = Arc::new(GatewayState::new(
            VerificationPolicy::default(),
            Box::new(minter),
            true,
        ));

        let response = handle_certificates(State(state), Path(OWNER.to_lowercase()))
            .await
            .unwrap()
            .0;
        assert_eq!(response.address, OWNER);
        assert_eq!(response.certificates.len(), 1);
        assert_eq!(response.certificates[0].quiz_name, "React Hooks");
        assert_eq!(response.certificates[0].token_id, "0");
    }

    #[tokio::test]
    async fn test_malformed_address() {
        let state = Arc::new(GatewayState::new(
            VerificationPolicy::default(),
            Box::new(InMemoryMinter::new()),
            true,
        ));
        let err = handle_certificates(State(state), Path("0x1234".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_minter_failure() {
        let state = Arc::new(GatewayState::new(
            VerificationPolicy::default(),
            Box::new(FailingMinter::Reverted),
            true,
        ));
        let err = handle_certificates(State(state), Path(OWNER.to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
