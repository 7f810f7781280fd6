//! /api/mint-certificate ハンドラ実装

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use quizcert_core::unix_time_ms;
use quizcert_types::{MintCertificateRequest, MintCertificateResponse};

use crate::config::GatewayState;
use crate::error::GatewayError;

/// 成功時のメッセージ
pub(crate) const MINT_SUCCESS_MESSAGE: &str = "証明書NFTを発行しました";

/// POST /api/mint-certificate — Attestation検証 + 証明書ミント。
pub async fn handle_mint_certificate(
    State(state): State<Arc<GatewayState>>,
    body: Bytes,
) -> Result<Json<MintCertificateResponse>, GatewayError> {
    let request_id = uuid::Uuid::new_v4();

    // Step 1: デコード
    let request: MintCertificateRequest = serde_json::from_slice(&body)
        .map_err(|e| GatewayError::BadRequest(format!("リクエストボディのパースに失敗: {e}")))?;

    // Step 2: 検証
    let now_ms = unix_time_ms();
    let claim = state.verifier.verify(&request, now_ms).map_err(|e| {
        tracing::warn!(
            request_id = %request_id,
            recipient = request.recipient_address.as_deref().unwrap_or(""),
            error = %e,
            "ミント要求を拒否"
        );
        GatewayError::from(e)
    })?;

    // Step 3: リプレイ防止
    let reserved = match (&state.replay_guard, &claim.attestation) {
        (Some(guard), Some(facts)) => {
            if !guard
                .try_reserve(facts.replay_digest, facts.timestamp, now_ms)
                .await
            {
                tracing::warn!(
                    request_id = %request_id,
                    signer = %facts.signer,
                    "使用済みのAttestationを拒否"
                );
                return Err(GatewayError::AttestationReplayed);
            }
            Some((guard, facts.replay_digest))
        }
        _ => None,
    };

    tracing::info!(
        request_id = %request_id,
        recipient = %claim.mint_request.recipient,
        quiz = %claim.mint_request.quiz_name,
        signed = claim.attestation.is_some(),
        "Attestation検証成功、ミントを開始"
    );

    // Step 4: ミント
    let result = match state.minter.mint(&claim.mint_request).await {
        Ok(result) => result,
        Err(e) => {
            // 発行済みの可能性が残る場合は予約を保持し、二重発行を防ぐ
            match reserved {
                Some((guard, digest)) if !e.may_have_minted() => guard.release(&digest).await,
                Some(_) => tracing::warn!(
                    request_id = %request_id,
                    "ミント結果が不明のためAttestationの予約を保持"
                ),
                None => {}
            }
            tracing::error!(request_id = %request_id, error = %e, "ミントに失敗");
            return Err(GatewayError::MintFailed(e.to_string()));
        }
    };

    tracing::info!(
        request_id = %request_id,
        token_id = %result.token_id,
        tx_hash = %result.transaction_hash,
        recipient = %claim.mint_request.recipient,
        "証明書をミント"
    );

    // Step 5: レスポンス
    Ok(Json(MintCertificateResponse {
        success: true,
        token_id: result.token_id,
        transaction_hash: result.transaction_hash,
        message: MINT_SUCCESS_MESSAGE.to_string(),
    }))
}
