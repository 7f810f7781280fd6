//! # GET /.well-known/quizcert-info
//!
//! クライアントがAttestationを作る前に受け付け条件を確認するためのエンドポイント。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use quizcert_core::PASSING_PERCENTAGE;
use quizcert_types::ServiceInfo;

use crate::config::GatewayState;

/// GET /.well-known/quizcert-info — 受け付け条件の公開。
pub async fn handle_service_info(State(state): State<Arc<GatewayState>>) -> Json<ServiceInfo> {
    let policy = state.verifier.policy();
    Json(ServiceInfo {
        max_attestation_age_ms: policy.max_age_ms,
        signature_required: policy.require_signature,
        replay_protection: state.replay_guard.is_some(),
        passing_percentage: PASSING_PERCENTAGE,
        minter: state.minter.kind().to_string(),
        contract_address: state.minter.contract_address().map(|a| a.to_checksum(None)),
    })
}
