//! # Gatewayエンドポイント
//!
//! - `POST /api/mint-certificate` — Attestation検証 + 証明書ミント
//! - `GET /api/certificates/{address}` — 保有証明書の一覧
//! - `GET /.well-known/quizcert-info` — 受け付け条件の公開

pub mod certificates;
pub mod mint_certificate;
pub mod service_info;

use std::sync::Arc;

use crate::config::GatewayState;

pub use certificates::handle_certificates;
pub use mint_certificate::handle_mint_certificate;
pub use service_info::handle_service_info;

/// ルーターを構築する。
pub fn router(state: Arc<GatewayState>) -> axum::Router {
    axum::Router::new()
        .route(
            "/api/mint-certificate",
            axum::routing::post(handle_mint_certificate),
        )
        .route(
            "/api/certificates/{address}",
            axum::routing::get(handle_certificates),
        )
        .route(
            "/.well-known/quizcert-info",
            axum::routing::get(handle_service_info),
        )
        .with_state(state)
}
