//! # Quiz Certificate Gateway
//!
//! クイズ合格者による証明書NFTの請求を受け付けるHTTPサーバー。
//!
//! ## 役割
//! - 署名付きAttestationの検証（署名者・パラメータ・鮮度）
//! - リプレイ防止
//! - 証明書コントラクトへのミント依頼
//! - 保有証明書の照会
//!
//! ## API エンドポイント
//! - `POST /api/mint-certificate` — 検証 + ミント
//! - `GET /api/certificates/{address}` — 保有証明書の一覧
//! - `GET /.well-known/quizcert-info` — 受け付け条件の公開

mod config;
mod endpoints;
mod error;
mod minter;
mod replay;

#[cfg(test)]
mod test_helpers;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{GatewayConfig, GatewayState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = GatewayConfig::from_env()?;
    tracing::info!(
        require_signature = config.require_signature,
        max_attestation_age_ms = config.max_attestation_age_ms,
        replay_protection = config.replay_protection,
        "Gateway設定を読み込みました"
    );

    let state = Arc::new(GatewayState::from_config(&config)?);
    let app = endpoints::router(state);

    tracing::info!("Gatewayを {} で起動します", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
