//! # Gateway HTTPクライアント

use quizcert_crypto::Address;
use quizcert_types::{
    CertificatesResponse, ErrorResponse, MintCertificateRequest, MintCertificateResponse,
    ServiceInfo,
};
use serde::de::DeserializeOwned;

/// Gateway呼び出しのエラー型
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// 通信エラー
    #[error("Gatewayとの通信に失敗しました: {0}")]
    Http(#[from] reqwest::Error),
    /// Gatewayがエラーを返した
    #[error("Gatewayが請求を拒否しました（HTTP {status}）: {message}")]
    Rejected { status: u16, message: String },
}

/// Gatewayクライアント。
pub struct GatewayClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// POST /api/mint-certificate
    pub async fn mint_certificate(
        &self,
        request: &MintCertificateRequest,
    ) -> Result<MintCertificateResponse, ClientError> {
        let url = format!("{}/api/mint-certificate", self.base_url);
        tracing::debug!(url = %url, "証明書を請求");
        let response = self.http_client.post(&url).json(request).send().await?;
        parse_response(response).await
    }

    /// GET /api/certificates/{address}
    pub async fn certificates(&self, owner: &Address) -> Result<CertificatesResponse, ClientError> {
        let url = format!("{}/api/certificates/{}", self.base_url, owner.to_checksum(None));
        let response = self.http_client.get(&url).send().await?;
        parse_response(response).await
    }

    /// GET /.well-known/quizcert-info
    pub async fn service_info(&self) -> Result<ServiceInfo, ClientError> {
        let url = format!("{}/.well-known/quizcert-info", self.base_url);
        let response = self.http_client.get(&url).send().await?;
        parse_response(response).await
    }
}

/// 成功時はボディをデコードし、失敗時は `{error}` を取り出す。
async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await?;
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.error)
        .unwrap_or(text);
    Err(ClientError::Rejected {
        status: status.as_u16(),
        message,
    })
}
