//! # Gateway設定・共有状態
//!
//! 環境変数からの設定読み込みとGatewayの共有状態の定義。
//!
//! | 環境変数 | デフォルト | 内容 |
//! |---------|-----------|------|
//! | `BIND_ADDR` | `0.0.0.0:3000` | 待ち受けアドレス |
//! | `MINTER` | `mock` | `mock` / `eth-rpc` |
//! | `ETH_RPC_URL` | `http://localhost:8545` | JSON-RPCエンドポイント |
//! | `CERTIFICATE_CONTRACT` | なし（eth-rpcでは必須） | 証明書コントラクト |
//! | `MINTER_ACCOUNT` | なし（eth-rpcでは必須） | アンロック済み送信アカウント |
//! | `RECEIPT_TIMEOUT_SECS` | `60` | レシート待ち・各JSON-RPC呼び出しの上限 |
//! | `RECEIPT_POLL_INTERVAL_MS` | `1000` | レシートのポーリング間隔 |
//! | `REQUIRE_SIGNATURE` | `true` | 署名付きAttestationを必須とする |
//! | `MAX_ATTESTATION_AGE_MS` | `300000` | Attestationの有効期間 |
//! | `REPLAY_PROTECTION` | `true` | リプレイ防止を有効にする |

use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use quizcert_core::{AttestationVerifier, VerificationPolicy, DEFAULT_MAX_ATTESTATION_AGE_MS};
use quizcert_crypto::parse_address;

use crate::minter::{CertificateMinter, EthRpcMinter, InMemoryMinter};
use crate::replay::ReplayGuard;

/// ミント実装の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinterKind {
    Mock,
    EthRpc,
}

/// Gateway設定。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: String,
    pub minter: MinterKind,
    pub eth_rpc_url: String,
    pub certificate_contract: Option<String>,
    pub minter_account: Option<String>,
    pub receipt_timeout_secs: u64,
    pub receipt_poll_interval_ms: u64,
    pub require_signature: bool,
    pub max_attestation_age_ms: i64,
    pub replay_protection: bool,
}

impl GatewayConfig {
    /// 環境変数から読み込む。
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の参照関数から読み込む。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let minter = match lookup("MINTER").as_deref().unwrap_or("mock") {
            "mock" => MinterKind::Mock,
            "eth-rpc" => MinterKind::EthRpc,
            other => bail!("MINTERの値が不正です: {other}（mock / eth-rpc）"),
        };

        let receipt_timeout_secs = lookup("RECEIPT_TIMEOUT_SECS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("RECEIPT_TIMEOUT_SECSが不正です")?
            .unwrap_or(60);
        let receipt_poll_interval_ms = lookup("RECEIPT_POLL_INTERVAL_MS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("RECEIPT_POLL_INTERVAL_MSが不正です")?
            .unwrap_or(1000);
        if receipt_timeout_secs == 0 || receipt_poll_interval_ms == 0 {
            bail!("RECEIPT_TIMEOUT_SECSとRECEIPT_POLL_INTERVAL_MSは1以上である必要があります");
        }
        let max_attestation_age_ms = lookup("MAX_ATTESTATION_AGE_MS")
            .map(|v| v.parse::<i64>())
            .transpose()
            .context("MAX_ATTESTATION_AGE_MSが不正です")?
            .unwrap_or(DEFAULT_MAX_ATTESTATION_AGE_MS);
        if max_attestation_age_ms < 0 {
            bail!("MAX_ATTESTATION_AGE_MSは0以上である必要があります");
        }

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            minter,
            eth_rpc_url: lookup("ETH_RPC_URL")
                .unwrap_or_else(|| "http://localhost:8545".to_string()),
            certificate_contract: lookup("CERTIFICATE_CONTRACT"),
            minter_account: lookup("MINTER_ACCOUNT"),
            receipt_timeout_secs,
            receipt_poll_interval_ms,
            require_signature: parse_flag(&lookup, "REQUIRE_SIGNATURE", true)?,
            max_attestation_age_ms,
            replay_protection: parse_flag(&lookup, "REPLAY_PROTECTION", true)?,
        })
    }

    /// 検証ポリシー。
    pub fn verification_policy(&self) -> VerificationPolicy {
        VerificationPolicy {
            max_age_ms: self.max_attestation_age_ms,
            require_signature: self.require_signature,
        }
    }
}

fn parse_flag(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: bool,
) -> anyhow::Result<bool> {
    match lookup(key) {
        None => Ok(default),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(anyhow!("{key}の値が不正です: {v}")),
        },
    }
}

/// Gatewayの共有状態。
pub struct GatewayState {
    /// Attestation Verifier
    pub verifier: AttestationVerifier,
    /// ミント実装（トレイトで抽象化）
    pub minter: Box<dyn CertificateMinter>,
    /// リプレイ防止（無効の場合None）
    pub replay_guard: Option<ReplayGuard>,
}

impl GatewayState {
    /// 設定から共有状態を構築する。
    pub fn from_config(config: &GatewayConfig) -> anyhow::Result<Self> {
        let minter: Box<dyn CertificateMinter> = match config.minter {
            MinterKind::Mock => {
                tracing::info!("InMemoryMinterで起動します（開発環境用）");
                Box::new(InMemoryMinter::new())
            }
            MinterKind::EthRpc => {
                let contract = config
                    .certificate_contract
                    .as_deref()
                    .context("MINTER=eth-rpc にはCERTIFICATE_CONTRACTが必要です")
                    .and_then(|s| parse_address(s).context("CERTIFICATE_CONTRACTが不正です"))?;
                let account = config
                    .minter_account
                    .as_deref()
                    .context("MINTER=eth-rpc にはMINTER_ACCOUNTが必要です")
                    .and_then(|s| parse_address(s).context("MINTER_ACCOUNTが不正です"))?;
                tracing::info!(
                    rpc_url = %config.eth_rpc_url,
                    contract = %contract,
                    account = %account,
                    "EthRpcMinterで起動します"
                );
                let minter = EthRpcMinter::new(
                    config.eth_rpc_url.clone(),
                    contract,
                    account,
                    Duration::from_secs(config.receipt_timeout_secs),
                )
                .context("JSON-RPCクライアントの初期化に失敗しました")?
                .with_poll_interval(Duration::from_millis(config.receipt_poll_interval_ms));
                Box::new(minter)
            }
        };

        Ok(Self::new(
            config.verification_policy(),
            minter,
            config.replay_protection,
        ))
    }

    pub fn new(
        policy: VerificationPolicy,
        minter: Box<dyn CertificateMinter>,
        replay_protection: bool,
    ) -> Self {
        if !policy.require_signature {
            tracing::warn!("REQUIRE_SIGNATURE=false: 署名なしのミント要求を受け付けます");
        }
        Self {
            verifier: AttestationVerifier::new(policy),
            minter,
            replay_guard: replay_protection.then(|| ReplayGuard::new(policy.max_age_ms)),
        }
    }
}
