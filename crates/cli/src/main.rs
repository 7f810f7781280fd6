//! # Quiz Certificate CLI
//!
//! ローカル鍵でクイズ結果に署名し、Gatewayに証明書を請求するクライアント。
//!
//! ## コマンド
//! - `quizcert keygen` — 新しい鍵とアドレスを生成
//! - `quizcert claim` — 合格判定 → Attestation署名 → `POST /api/mint-certificate`
//! - `quizcert certificates <address>` — 保有証明書の一覧
//! - `quizcert info` — Gatewayの検証ポリシーとミント設定

mod client;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{certificates, claim, info, keygen};

#[derive(Parser, Debug)]
#[command(name = "quizcert", version, about = "クイズ合格証明書（NFT）の請求クライアント")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 新しい秘密鍵とアドレスを生成する
    Keygen(keygen::KeygenArgs),
    /// クイズ結果に署名して証明書を請求する
    Claim(claim::ClaimArgs),
    /// アドレスが保有する証明書を表示する
    Certificates(certificates::CertificatesArgs),
    /// Gatewayの検証ポリシーを表示する
    Info(info::InfoArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Keygen(args) => keygen::run(args),
        Commands::Claim(args) => claim::run(args).await,
        Commands::Certificates(args) => certificates::run(args).await,
        Commands::Info(args) => info::run(args).await,
    }
}
