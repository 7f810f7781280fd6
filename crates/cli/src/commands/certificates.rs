//! # certificates
//!
//! `GET /api/certificates/{address}` でアドレスの保有証明書を表示する。

use anyhow::{Context, Result};
use clap::Args;
use quizcert_crypto::parse_address;

use crate::client::GatewayClient;

#[derive(Args, Debug)]
pub struct CertificatesArgs {
    /// 照会するアドレス（0x + 40桁）
    pub address: String,

    /// GatewayのベースURL
    #[arg(long, env = "QUIZCERT_GATEWAY", default_value = "http://localhost:3000")]
    pub gateway: String,

    /// JSONで出力する
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: CertificatesArgs) -> Result<()> {
    let owner = parse_address(&args.address)
        .with_context(|| format!("アドレスの形式が不正です: {}", args.address))?;

    let response = GatewayClient::new(&args.gateway)
        .certificates(&owner)
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if response.certificates.is_empty() {
        println!("{} は証明書を保有していません", response.address);
        return Ok(());
    }

    println!("{} の証明書（{}件）", response.address, response.certificates.len());
    for cert in &response.certificates {
        println!(
            "  #{} {} {}/{} [{} / {}] minted at {}",
            cert.token_id,
            cert.quiz_name,
            cert.score,
            cert.total_questions,
            cert.difficulty,
            cert.category,
            cert.timestamp,
        );
    }
    Ok(())
}
