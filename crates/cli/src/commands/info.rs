//! # info
//!
//! `GET /.well-known/quizcert-info` でGatewayの検証ポリシーとミント設定を表示する。

use anyhow::Result;
use clap::Args;
use quizcert_types::ServiceInfo;

use crate::client::GatewayClient;

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// GatewayのベースURL
    #[arg(long, env = "QUIZCERT_GATEWAY", default_value = "http://localhost:3000")]
    pub gateway: String,

    /// JSONで出力する
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: InfoArgs) -> Result<()> {
    let info = GatewayClient::new(&args.gateway).service_info().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print!("{}", render(&info));
    }
    Ok(())
}

fn render(info: &ServiceInfo) -> String {
    let yes_no = |flag: bool| if flag { "有効" } else { "無効" };
    let mut out = String::new();
    out.push_str(&format!("合格ライン: {}%\n", info.passing_percentage));
    out.push_str(&format!(
        "Attestation有効期間: {}秒\n",
        info.max_attestation_age_ms / 1000
    ));
    out.push_str(&format!("署名必須: {}\n", yes_no(info.signature_required)));
    out.push_str(&format!("リプレイ防止: {}\n", yes_no(info.replay_protection)));
    out.push_str(&format!("ミント: {}\n", info.minter));
    if let Some(contract) = &info.contract_address {
        out.push_str(&format!("コントラクト: {contract}\n"));
    }
    out
}
