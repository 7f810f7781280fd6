//! # keygen
//!
//! 新しいsecp256k1秘密鍵を生成し、秘密鍵とEIP-55アドレスを表示する。

use anyhow::Result;
use clap::Args;
use quizcert_core::LocalWallet;

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// JSONで出力する
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: KeygenArgs) -> Result<()> {
    let wallet = LocalWallet::random();
    let address = wallet.local_address().to_checksum(None);
    let private_key = wallet.private_key_hex();

    if args.json {
        let output = serde_json::json!({
            "address": address,
            "privateKey": private_key,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Address:     {address}");
        println!("Private key: {private_key}");
        println!();
        println!("秘密鍵は QUIZCERT_PRIVATE_KEY に設定して claim で使用できます。");
    }
    Ok(())
}
