//! # claim
//!
//! クイズ結果に署名し、Gatewayに証明書NFTを請求する。
//!
//! ## 処理フロー
//! 1. 合格判定（正答率60%以上）
//! 2. LocalWalletで接続し、Attestationを構築・署名
//! 3. `POST /api/mint-certificate`
//! 4. トークンIDとトランザクションハッシュを表示

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use quizcert_core::{
    is_eligible, percentage, AttestationBuilder, LocalWallet, QuizResult, WalletSession,
    PASSING_PERCENTAGE,
};
use quizcert_types::{Category, Difficulty, MintCertificateResponse};

use crate::client::GatewayClient;

#[derive(Args, Debug, Clone)]
pub struct ClaimArgs {
    /// GatewayのベースURL
    #[arg(long, env = "QUIZCERT_GATEWAY", default_value = "http://localhost:3000")]
    pub gateway: String,

    /// 署名に使う秘密鍵（16進数）
    #[arg(long, env = "QUIZCERT_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    /// クイズの表示タイトル
    #[arg(long)]
    pub quiz: String,

    /// 正答数
    #[arg(long)]
    pub score: u32,

    /// 問題数
    #[arg(long)]
    pub total_questions: u32,

    /// 難易度（beginner / intermediate / advanced）
    #[arg(long)]
    pub difficulty: Difficulty,

    /// カテゴリ（typescript / solidity / docker / javascript / react / nodejs）
    #[arg(long)]
    pub category: Category,

    /// 署名待ちの上限（秒）
    #[arg(long)]
    pub signing_timeout_secs: Option<u64>,
}

pub async fn run(args: ClaimArgs) -> Result<()> {
    let response = execute(&args).await?;

    println!("{}", response.message);
    println!("Token ID:         {}", response.token_id);
    println!("Transaction hash: {}", response.transaction_hash);
    Ok(())
}

/// 請求を実行し、Gatewayのレスポンスを返す。
pub async fn execute(args: &ClaimArgs) -> Result<MintCertificateResponse> {
    // Step 1: 合格判定
    if !is_eligible(args.score, args.total_questions) {
        bail!(
            "合格基準（{}%）に達していないため証明書を請求できません: {}/{}（{}%）",
            PASSING_PERCENTAGE,
            args.score,
            args.total_questions,
            percentage(args.score, args.total_questions)
        );
    }

    // Step 2: 署名
    let wallet = LocalWallet::from_hex(&args.private_key).context("秘密鍵の形式が不正です")?;
    let session = WalletSession::connect(wallet).await?;

    let mut builder = AttestationBuilder::new();
    if let Some(secs) = args.signing_timeout_secs {
        builder = builder.with_signing_timeout(Duration::from_secs(secs));
    }

    let result = QuizResult {
        quiz: args.quiz.clone(),
        score: args.score,
        total_questions: args.total_questions,
        difficulty: args.difficulty,
        category: args.category,
    };
    let signed = builder.build(&session, &result).await?;
    tracing::info!(
        recipient = %signed.recipient.to_checksum(None),
        quiz = %result.quiz,
        percentage = signed.attestation.percentage,
        "Attestationに署名しました"
    );

    // Step 3: 請求
    let response = GatewayClient::new(&args.gateway)
        .mint_certificate(&signed.to_request())
        .await?;

    session.disconnect();
    Ok(response)
}
