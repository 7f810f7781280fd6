//! # POST /api/mint-certificate
//!
//! 署名付きAttestationを検証し、証明書NFTをミントする。
//!
//! ## 処理フロー
//! 1. ボディをデコードする（デコード不能は400）
//! 2. Attestation Verifierで検証する（入力不正は400、信頼性の失敗は403）
//! 3. リプレイ防止: 同一Attestationを予約する（使用済みは403）
//! 4. ミントする（失敗時は予約を取り消して500）
//! 5. `{success, tokenId, transactionHash, message}` を返す

mod handler;


pub use handler::handle_mint_certificate;
