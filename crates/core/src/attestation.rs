//! # ResultAttestation エンコーディング
//!
//! 署名対象は `serde_json` のコンパクト出力そのもの。キー順は
//! [`ResultAttestation`] のフィールド宣言順で固定される。

use std::time::{SystemTime, UNIX_EPOCH};

use quizcert_types::ResultAttestation;

/// 証明書を請求できる最低正答率（%）
pub const PASSING_PERCENTAGE: u32 = 60;

/// 正答率（%）を計算する。
///
/// Webクライアントの `Math.round(score / totalQuestions * 100)` と同じ
/// 浮動小数点演算で丸めるため、署名済みの値と必ず一致する。
/// `total_questions == 0` の場合は0を返す。
pub fn percentage(score: u32, total_questions: u32) -> u32 {
    if total_questions == 0 {
        return 0;
    }
    let ratio = f64::from(score) / f64::from(total_questions) * 100.0;
    ratio.round() as u32
}

/// 証明書請求の資格があるか（正答率が [`PASSING_PERCENTAGE`] 以上）。
pub fn is_eligible(score: u32, total_questions: u32) -> bool {
    total_questions > 0
        && score <= total_questions
        && percentage(score, total_questions) >= PASSING_PERCENTAGE
}

/// 正規エンコーディング（コンパクトJSON）を返す。
pub fn encode(attestation: &ResultAttestation) -> Result<String, serde_json::Error> {
    serde_json::to_string(attestation)
}

/// 正規エンコーディングをパースする。未知のキーは無視する。
pub fn parse(message: &str) -> Result<ResultAttestation, serde_json::Error> {
    serde_json::from_str(message)
}

/// 現在時刻（UNIXミリ秒）。
pub fn unix_time_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
