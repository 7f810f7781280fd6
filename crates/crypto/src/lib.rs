//! # Quiz Certificate 暗号処理
//!
//! ウォレットの `personal_sign`（EIP-191 version 0x45）と互換の署名・署名者復元を提供する。
//! アドレス・署名・Keccak-256は `alloy-primitives` の型をそのまま使う。
//!
//! ## 暗号アルゴリズム
//! | 用途 | アルゴリズム |
//! |------|------------|
//! | 署名 | ECDSA secp256k1（公開鍵復元可能、low-S） |
//! | ハッシュ | Keccak-256 |
//! | アドレス | keccak256(公開鍵)の下位20バイト、EIP-55表記 |
//!
//! ## 署名対象
//! `keccak256("\x19Ethereum Signed Message:\n" || len(message) || message)`
//! （`len` はバイト長の10進表記）

use k256::ecdsa::SigningKey;

pub use alloy_primitives::{keccak256, Address, Signature, B256};
pub use k256::ecdsa::SigningKey as Secp256k1SigningKey;

/// 暗号処理のエラー型
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// アドレス形式が不正
    #[error("アドレスの形式が不正です: {0}")]
    MalformedAddress(String),
    /// 署名のエンコーディングが不正（16進数・長さ・r/s）
    #[error("署名の形式が不正です: {0}")]
    MalformedSignature(String),
    /// リカバリID（v）が不正
    #[error("署名のリカバリIDが不正です: {0}")]
    InvalidRecoveryId(u8),
    /// 署名から公開鍵を復元できない
    #[error("署名から公開鍵を復元できませんでした: {0}")]
    RecoveryFailed(String),
    /// 署名生成に失敗
    #[error("署名の生成に失敗しました")]
    SigningFailed,
    /// 秘密鍵が不正
    #[error("秘密鍵が不正です: {0}")]
    InvalidPrivateKey(String),
}

/// アドレス長（バイト）
pub const ADDRESS_LEN: usize = 20;

/// 署名長（r: 32 + s: 32 + v: 1）
pub const SIGNATURE_LEN: usize = 65;

/// personal_sign形式のメッセージハッシュを計算する。
pub fn hash_personal_message(message: &[u8]) -> B256 {
    alloy_primitives::eip191_hash_message(message)
}

/// `0x` + 40桁の16進数をアドレスとしてパースする。
///
/// 大文字小文字は問わず、チェックサムは検証しない。
pub fn parse_address(s: &str) -> Result<Address, CryptoError> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| CryptoError::MalformedAddress(s.to_string()))?;
    if digits.len() != ADDRESS_LEN * 2 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CryptoError::MalformedAddress(s.to_string()));
    }
    digits
        .parse()
        .map_err(|_| CryptoError::MalformedAddress(s.to_string()))
}

/// personal_sign署名（r || s || v の16進数、`0x` 任意）をパースする。
///
/// `v` は 0/1 と 27/28 のみ受け付ける。
pub fn parse_signature(s: &str) -> Result<Signature, CryptoError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits)
        .map_err(|e| CryptoError::MalformedSignature(format!("16進数デコードに失敗: {e}")))?;
    if bytes.len() != SIGNATURE_LEN {
        return Err(CryptoError::MalformedSignature(format!(
            "署名は{SIGNATURE_LEN}バイトである必要があります（実際: {}バイト）",
            bytes.len()
        )));
    }

    let v = bytes[SIGNATURE_LEN - 1];
    if !matches!(v, 0 | 1 | 27 | 28) {
        return Err(CryptoError::InvalidRecoveryId(v));
    }
    Signature::from_raw(&bytes).map_err(|e| CryptoError::MalformedSignature(e.to_string()))
}

/// 署名を `0x` プレフィックス付き16進数（v = 27/28）で返す。
pub fn signature_to_hex(signature: &Signature) -> String {
    format!("0x{}", hex::encode(signature.as_bytes()))
}

/// personal_sign署名を生成する。
pub fn sign_personal_message(
    signing_key: &SigningKey,
    message: &[u8],
) -> Result<Signature, CryptoError> {
    let prehash = hash_personal_message(message);
    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(prehash.as_slice())
        .map_err(|_| CryptoError::SigningFailed)?;

    let mut bytes = [0u8; SIGNATURE_LEN];
    bytes[..64].copy_from_slice(&signature.to_bytes());
    bytes[64] = 27 + recovery_id.to_byte();
    Signature::from_raw(&bytes).map_err(|_| CryptoError::SigningFailed)
}

/// personal_sign署名から署名者のアドレスを復元する。
pub fn recover_personal_signer(
    message: &[u8],
    signature: &Signature,
) -> Result<Address, CryptoError> {
    signature
        .recover_address_from_msg(message)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))
}

/// 秘密鍵（32バイトの16進数、`0x` 任意）をパースする。
pub fn signing_key_from_hex(s: &str) -> Result<SigningKey, CryptoError> {
    let digits = s.trim().strip_prefix("0x").unwrap_or(s.trim());
    let bytes = hex::decode(digits)
        .map_err(|e| CryptoError::InvalidPrivateKey(format!("16進数デコードに失敗: {e}")))?;
    if bytes.len() != 32 {
        return Err(CryptoError::InvalidPrivateKey(format!(
            "秘密鍵は32バイトである必要があります（実際: {}バイト）",
            bytes.len()
        )));
    }
    SigningKey::from_slice(&bytes).map_err(|_| {
        CryptoError::InvalidPrivateKey("secp256k1のスカラー範囲外です".to_string())
    })
}

/// 秘密鍵を `0x` プレフィックス付き16進数で返す。
pub fn signing_key_to_hex(signing_key: &SigningKey) -> String {
    format!("0x{}", hex::encode(signing_key.to_bytes()))
}

/// 新しい秘密鍵をOS乱数から生成する。
pub fn generate_signing_key() -> SigningKey {
    SigningKey::random(&mut rand::rngs::OsRng)
}

/// 秘密鍵に対応するアドレスを返す。
pub fn address_of(signing_key: &SigningKey) -> Address {
    Address::from_private_key(signing_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 秘密鍵 0x...01 のアドレス（よく知られた値）
    const KEY_ONE_ADDRESS: &str = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";

    /// EIP-55の公式テストベクタ
    const EIP55_VECTORS: [&str; 4] = [
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];

    fn key_one() -> SigningKey {
        signing_key_from_hex(
            "0x0000000000000000000000000000000000000000000000000000000000000001",
        )
        .unwrap()
    }

    #[test]
    fn test_keccak256_empty() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_address_of_known_key() {
        assert_eq!(address_of(&key_one()).to_checksum(None), KEY_ONE_ADDRESS);
    }

    #[test]
    fn test_checksum_vectors() {
        for expected in EIP55_VECTORS {
            let addr = parse_address(&expected.to_lowercase()).unwrap();
            assert_eq!(addr.to_checksum(None), expected);
        }
    }

    /// 大文字小文字が異なっても同一アドレスとして扱われることを確認
    #[test]
    fn test_address_case_insensitive() {
        let mixed = parse_address(EIP55_VECTORS[0]).unwrap();
        let lower = parse_address(&EIP55_VECTORS[0].to_lowercase()).unwrap();
        let upper = parse_address(&format!("0x{}", &EIP55_VECTORS[0][2..].to_uppercase())).unwrap();
        assert_eq!(mixed, lower);
        assert_eq!(mixed, upper);
    }

    #[test]
    fn test_parse_address_rejects_malformed() {
        let cases = [
            "",
            "0x",
            "5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0X5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAe",
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed00",
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeg",
            " 0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        ];
        for case in cases {
            assert!(
                matches!(parse_address(case), Err(CryptoError::MalformedAddress(_))),
                "不正なアドレスが受理された: {case:?}"
            );
        }
    }

    /// 署名 → 復元で署名者のアドレスが得られることを確認
    #[test]
    fn test_sign_recover_roundtrip() {
        let key = generate_signing_key();
        let message = br#"{"quiz":"Docker 101","score":5}"#;

        let signature = sign_personal_message(&key, message).unwrap();
        assert!(matches!(signature.as_bytes()[64], 27 | 28));

        let recovered = recover_personal_signer(message, &signature).unwrap();
        assert_eq!(recovered, address_of(&key));
    }

    /// 16進数エンコード経由でも復元できることを確認
    #[test]
    fn test_signature_hex_roundtrip() {
        let signature = sign_personal_message(&key_one(), b"hello").unwrap();

        let hex_sig = signature_to_hex(&signature);
        assert!(hex_sig.starts_with("0x"));
        assert_eq!(hex_sig.len(), 2 + SIGNATURE_LEN * 2);

        let parsed = parse_signature(&hex_sig).unwrap();
        assert_eq!(parsed, signature);
        let unprefixed = parse_signature(&hex_sig[2..]).unwrap();
        assert_eq!(unprefixed, signature);

        let recovered = recover_personal_signer(b"hello", &parsed).unwrap();
        assert_eq!(recovered.to_checksum(None), KEY_ONE_ADDRESS);
    }

    /// v = 0/1 形式の署名も受理されることを確認
    #[test]
    fn test_recovery_id_zero_one_form() {
        let signature = sign_personal_message(&key_one(), b"hello").unwrap();

        let mut bytes = signature.as_bytes();
        bytes[64] -= 27;
        let parsed = parse_signature(&hex::encode(bytes)).unwrap();
        let recovered = recover_personal_signer(b"hello", &parsed).unwrap();
        assert_eq!(recovered.to_checksum(None), KEY_ONE_ADDRESS);
    }

    /// 別のメッセージに対しては別のアドレスが復元されることを確認
    #[test]
    fn test_recover_different_message() {
        let signature = sign_personal_message(&key_one(), b"hello").unwrap();

        if let Ok(addr) = recover_personal_signer(b"hello!", &signature) {
            assert_ne!(addr.to_checksum(None), KEY_ONE_ADDRESS);
        }
    }

    /// 署名の任意の1ビット変異で、復元が失敗するか別のアドレスになることを確認
    #[test]
    fn test_single_bit_mutation_never_recovers_signer() {
        let key = generate_signing_key();
        let signer = address_of(&key);
        let message = b"single bit mutation";
        let signature = sign_personal_message(&key, message).unwrap();

        for byte in 0..SIGNATURE_LEN {
            for bit in 0..8 {
                let mut bytes = signature.as_bytes();
                bytes[byte] ^= 1 << bit;

                let Ok(mutated) = parse_signature(&hex::encode(bytes)) else {
                    continue;
                };
                if let Ok(addr) = recover_personal_signer(message, &mutated) {
                    assert_ne!(addr, signer, "byte {byte} bit {bit} の変異で署名者が復元された");
                }
            }
        }
    }

    #[test]
    fn test_malformed_signatures() {
        assert!(matches!(
            parse_signature("0xzz"),
            Err(CryptoError::MalformedSignature(_))
        ));
        assert!(matches!(
            parse_signature(&format!("0x{}", "ab".repeat(64))),
            Err(CryptoError::MalformedSignature(_))
        ));

        let mut bytes = [1u8; SIGNATURE_LEN];
        bytes[64] = 29;
        assert!(matches!(
            parse_signature(&hex::encode(bytes)),
            Err(CryptoError::InvalidRecoveryId(29))
        ));
        bytes[64] = 37;
        assert!(matches!(
            parse_signature(&hex::encode(bytes)),
            Err(CryptoError::InvalidRecoveryId(37))
        ));

        // r = s = 0 からは公開鍵を復元できない
        let mut zero = [0u8; SIGNATURE_LEN];
        zero[64] = 27;
        let rejected = parse_signature(&hex::encode(zero))
            .and_then(|sig| recover_personal_signer(b"m", &sig));
        assert!(rejected.is_err());
    }

    #[test]
    fn test_signing_key_hex_roundtrip() {
        let key = generate_signing_key();
        let encoded = signing_key_to_hex(&key);
        let decoded = signing_key_from_hex(&encoded).unwrap();
        assert_eq!(address_of(&decoded), address_of(&key));

        assert!(signing_key_from_hex("0x1234").is_err());
        assert!(signing_key_from_hex(&format!("0x{}", "00".repeat(32))).is_err());
    }

    /// ハッシュにメッセージのバイト長（文字数ではない）が使われることを確認
    #[test]
    fn test_personal_hash_uses_byte_length() {
        let message = "日本語".as_bytes();
        let mut expected_input = Vec::new();
        expected_input.extend_from_slice(b"\x19Ethereum Signed Message:\n9");
        expected_input.extend_from_slice(message);
        assert_eq!(hash_personal_message(message), keccak256(&expected_input));
    }
}
