//! # 証明書コントラクトのABI
//!
//! Gatewayが呼び出す関数とイベントのみを宣言する。

use alloy_sol_types::sol;

sol! {
    /// `getCertificateData` が返す証明書の内容
    #[derive(Debug, PartialEq, Eq)]
    struct CertificateData {
        string quizName;
        uint256 score;
        uint256 totalQuestions;
        uint256 timestamp;
        string difficulty;
        string category;
    }

    function mintCertificate(
        address to,
        string quizName,
        uint256 score,
        uint256 totalQuestions,
        string difficulty,
        string category
    ) external returns (uint256 tokenId);

    function getCertificatesOf(address owner) external view returns (uint256[] memory);

    function getCertificateData(uint256 tokenId) external view returns (CertificateData memory);

    /// ERC-721の所有権移転（ミント時は `from` がゼロアドレス）
    event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
}
