use openssl::{error::ErrorStack, hash::MessageDigest, nid::Nid, x509::X509ReqBuilder};
use thiserror::Error;

use crate::key_pair::PrivateKey;

/// 定義簽名操作可能遇到的錯誤類型。
#[derive(Debug, Error)]
pub enum SignatureError {
    /// OpenSSL 在指定階段失敗。
    #[error("Signing error while {stage}: {source}")]
    Signing {
        stage: &'static str,
        #[source]
        source: ErrorStack,
    },
    /// ECDSA 私鑰使用了沒有對應摘要演算法的曲線。
    #[error("Unsupported elliptic curve: {0}")]
    UnsupportedCurve(String),
}

type Result<T> = std::result::Result<T, SignatureError>;

pub(crate) fn signing_error(stage: &'static str) -> impl FnOnce(ErrorStack) -> SignatureError {
    move |source| SignatureError::Signing { stage, source }
}

/// 依私鑰選擇 CSR 簽名所用的摘要演算法。
///
/// | 私鑰 | 摘要 |
/// | --- | --- |
/// | RSA | SHA-256 |
/// | ECDSA P-256 / P-384 / P-521 | SHA-256 / SHA-384 / SHA-512 |
/// | Ed25519 | 無（PureEdDSA） |
///
/// # 錯誤
///
/// ECDSA 私鑰不在上述曲線時回傳 [`SignatureError::UnsupportedCurve`]。
pub fn message_digest(key: &PrivateKey) -> Result<MessageDigest> {
    match key {
        PrivateKey::Rsa(_) => Ok(MessageDigest::sha256()),
        PrivateKey::Ecdsa(pkey) => {
            let ec_key = pkey.ec_key().map_err(signing_error("reading EC key"))?;
            match ec_key.group().curve_name() {
                Some(Nid::X9_62_PRIME256V1) => Ok(MessageDigest::sha256()),
                Some(Nid::SECP384R1) => Ok(MessageDigest::sha384()),
                Some(Nid::SECP521R1) => Ok(MessageDigest::sha512()),
                Some(nid) => Err(SignatureError::UnsupportedCurve(
                    nid.short_name().unwrap_or("unknown").to_owned(),
                )),
                None => Err(SignatureError::UnsupportedCurve("unnamed".to_owned())),
            }
        }
        PrivateKey::Ed25519(_) => Ok(MessageDigest::null()),
    }
}

/// 以私鑰簽署請求範本；公鑰需事先設定於 `builder`。
pub fn sign_request(builder: &mut X509ReqBuilder, key: &PrivateKey) -> Result<()> {
    let digest = message_digest(key)?;
    builder
        .sign(key.pkey(), digest)
        .map_err(signing_error("signing request"))
}
