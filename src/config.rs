use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::{
    csr::{build_cert_request, CertificateRequest, CsrError},
    key_pair::{KeyAlgorithm, PrivateKey},
    san::SubjectAltNames,
    subject::SubjectAttributes,
};

/// 讀取或執行請求描述時可能發生的錯誤。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Serde JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Certificate request error: {0}")]
    Request(#[from] CsrError),
}

type Result<T> = std::result::Result<T, ConfigError>;

/// 宣告式的 CSR 描述，欄位名稱與主機端傳入的記錄一致。
///
/// 除 `private_key_pem` 外皆可省略；`key_algorithm` 省略時由私鑰本身推斷。
///
/// ```
/// # use tls_cert_request::config::CertRequestConfig;
/// let key_pem = std::fs::read_to_string("tests/fixtures/ed25519.pem").expect("讀取私鑰失敗");
/// let config = CertRequestConfig::from_json(&format!(
///     r#"{{
///         "subject": {{ "serial_number": "42" }},
///         "key_algorithm": "ED25519",
///         "private_key_pem": {:?}
///     }}"#,
///     key_pem,
/// ))
/// .expect("設定解析失敗");
/// let csr = config.build().expect("CSR 建立失敗");
/// assert!(csr.verify().unwrap());
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CertRequestConfig {
    #[serde(default)]
    pub subject: SubjectAttributes,
    #[serde(default)]
    pub dns_names: Vec<String>,
    #[serde(default)]
    pub ip_addresses: Vec<String>,
    #[serde(default)]
    pub uris: Vec<String>,
    #[serde(default)]
    pub key_algorithm: Option<String>,
    pub private_key_pem: String,
}

impl CertRequestConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 依序驗證 SAN、解析演算法與私鑰，再簽署請求。
    ///
    /// 任何一步失敗都不會產生輸出。
    pub fn build(&self) -> Result<CertificateRequest> {
        let sans = SubjectAltNames::parse(&self.dns_names, &self.ip_addresses, &self.uris)
            .map_err(CsrError::from)?;

        let key = match self.key_algorithm.as_deref() {
            Some(tag) => {
                let algorithm: KeyAlgorithm = tag.parse().map_err(CsrError::from)?;
                PrivateKey::from_pem(algorithm, self.private_key_pem.as_bytes())
            }
            None => PrivateKey::from_pem_inferred(self.private_key_pem.as_bytes()),
        }
        .map_err(CsrError::from)?;

        debug!(
            algorithm = %key.algorithm(),
            declared = self.key_algorithm.is_some(),
            "resolved signing key"
        );
        Ok(build_cert_request(&self.subject, &sans, &key)?)
    }
}
