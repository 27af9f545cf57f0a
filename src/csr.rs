use std::{result, string::FromUtf8Error};

use openssl::{error::ErrorStack, sha::sha1, stack::Stack, x509::X509Req};
use thiserror::Error;
use tracing::{info, instrument};

use crate::{
    key_pair::{KeyError, PrivateKey},
    san::SubjectAltNames,
    signature::{sign_request, signing_error, SignatureError},
    subject::{SubjectAttributes, SubjectError},
    validation::ValidationError,
};

/// 用於描述建立 CSR（證書簽名請求）過程中可能發生的錯誤。
#[derive(Debug, Error)]
pub enum CsrError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Key error: {0}")]
    Key(#[from] KeyError),
    #[error("Signature error: {0}")]
    Signature(#[from] SignatureError),
    #[error("UTF-8 error: {0}")]
    Utf8Error(#[from] FromUtf8Error),
    #[error("Openssl error: {0}")]
    OpensslError(#[from] ErrorStack),
}

impl From<SubjectError> for CsrError {
    fn from(e: SubjectError) -> Self {
        match e {
            SubjectError::Validation(e) => CsrError::Validation(e),
            SubjectError::OpenSsl(e) => signing_error("building subject name")(e).into(),
        }
    }
}

/// 為簡化錯誤處理定義 Result 類型
type Result<T> = result::Result<T, CsrError>;

/// 已簽署的 PKCS#10 證書簽名請求。
///
/// DER 與 PEM 來自同一次簽署，建立後不再變動。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRequest {
    der: Vec<u8>,
    pem: String,
}

impl CertificateRequest {
    /// 從 PEM 文字讀回 CSR，PEM 會重新以標準格式輸出。
    ///
    /// # 錯誤
    ///
    /// 找不到 `CERTIFICATE REQUEST` 區塊或內容不是合法的 PKCS#10 結構時回傳
    /// [`CsrError::OpensslError`]。
    pub fn from_pem(text: &str) -> Result<Self> {
        let req = X509Req::from_pem(text.as_bytes())?;
        Ok(Self {
            der: req.to_der()?,
            pem: String::from_utf8(req.to_pem()?)?,
        })
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// 以 `-----BEGIN CERTIFICATE REQUEST-----` 開頭、換行結尾的 PEM 文字。
    pub fn pem(&self) -> &str {
        &self.pem
    }

    pub fn into_pem(self) -> String {
        self.pem
    }

    /// PEM 文字的 SHA-1 十六進位摘要，可作為請求的識別碼。
    pub fn id(&self) -> String {
        sha1(self.pem.as_bytes())
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    /// 解析為 OpenSSL 的 `X509Req`。
    pub fn to_x509_req(&self) -> Result<X509Req> {
        Ok(X509Req::from_der(&self.der)?)
    }

    /// 以請求內嵌的公鑰驗證簽名。
    pub fn verify(&self) -> Result<bool> {
        let req = self.to_x509_req()?;
        let public_key = req.public_key()?;
        Ok(req.verify(&public_key)?)
    }

    /// 請求內嵌公鑰的 SubjectPublicKeyInfo PEM。
    pub fn public_key_pem(&self) -> Result<Vec<u8>> {
        Ok(self.to_x509_req()?.public_key()?.public_key_to_pem()?)
    }

    /// 讀回請求中的主體屬性。
    pub fn subject(&self) -> Result<SubjectAttributes> {
        let req = self.to_x509_req()?;
        Ok(SubjectAttributes::from_x509_name(req.subject_name())?)
    }
}

/// 表示一個 CSR 建構器，收集主體屬性與 SAN 後以私鑰簽署。
///
/// # 範例
///
/// ```
/// # use tls_cert_request::csr::CertRequestBuilder;
/// # use tls_cert_request::key_pair::{KeyAlgorithm, PrivateKey};
/// # use tls_cert_request::san::SubjectAltNames;
/// # use tls_cert_request::subject::SubjectAttributes;
/// let pem = std::fs::read("tests/fixtures/ed25519.pem").expect("讀取私鑰失敗");
/// let key = PrivateKey::from_pem(KeyAlgorithm::Ed25519, &pem).expect("私鑰解析失敗");
/// let csr = CertRequestBuilder::new()
///     .subject(SubjectAttributes {
///         common_name: "example.com".to_owned(),
///         ..Default::default()
///     })
///     .subject_alt_names(SubjectAltNames::new().dns("example.com"))
///     .build(&key)
///     .expect("CSR 建立失敗");
/// assert!(csr.pem().starts_with("-----BEGIN CERTIFICATE REQUEST-----\n"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CertRequestBuilder {
    subject: SubjectAttributes,
    sans: SubjectAltNames,
}

impl CertRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subject(mut self, subject: SubjectAttributes) -> Self {
        self.subject = subject;
        self
    }

    pub fn subject_alt_names(mut self, sans: SubjectAltNames) -> Self {
        self.sans = sans;
        self
    }

    /// 以指定私鑰簽署並輸出 CSR，見 [`build_cert_request`]。
    pub fn build(&self, key: &PrivateKey) -> Result<CertificateRequest> {
        build_cert_request(&self.subject, &self.sans, key)
    }
}

/// 根據主體屬性、SAN 與私鑰建構並簽署 CSR。
///
/// 主體在任何簽署動作前完成驗證；SAN 擴展只有在至少一個 SAN 列表非空時才會加入。
/// 簽名只計算一次，DER 與 PEM 皆由同一份結果導出。
///
/// # 參數
///
/// * `subject` - 主體屬性，未提供的欄位不會出現在 DN 中。
/// * `sans` - 已解析的主體替代名稱。
/// * `key` - 用於簽署的私鑰，其變體決定簽名演算法。
///
/// # 錯誤
///
/// * [`CsrError::Validation`] - 主體屬性的值不合法。
/// * [`CsrError::Signature`] - ECDSA 曲線不受支援，或 OpenSSL 在組裝、簽署或編碼時失敗。
#[instrument(skip_all, fields(algorithm = %key.algorithm()))]
pub fn build_cert_request(
    subject: &SubjectAttributes,
    sans: &SubjectAltNames,
    key: &PrivateKey,
) -> Result<CertificateRequest> {
    let name = subject.to_x509_name()?;

    let mut req_builder = X509Req::builder().map_err(signing_error("creating request"))?;
    req_builder
        .set_version(0)
        .map_err(signing_error("setting request version"))?;
    req_builder
        .set_subject_name(&name)
        .map_err(signing_error("setting subject name"))?;

    let san_extension = sans
        .to_extension(&req_builder.x509v3_context(None))
        .map_err(signing_error("building subject alternative name extension"))?;
    if let Some(san_extension) = san_extension {
        let mut stack = Stack::new().map_err(signing_error("adding extensions"))?;
        stack
            .push(san_extension)
            .map_err(signing_error("adding extensions"))?;
        req_builder
            .add_extensions(&stack)
            .map_err(signing_error("adding extensions"))?;
    }

    req_builder
        .set_pubkey(key.pkey())
        .map_err(signing_error("setting public key"))?;
    sign_request(&mut req_builder, key)?;

    let req = req_builder.build();
    let der = req.to_der().map_err(signing_error("encoding request"))?;
    let pem = req.to_pem().map_err(signing_error("encoding request"))?;
    let request = CertificateRequest {
        der,
        pem: String::from_utf8(pem)?,
    };

    info!(
        id = %request.id(),
        der_len = request.der.len(),
        "built certificate request"
    );
    Ok(request)
}
