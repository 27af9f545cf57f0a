//! # TLS Certificate Request Library
//!
//! 本庫根據宣告式的主體屬性、主體替代名稱 (SAN) 與呼叫端提供的私鑰，
//! 建構並簽署 PKCS#10 證書簽名請求 (CSR)，輸出 DER 與 PEM。
//!
//! - **subject / san**: 將可省略的命名屬性與三種 SAN（DNS、IP、URI）轉換為 X.509 的 DN 與擴展，
//!   未提供的欄位不會出現在輸出中，多值欄位保留原始順序。
//! - **key_pair / signature**: 依宣告的演算法（RSA、ECDSA、Ed25519）解析私鑰，
//!   拒絕與宣告不符的金鑰，並選擇對應的簽名摘要。
//! - **csr**: 組裝請求、簽署一次後輸出 DER，並由同一份請求產生 `CERTIFICATE REQUEST` PEM。
//! - **config**: 以 JSON 描述整個請求，一次呼叫完成上述流程。
//!
//! 每次建構都是純函式：沒有共享的可變狀態，可在多個執行緒中同時進行。
//!
//! ## 示例
//!
//! ```rust
//! use tls_cert_request::{
//!     build_cert_request, KeyAlgorithm, PrivateKey, SubjectAltNames, SubjectAttributes,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let key_pem = std::fs::read("tests/fixtures/rsa_2048.pem")?;
//!     let key = PrivateKey::from_pem(KeyAlgorithm::Rsa, &key_pem)?;
//!
//!     let subject = SubjectAttributes {
//!         common_name: "example.com".to_owned(),
//!         organization: vec!["Example, Inc".to_owned()],
//!         ..Default::default()
//!     };
//!     let sans = SubjectAltNames::parse(
//!         &["example.com", "example.net"],
//!         &["127.0.0.1"],
//!         &["spiffe://example-trust-domain/workload"],
//!     )?;
//!
//!     let csr = build_cert_request(&subject, &sans, &key)?;
//!     assert!(csr.pem().starts_with("-----BEGIN CERTIFICATE REQUEST-----"));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod csr;
pub mod key_pair;
pub mod san;
pub mod signature;
pub mod subject;
pub mod validation;

pub use config::{CertRequestConfig, ConfigError};
pub use csr::{build_cert_request, CertRequestBuilder, CertificateRequest, CsrError};
pub use key_pair::{KeyAlgorithm, KeyError, PrivateKey};
pub use san::{SubjectAltNames, UriName};
pub use signature::SignatureError;
pub use subject::SubjectAttributes;
pub use validation::ValidationError;
