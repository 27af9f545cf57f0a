use std::{fmt, net::IpAddr, str::FromStr};

use openssl::{
    error::ErrorStack,
    x509::{extension::SubjectAlternativeName, X509Extension, X509v3Context},
};
use tracing::debug;
use url::Url;

use crate::validation::{FieldPath, ValidationError};

type Result<T> = std::result::Result<T, ValidationError>;

/// URI 形式的 SAN。
///
/// 輸出時使用呼叫端提供的原始文字，[`Url`] 只用來確認它是絕對 URI。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriName {
    text: String,
    url: Url,
}

impl UriName {
    /// 寫入 CSR 的原始文字。
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl From<Url> for UriName {
    fn from(url: Url) -> Self {
        Self {
            text: url.as_str().to_owned(),
            url,
        }
    }
}

impl fmt::Display for UriName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// 主體替代名稱 (SAN)，包含三個彼此獨立、保留順序的列表。
///
/// 任一列表皆可為空；三者皆為空時，CSR 不會帶有 SAN 擴展。
///
/// # 範例
///
/// ```
/// # use tls_cert_request::san::SubjectAltNames;
/// let sans = SubjectAltNames::parse(
///     &["example.com"],
///     &["127.0.0.1", "::1"],
///     &["spiffe://example-trust-domain/workload"],
/// )
/// .expect("SAN 解析失敗");
/// assert_eq!(sans.ip_addresses.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectAltNames {
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
    pub uris: Vec<UriName>,
}

impl SubjectAltNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// 從文字形式解析三個 SAN 列表。
    ///
    /// # 參數
    ///
    /// - `dns_names`: DNS 名稱，必須為非空的 ASCII 字串。
    /// - `ip_addresses`: IPv4 或 IPv6 位址文字。
    /// - `uris`: 絕對 URI，例如 `spiffe://…`；原始文字會原樣寫入 CSR，不做正規化。
    ///
    /// # 錯誤
    ///
    /// 第一個無法解析的項目會以 [`ValidationError`] 回報，其中包含欄位名稱與索引。
    pub fn parse<D, I, U>(dns_names: &[D], ip_addresses: &[I], uris: &[U]) -> Result<Self>
    where
        D: AsRef<str>,
        I: AsRef<str>,
        U: AsRef<str>,
    {
        let dns_names = dns_names
            .iter()
            .enumerate()
            .map(|(i, name)| parse_dns_name(i, name.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let ip_addresses = ip_addresses
            .iter()
            .enumerate()
            .map(|(i, ip)| {
                let ip = ip.as_ref();
                IpAddr::from_str(ip).map_err(|e| {
                    ValidationError::new(FieldPath::element("ip_addresses", i), ip, e.to_string())
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let uris = uris
            .iter()
            .enumerate()
            .map(|(i, uri)| parse_uri(i, uri.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            dns_names,
            ip_addresses,
            uris,
        })
    }

    /// 新增一個 DNS 名稱。
    pub fn dns(mut self, name: &str) -> Self {
        self.dns_names.push(name.to_owned());
        self
    }

    pub fn ip(mut self, ip: IpAddr) -> Self {
        self.ip_addresses.push(ip);
        self
    }

    pub fn uri(mut self, uri: Url) -> Self {
        self.uris.push(uri.into());
        self
    }

    /// 三個列表皆為空時回傳 `true`。
    pub fn is_empty(&self) -> bool {
        self.dns_names.is_empty() && self.ip_addresses.is_empty() && self.uris.is_empty()
    }

    /// 建立 `subjectAltName` 擴展；沒有任何項目時回傳 `None`。
    ///
    /// 一般名稱依序為所有 DNS 名稱、所有 IP 位址、所有 URI，各組內維持輸入順序。
    pub(crate) fn to_extension(
        &self,
        ctx: &X509v3Context,
    ) -> std::result::Result<Option<X509Extension>, ErrorStack> {
        if self.is_empty() {
            return Ok(None);
        }

        let mut san = SubjectAlternativeName::new();
        for name in &self.dns_names {
            san.dns(name);
        }
        for ip in &self.ip_addresses {
            san.ip(&ip.to_string());
        }
        for uri in &self.uris {
            san.uri(uri.as_str());
        }

        debug!(
            dns_names = self.dns_names.len(),
            ip_addresses = self.ip_addresses.len(),
            uris = self.uris.len(),
            "mapped subject alternative names"
        );
        san.build(ctx).map(Some)
    }
}

fn parse_dns_name(index: usize, name: &str) -> Result<String> {
    let path = || FieldPath::element("dns_names", index);

    if name.is_empty() {
        return Err(ValidationError::new(path(), name, "empty value"));
    }
    if !name.is_ascii() {
        return Err(ValidationError::new(path(), name, "DNS names must be ASCII"));
    }
    Ok(name.to_owned())
}

fn parse_uri(index: usize, text: &str) -> Result<UriName> {
    let path = || FieldPath::element("uris", index);

    // SAN URI 以 IA5String 編碼，不允許空白
    if !text.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(ValidationError::new(
            path(),
            text,
            "URIs must be printable ASCII without spaces",
        ));
    }
    let url = Url::parse(text).map_err(|e| ValidationError::new(path(), text, e.to_string()))?;
    Ok(UriName {
        text: text.to_owned(),
        url,
    })
}
