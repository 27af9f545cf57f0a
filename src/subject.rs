use std::slice;

use openssl::{
    asn1::Asn1Type,
    error::ErrorStack,
    nid::Nid,
    x509::{X509Name, X509NameBuilder, X509NameRef},
};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::validation::{FieldPath, ValidationError};

/// 建立主體辨別名稱 (DN) 時可能發生的錯誤。
#[derive(Debug, Error)]
pub enum SubjectError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("OpenSSL error while building subject name: {0}")]
    OpenSsl(#[from] ErrorStack),
}

type Result<T> = std::result::Result<T, SubjectError>;

/// CSR 主體的命名屬性，所有欄位皆可省略。
///
/// 未提供的欄位以空字串或空列表表示，且不會出現在編碼後的 DN 中。
/// 多值欄位保留呼叫端給定的順序，每個元素都會被編碼。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubjectAttributes {
    pub common_name: String,
    pub organization: Vec<String>,
    pub organizational_unit: Vec<String>,
    pub street_address: Vec<String>,
    pub locality: Vec<String>,
    pub province: Vec<String>,
    pub country: Vec<String>,
    pub postal_code: Vec<String>,
    /// 主體 DN 中的 `serialNumber` 屬性 (2.5.4.5)，與證書序號或金鑰無關。
    pub serial_number: String,
}

/// DN 中支援的屬性種類，`ORDER` 即為編碼順序。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attribute {
    Country,
    Province,
    Locality,
    StreetAddress,
    PostalCode,
    Organization,
    OrganizationalUnit,
    CommonName,
    SerialNumber,
}

impl Attribute {
    const ORDER: [Attribute; 9] = [
        Attribute::Country,
        Attribute::Province,
        Attribute::Locality,
        Attribute::StreetAddress,
        Attribute::PostalCode,
        Attribute::Organization,
        Attribute::OrganizationalUnit,
        Attribute::CommonName,
        Attribute::SerialNumber,
    ];

    fn nid(self) -> Nid {
        match self {
            Attribute::Country => Nid::COUNTRYNAME,
            Attribute::Province => Nid::STATEORPROVINCENAME,
            Attribute::Locality => Nid::LOCALITYNAME,
            Attribute::StreetAddress => Nid::STREETADDRESS,
            Attribute::PostalCode => Nid::POSTALCODE,
            Attribute::Organization => Nid::ORGANIZATIONNAME,
            Attribute::OrganizationalUnit => Nid::ORGANIZATIONALUNITNAME,
            Attribute::CommonName => Nid::COMMONNAME,
            Attribute::SerialNumber => Nid::SERIALNUMBER,
        }
    }

    fn field(self) -> &'static str {
        match self {
            Attribute::Country => "subject.country",
            Attribute::Province => "subject.province",
            Attribute::Locality => "subject.locality",
            Attribute::StreetAddress => "subject.street_address",
            Attribute::PostalCode => "subject.postal_code",
            Attribute::Organization => "subject.organization",
            Attribute::OrganizationalUnit => "subject.organizational_unit",
            Attribute::CommonName => "subject.common_name",
            Attribute::SerialNumber => "subject.serial_number",
        }
    }

    fn is_scalar(self) -> bool {
        matches!(self, Attribute::CommonName | Attribute::SerialNumber)
    }

    fn from_nid(nid: Nid) -> Option<Self> {
        Self::ORDER.into_iter().find(|attr| attr.nid() == nid)
    }
}

impl SubjectAttributes {
    /// 建立一個所有欄位皆為空的主體。
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有欄位皆未提供時回傳 `true`。
    pub fn is_empty(&self) -> bool {
        Attribute::ORDER
            .into_iter()
            .all(|attr| self.values(attr).is_empty())
    }

    fn values(&self, attr: Attribute) -> &[String] {
        match attr {
            Attribute::Country => &self.country,
            Attribute::Province => &self.province,
            Attribute::Locality => &self.locality,
            Attribute::StreetAddress => &self.street_address,
            Attribute::PostalCode => &self.postal_code,
            Attribute::Organization => &self.organization,
            Attribute::OrganizationalUnit => &self.organizational_unit,
            Attribute::CommonName => scalar(&self.common_name),
            Attribute::SerialNumber => scalar(&self.serial_number),
        }
    }

    /// 將主體屬性轉換為 OpenSSL 的 `X509Name`。
    ///
    /// 每個值各自成為一個單值 RDN，因此多值欄位的順序在 DER 中得以保留。
    /// 值只含 PrintableString 字元時以 PrintableString 編碼，否則使用 UTF8String；
    /// 不套用 OpenSSL 字串表的字元集與長度上限。
    /// 空列表視同未提供；列表中出現空字串會回傳帶有欄位與索引的 [`ValidationError`]。
    pub fn to_x509_name(&self) -> Result<X509Name> {
        let mut builder = X509NameBuilder::new()?;
        let mut entries = 0usize;

        for attr in Attribute::ORDER {
            for (index, value) in self.values(attr).iter().enumerate() {
                let path = if attr.is_scalar() {
                    FieldPath::scalar(attr.field())
                } else {
                    FieldPath::element(attr.field(), index)
                };

                if value.is_empty() {
                    return Err(ValidationError::new(path, value, "empty value").into());
                }

                builder
                    .append_entry_by_nid_with_type(attr.nid(), value, string_type(value))
                    .map_err(|e| ValidationError::new(path, value, e.to_string()))?;
                entries += 1;
            }
        }

        debug!(entries, "mapped subject attributes");
        Ok(builder.build())
    }

    /// 從既有的 `X509Name` 讀回主體屬性，未支援的屬性類型會被略過。
    ///
    /// 純量欄位若出現多次，保留最後一個值。
    pub fn from_x509_name(name: &X509NameRef) -> std::result::Result<Self, ErrorStack> {
        let mut subject = Self::default();

        for entry in name.entries() {
            let Some(attr) = Attribute::from_nid(entry.object().nid()) else {
                continue;
            };
            let value = entry.data().as_utf8()?.to_string();

            match attr {
                Attribute::Country => subject.country.push(value),
                Attribute::Province => subject.province.push(value),
                Attribute::Locality => subject.locality.push(value),
                Attribute::StreetAddress => subject.street_address.push(value),
                Attribute::PostalCode => subject.postal_code.push(value),
                Attribute::Organization => subject.organization.push(value),
                Attribute::OrganizationalUnit => subject.organizational_unit.push(value),
                Attribute::CommonName => subject.common_name = value,
                Attribute::SerialNumber => subject.serial_number = value,
            }
        }

        Ok(subject)
    }
}

fn string_type(value: &str) -> Asn1Type {
    if value.bytes().all(is_printable) {
        Asn1Type::PRINTABLESTRING
    } else {
        Asn1Type::UTF8STRING
    }
}

/// X.680 PrintableString 字元集。
fn is_printable(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b" '()+,-./:=?".contains(&b)
}

/// 純量欄位以空字串代表未提供。
fn scalar(value: &String) -> &[String] {
    if value.is_empty() {
        &[]
    } else {
        slice::from_ref(value)
    }
}
