use std::{fmt, str::FromStr};

use openssl::pkey::{Id, PKey, Private};
use thiserror::Error;
use tracing::{debug, warn};

/// 私鑰解析與演算法比對時可能發生的錯誤。
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Failed to parse {algorithm} private key: {reason}")]
    Parse {
        algorithm: String,
        reason: String,
    },
    #[error("Key algorithm mismatch: declared {declared}, but private key is {actual}")]
    Mismatch {
        declared: KeyAlgorithm,
        actual: String,
    },
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

type Result<T> = std::result::Result<T, KeyError>;

/// 宣告的金鑰演算法，同時決定私鑰的解析方式與 CSR 的簽名演算法。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    Rsa,
    Ecdsa,
    Ed25519,
}

impl KeyAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyAlgorithm::Rsa => "RSA",
            KeyAlgorithm::Ecdsa => "ECDSA",
            KeyAlgorithm::Ed25519 => "ED25519",
        }
    }

    fn from_id(id: Id) -> Option<Self> {
        match id {
            Id::RSA => Some(KeyAlgorithm::Rsa),
            Id::EC => Some(KeyAlgorithm::Ecdsa),
            Id::ED25519 => Some(KeyAlgorithm::Ed25519),
            _ => None,
        }
    }
}

impl FromStr for KeyAlgorithm {
    type Err = KeyError;

    /// 不分大小寫解析演算法標籤，目前支援 "RSA"、"ECDSA" 與 "ED25519"。
    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_uppercase().as_str() {
            "RSA" => Ok(KeyAlgorithm::Rsa),
            "ECDSA" => Ok(KeyAlgorithm::Ecdsa),
            "ED25519" => Ok(KeyAlgorithm::Ed25519),
            _ => Err(KeyError::UnsupportedAlgorithm(name.to_owned())),
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 已解析的私鑰，以演算法作為標籤。
///
/// 簽署時依此標籤選擇摘要演算法；私鑰在整個建構過程中只會被唯讀借用。
#[derive(Debug, Clone)]
pub enum PrivateKey {
    Rsa(PKey<Private>),
    Ecdsa(PKey<Private>),
    Ed25519(PKey<Private>),
}

impl PrivateKey {
    /// 依宣告的演算法解析 PEM 格式的私鑰。
    ///
    /// 接受 PKCS#8 (`PRIVATE KEY`) 以及傳統格式（`RSA PRIVATE KEY`、`EC PRIVATE KEY`）。
    ///
    /// # 參數
    ///
    /// - `algorithm`: 呼叫端宣告的演算法。
    /// - `pem`: 私鑰的 PEM 位元組。
    ///
    /// # 錯誤
    ///
    /// - PEM 或金鑰內容無法解碼時回傳 [`KeyError::Parse`]。
    /// - 私鑰的實際類型與 `algorithm` 不符時回傳 [`KeyError::Mismatch`]。
    pub fn from_pem(algorithm: KeyAlgorithm, pem: &[u8]) -> Result<Self> {
        debug!(%algorithm, "parsing private key");

        let pkey = PKey::private_key_from_pem(pem).map_err(|e| KeyError::Parse {
            algorithm: algorithm.to_string(),
            reason: e.to_string(),
        })?;

        let actual = KeyAlgorithm::from_id(pkey.id());
        if actual != Some(algorithm) {
            let actual = describe_id(pkey.id());
            warn!(declared = %algorithm, actual = %actual, "private key does not match declared algorithm");
            return Err(KeyError::Mismatch {
                declared: algorithm,
                actual,
            });
        }

        Self::checked(algorithm, pkey)
    }

    /// 解析 PEM 私鑰並由金鑰本身推斷演算法。
    pub fn from_pem_inferred(pem: &[u8]) -> Result<Self> {
        let pkey = PKey::private_key_from_pem(pem).map_err(|e| KeyError::Parse {
            algorithm: "private".to_owned(),
            reason: e.to_string(),
        })?;

        let algorithm = KeyAlgorithm::from_id(pkey.id())
            .ok_or_else(|| KeyError::UnsupportedAlgorithm(describe_id(pkey.id())))?;
        debug!(%algorithm, "inferred key algorithm from private key");

        Self::checked(algorithm, pkey)
    }

    /// 針對各演算法做一致性檢查後包裝成對應的變體。
    fn checked(algorithm: KeyAlgorithm, pkey: PKey<Private>) -> Result<Self> {
        let parse_error = |reason: String| KeyError::Parse {
            algorithm: algorithm.to_string(),
            reason,
        };

        match algorithm {
            KeyAlgorithm::Rsa => {
                let rsa = pkey.rsa().map_err(|e| parse_error(e.to_string()))?;
                match rsa.check_key() {
                    Ok(true) => Ok(PrivateKey::Rsa(pkey)),
                    Ok(false) => Err(parse_error("RSA key consistency check failed".to_owned())),
                    Err(e) => Err(parse_error(e.to_string())),
                }
            }
            KeyAlgorithm::Ecdsa => {
                let ec_key = pkey.ec_key().map_err(|e| parse_error(e.to_string()))?;
                ec_key.check_key().map_err(|e| parse_error(e.to_string()))?;
                Ok(PrivateKey::Ecdsa(pkey))
            }
            KeyAlgorithm::Ed25519 => Ok(PrivateKey::Ed25519(pkey)),
        }
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PrivateKey::Rsa(_) => KeyAlgorithm::Rsa,
            PrivateKey::Ecdsa(_) => KeyAlgorithm::Ecdsa,
            PrivateKey::Ed25519(_) => KeyAlgorithm::Ed25519,
        }
    }

    /// 取得底層的 OpenSSL 私鑰。
    pub fn pkey(&self) -> &PKey<Private> {
        match self {
            PrivateKey::Rsa(pkey) | PrivateKey::Ecdsa(pkey) | PrivateKey::Ed25519(pkey) => pkey,
        }
    }

    /// 取得金鑰的參數，例如 RSA 的模數位元數或 EC 曲線的位元數。
    pub fn bits(&self) -> u32 {
        self.pkey().bits()
    }
}

fn describe_id(id: Id) -> String {
    match KeyAlgorithm::from_id(id) {
        Some(algorithm) => algorithm.to_string(),
        None if id == Id::DSA => "DSA".to_owned(),
        None if id == Id::ED448 => "ED448".to_owned(),
        None => format!("unknown key type (id {})", id.as_raw()),
    }
}
