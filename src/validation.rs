use std::fmt;

use thiserror::Error;

/// 輸入欄位驗證失敗時的錯誤，會在任何簽署動作之前回報。
///
/// `field` 以輸入記錄中的欄位名稱表示，多值欄位會附帶索引，例如 `ip_addresses[1]`。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid value {value:?} for {field}: {reason}")]
pub struct ValidationError {
    pub field: FieldPath,
    pub value: String,
    pub reason: String,
}

impl ValidationError {
    pub(crate) fn new(field: FieldPath, value: &str, reason: impl Into<String>) -> Self {
        Self {
            field,
            value: value.to_owned(),
            reason: reason.into(),
        }
    }
}

/// 指向輸入中某個欄位（或多值欄位中某個元素）的路徑。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    pub name: &'static str,
    pub index: Option<usize>,
}

impl FieldPath {
    pub(crate) fn scalar(name: &'static str) -> Self {
        Self { name, index: None }
    }

    pub(crate) fn element(name: &'static str, index: usize) -> Self {
        Self {
            name,
            index: Some(index),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{}]", self.name, index),
            None => f.write_str(self.name),
        }
    }
}
