//! SQL 标识符校验
//!
//! 表名、列名来自配置且无法参数化绑定，拼接进 SQL 前必须校验。

use crate::error::{StorageError, StorageErrorKind};

const MAX_IDENTIFIER_LEN: usize = 127;

/// 校验标识符：首字符为字母或下划线，其余为字母、数字或下划线。
pub fn validate_identifier(name: &str) -> Result<(), StorageError> {
    let mut chars = name.chars();
    let valid_head = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_head || !valid_tail || name.len() > MAX_IDENTIFIER_LEN {
        return Err(StorageError::new(
            StorageErrorKind::InvalidIdentifier,
            format!("invalid identifier: {name:?}"),
        ));
    }
    Ok(())
}
