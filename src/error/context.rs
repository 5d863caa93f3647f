use crate::error::AppError;
use std::path::Path;

/// 提供安全的路径转换，避免 unwrap()
pub fn safe_path_to_str(path: &Path) -> Result<&str, AppError> {
    path.to_str()
        .ok_or_else(|| AppError::path_conversion_failed(&format!("{:?}", path)))
}

/// 提供安全的路径字符串转换
pub fn safe_path_to_string(path: &Path) -> Result<String, AppError> {
    safe_path_to_str(path).map(|s| s.to_string())
}

/// 安全的 JSON 序列化
pub fn safe_to_json_pretty<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_path_conversion() {
        let path = Path::new("/valid/path");
        assert_eq!(safe_path_to_str(path).unwrap(), "/valid/path");
        assert_eq!(safe_path_to_string(path).unwrap(), "/valid/path");
    }

    #[test]
    fn test_safe_json_serialization() {
        let data = serde_json::json!({"key": "value"});
        assert!(safe_to_json_pretty(&data).unwrap().contains("\"key\""));
    }
}
