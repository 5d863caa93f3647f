use std::path::{Path, PathBuf};

/// 路径工具
pub struct PathUtils;

impl PathUtils {
    /// 比较用的规范形式：统一分隔符、去掉结尾分隔符、忽略大小写
    pub fn normalize_for_compare(path: &Path) -> String {
        let s = path.to_string_lossy().replace('/', "\\");
        let trimmed = s.trim_end_matches('\\');
        let trimmed = if trimmed.is_empty() { s.as_str() } else { trimmed };
        trimmed.to_lowercase()
    }

    /// 两个路径在 Windows 语义下是否相同
    pub fn same_path(a: &Path, b: &Path) -> bool {
        Self::normalize_for_compare(a) == Self::normalize_for_compare(b)
    }

    /// 列表中是否已包含该目录
    pub fn contains(list: &[PathBuf], dir: &Path) -> bool {
        list.iter().any(|p| Self::same_path(p, dir))
    }

    /// 解析注册表中以分号分隔的 PATH 值
    pub fn split_registry_path(value: &str) -> Vec<PathBuf> {
        value
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect()
    }

    /// 拼接为注册表中的 PATH 值
    pub fn join_registry_path(entries: &[PathBuf]) -> String {
        entries
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join(";")
    }
}
