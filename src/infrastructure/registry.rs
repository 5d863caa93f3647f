use crate::error::{AppError, AppResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// 注册表根键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hive {
    LocalMachine,
    CurrentUser,
}

impl fmt::Display for Hive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hive::LocalMachine => write!(f, "HKLM"),
            Hive::CurrentUser => write!(f, "HKCU"),
        }
    }
}

/// 字符串值的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// REG_SZ
    String,
    /// REG_EXPAND_SZ，读取方展开其中的 `%VAR%`
    ExpandString,
}

/// 注册表中的字符串值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryValue {
    pub data: String,
    pub kind: ValueKind,
}

impl RegistryValue {
    pub fn string(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            kind: ValueKind::String,
        }
    }

    pub fn expand_string(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            kind: ValueKind::ExpandString,
        }
    }
}

/// 注册表读写接口（只涉及字符串值）
pub trait RegistryWriter: Send + Sync {
    /// 读取值及其类型
    fn get_value(&self, hive: Hive, key: &str, name: &str) -> AppResult<Option<RegistryValue>>;

    /// 按给定类型写入，键不存在时创建
    fn set_value(&self, hive: Hive, key: &str, name: &str, value: &RegistryValue) -> AppResult<()>;

    fn get_string(&self, hive: Hive, key: &str, name: &str) -> AppResult<Option<String>> {
        Ok(self.get_value(hive, key, name)?.map(|v| v.data))
    }

    /// 写入 REG_SZ 值
    fn set_string(&self, hive: Hive, key: &str, name: &str, value: &str) -> AppResult<()> {
        self.set_value(hive, key, name, &RegistryValue::string(value))
    }
}

/// 当前平台的注册表实现
pub fn system_registry() -> Box<dyn RegistryWriter> {
    #[cfg(windows)]
    {
        Box::new(WindowsRegistry)
    }
    #[cfg(not(windows))]
    {
        Box::new(UnsupportedRegistry)
    }
}

#[cfg(windows)]
pub struct WindowsRegistry;

#[cfg(windows)]
impl WindowsRegistry {
    fn root(hive: Hive) -> winreg::RegKey {
        use winreg::enums::*;
        match hive {
            Hive::LocalMachine => winreg::RegKey::predef(HKEY_LOCAL_MACHINE),
            Hive::CurrentUser => winreg::RegKey::predef(HKEY_CURRENT_USER),
        }
    }

    fn error(hive: Hive, key: &str, e: std::io::Error) -> AppError {
        AppError::Registry {
            key: format!("{}\\{}", hive, key),
            reason: e.to_string(),
        }
    }
}

#[cfg(windows)]
impl RegistryWriter for WindowsRegistry {
    fn get_value(&self, hive: Hive, key: &str, name: &str) -> AppResult<Option<RegistryValue>> {
        use winreg::enums::{REG_EXPAND_SZ, KEY_READ};
        use winreg::types::FromRegValue;

        let subkey = match Self::root(hive).open_subkey_with_flags(key, KEY_READ) {
            Ok(k) => k,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::error(hive, key, e)),
        };

        let raw = match subkey.get_raw_value(name) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::error(hive, key, e)),
        };
        let kind = if matches!(raw.vtype, REG_EXPAND_SZ) {
            ValueKind::ExpandString
        } else {
            ValueKind::String
        };
        let data = String::from_reg_value(&raw).map_err(|e| Self::error(hive, key, e))?;
        Ok(Some(RegistryValue { data, kind }))
    }

    fn set_value(&self, hive: Hive, key: &str, name: &str, value: &RegistryValue) -> AppResult<()> {
        use winreg::enums::{REG_EXPAND_SZ, REG_SZ};
        use winreg::types::ToRegValue;

        let (subkey, _) = Self::root(hive)
            .create_subkey(key)
            .map_err(|e| Self::error(hive, key, e))?;

        let mut raw = value.data.to_reg_value();
        raw.vtype = match value.kind {
            ValueKind::String => REG_SZ,
            ValueKind::ExpandString => REG_EXPAND_SZ,
        };
        subkey
            .set_raw_value(name, &raw)
            .map_err(|e| Self::error(hive, key, e))
    }
}

/// 非 Windows 平台：任何写入都报错
#[cfg(not(windows))]
pub struct UnsupportedRegistry;

#[cfg(not(windows))]
impl RegistryWriter for UnsupportedRegistry {
    fn get_value(&self, _hive: Hive, _key: &str, _name: &str) -> AppResult<Option<RegistryValue>> {
        Ok(None)
    }

    fn set_value(&self, hive: Hive, key: &str, _name: &str, _value: &RegistryValue) -> AppResult<()> {
        Err(AppError::unsupported(&format!("写入注册表 {}\\{}", hive, key)))
    }
}

type MemoryValues = HashMap<(Hive, String, String), RegistryValue>;

/// 内存中的注册表，用于预演和测试
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    values: Mutex<MemoryValues>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, MemoryValues>> {
        self.values.lock().map_err(|_| AppError::Registry {
            key: "memory".to_string(),
            reason: "锁定失败".to_string(),
        })
    }
}

impl RegistryWriter for MemoryRegistry {
    fn get_value(&self, hive: Hive, key: &str, name: &str) -> AppResult<Option<RegistryValue>> {
        let values = self.lock()?;
        Ok(values
            .get(&(hive, key.to_lowercase(), name.to_lowercase()))
            .cloned())
    }

    fn set_value(&self, hive: Hive, key: &str, name: &str, value: &RegistryValue) -> AppResult<()> {
        let mut values = self.lock()?;
        values.insert((hive, key.to_lowercase(), name.to_lowercase()), value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_registry_is_case_insensitive() {
        let registry = MemoryRegistry::new();
        registry
            .set_string(
                Hive::LocalMachine,
                r"System\CurrentControlSet\services\BuildBot\Parameters",
                "directories",
                r"C:\buildslave",
            )
            .unwrap();

        let value = registry
            .get_string(
                Hive::LocalMachine,
                r"SYSTEM\CurrentControlSet\Services\BuildBot\Parameters",
                "Directories",
            )
            .unwrap();
        assert_eq!(value.as_deref(), Some(r"C:\buildslave"));
        assert_eq!(
            registry
                .get_value(
                    Hive::LocalMachine,
                    r"System\CurrentControlSet\services\BuildBot\Parameters",
                    "directories",
                )
                .unwrap()
                .map(|v| v.kind),
            Some(ValueKind::String)
        );
        assert_eq!(
            registry
                .get_string(Hive::CurrentUser, "Environment", "Path")
                .unwrap(),
            None
        );
    }

    #[cfg(not(windows))]
    #[test]
    fn test_unsupported_registry_rejects_writes() {
        let registry = system_registry();
        assert!(matches!(
            registry.set_string(Hive::LocalMachine, "Software", "x", "y"),
            Err(AppError::Unsupported { .. })
        ));
    }
}
