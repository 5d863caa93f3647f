use crate::core::context::{PathPosition, ProvisionContext};
use crate::error::AppResult;
use crate::infrastructure::registry::{Hive, RegistryValue};
use crate::utils::PathUtils;
use std::path::Path;

/// 机器级环境变量所在的注册表键
pub const MACHINE_ENVIRONMENT_KEY: &str =
    r"SYSTEM\CurrentControlSet\Control\Session Manager\Environment";

/// 把目录加入机器级 PATH，并让后续步骤的子进程立即可见
///
/// 原值的类型保持不变，PATH 通常是 REG_EXPAND_SZ，其中含有 `%SystemRoot%` 这类引用。
/// 返回注册表中的 PATH 是否被修改。
pub fn add_to_path(ctx: &ProvisionContext, dir: &Path, position: PathPosition) -> AppResult<bool> {
    ctx.add_search_path(dir, position)?;

    let registry = ctx.registry();
    let current = registry
        .get_value(Hive::LocalMachine, MACHINE_ENVIRONMENT_KEY, "Path")?
        .unwrap_or_else(|| RegistryValue::expand_string(""));
    let mut entries = PathUtils::split_registry_path(&current.data);

    if PathUtils::contains(&entries, dir) {
        log::debug!("{} 已在 PATH 中", dir.display());
        return Ok(false);
    }

    match position {
        PathPosition::Prepend => entries.insert(0, dir.to_path_buf()),
        PathPosition::Append => entries.push(dir.to_path_buf()),
    }

    let updated = RegistryValue {
        data: PathUtils::join_registry_path(&entries),
        kind: current.kind,
    };
    registry.set_value(Hive::LocalMachine, MACHINE_ENVIRONMENT_KEY, "Path", &updated)?;
    println!("➕ 已加入 PATH: {}", dir.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::registry::{RegistryWriter, ValueKind};
    use crate::testing::TestHost;
    use std::path::PathBuf;

    #[test]
    fn test_add_to_path_updates_registry_once() {
        let host = TestHost::new();
        let ctx = host.context();
        host.registry
            .set_string(Hive::LocalMachine, MACHINE_ENVIRONMENT_KEY, "Path", r"C:\Windows")
            .unwrap();

        let dir = PathBuf::from(r"C:\maven\bin");
        assert!(add_to_path(&ctx, &dir, PathPosition::Append).unwrap());
        assert!(!add_to_path(&ctx, &PathBuf::from(r"c:\MAVEN\bin\"), PathPosition::Append).unwrap());

        let value = host
            .registry
            .get_string(Hive::LocalMachine, MACHINE_ENVIRONMENT_KEY, "Path")
            .unwrap();
        assert_eq!(value.as_deref(), Some(r"C:\Windows;C:\maven\bin"));
        assert!(PathUtils::contains(&ctx.search_path().unwrap(), &dir));
    }

    #[test]
    fn test_prepend_to_empty_path() {
        let host = TestHost::new();
        let ctx = host.context();

        add_to_path(&ctx, Path::new(r"C:\Python27"), PathPosition::Prepend).unwrap();
        add_to_path(&ctx, Path::new(r"C:\Python27\Scripts"), PathPosition::Append).unwrap();

        let value = host
            .registry
            .get_string(Hive::LocalMachine, MACHINE_ENVIRONMENT_KEY, "Path")
            .unwrap();
        assert_eq!(value.as_deref(), Some(r"C:\Python27;C:\Python27\Scripts"));
    }

    #[test]
    fn test_expandable_path_keeps_its_kind() {
        let host = TestHost::new();
        let ctx = host.context();
        host.registry
            .set_value(
                Hive::LocalMachine,
                MACHINE_ENVIRONMENT_KEY,
                "Path",
                &RegistryValue::expand_string(r"%SystemRoot%\system32;%SystemRoot%"),
            )
            .unwrap();

        add_to_path(&ctx, Path::new(r"C:\Program Files (x86)\CMake\bin"), PathPosition::Append).unwrap();

        let value = host
            .registry
            .get_value(Hive::LocalMachine, MACHINE_ENVIRONMENT_KEY, "Path")
            .unwrap()
            .unwrap();
        assert_eq!(value.kind, ValueKind::ExpandString);
        assert_eq!(
            value.data,
            r"%SystemRoot%\system32;%SystemRoot%;C:\Program Files (x86)\CMake\bin"
        );
    }

    #[test]
    fn test_plain_string_path_stays_plain() {
        let host = TestHost::new();
        let ctx = host.context();
        host.registry
            .set_string(Hive::LocalMachine, MACHINE_ENVIRONMENT_KEY, "Path", r"C:\Windows")
            .unwrap();

        add_to_path(&ctx, Path::new(r"C:\maven\bin"), PathPosition::Append).unwrap();

        let value = host
            .registry
            .get_value(Hive::LocalMachine, MACHINE_ENVIRONMENT_KEY, "Path")
            .unwrap()
            .unwrap();
        assert_eq!(value.kind, ValueKind::String);
    }
}
