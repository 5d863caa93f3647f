use crate::core::constants::{installer_flags, step_ids};
use crate::core::{ProvisionContext, Step};
use crate::error::{AppError, AppResult};
use crate::infrastructure::config::resolve_env_var;
use crate::infrastructure::process::path_arg;
use crate::infrastructure::registry::Hive;
use crate::steps::pywin32::python_exe;
use async_trait::async_trait;
use std::path::PathBuf;

/// 服务参数所在的注册表键
pub fn service_parameters_key(service_name: &str) -> String {
    format!(r"System\CurrentControlSet\services\{}\Parameters", service_name)
}

/// BuildBot 构建从机，以服务方式运行
///
/// 服务使用 Local System 账户并允许与桌面交互，GUI 测试需要这一点。
pub struct BuildbotStep;

impl BuildbotStep {
    fn password(ctx: &ProvisionContext) -> AppResult<String> {
        let password = resolve_env_var(&ctx.config.buildbot.password);
        if password.starts_with("${") {
            return Err(AppError::config(format!(
                "BuildBot 密码未设置: 环境变量 {} 不存在",
                password.trim_start_matches("${").trim_end_matches('}')
            )));
        }
        Ok(password)
    }

    fn scripts_dir(ctx: &ProvisionContext) -> PathBuf {
        ctx.config.paths.python_dir.join("Scripts")
    }

    /// 安装 buildslave 包并创建从机目录
    fn create_slave(&self, ctx: &ProvisionContext) -> AppResult<()> {
        let buildbot = &ctx.config.buildbot;
        let python = python_exe(&ctx.config.paths);
        let password = Self::password(ctx)?;

        let pip = ctx
            .command(&python)?
            .args(["-m", "pip", "install"])
            .arg(buildbot.package.as_str());
        ctx.runner().run(&pip)?;

        let create = ctx
            .command(&python)?
            .arg(path_arg(&Self::scripts_dir(ctx).join("buildslave"))?)
            .arg("create-slave")
            .arg(path_arg(&buildbot.slave_dir)?)
            .arg(buildbot.master.as_str())
            .arg(buildbot.slave_name.as_str())
            .arg(password);
        ctx.runner().run(&create)
    }
}

#[async_trait]
impl Step for BuildbotStep {
    fn id(&self) -> String {
        step_ids::BUILDBOT.to_string()
    }

    fn description(&self) -> String {
        "BuildBot 从机服务".to_string()
    }

    fn marker(&self, ctx: &ProvisionContext) -> Option<PathBuf> {
        Some(ctx.config.buildbot.slave_dir.clone())
    }

    async fn install(&self, ctx: &ProvisionContext) -> AppResult<()> {
        let buildbot = &ctx.config.buildbot;
        self.create_slave(ctx)?;

        ctx.registry().set_string(
            Hive::LocalMachine,
            &service_parameters_key(&buildbot.service_name),
            "directories",
            &path_arg(&buildbot.slave_dir)?,
        )?;

        let service = ctx
            .command(python_exe(&ctx.config.paths))?
            .arg(path_arg(&Self::scripts_dir(ctx).join("buildbot_service.py"))?)
            .args(installer_flags::BUILDBOT_SERVICE.iter().copied());
        ctx.runner().run(&service)?;

        ctx.services().start(ctx.runner(), &buildbot.service_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::registry::{RegistryWriter, ValueKind};
    use crate::testing::TestHost;

    fn host_with_password() -> TestHost {
        let mut host = TestHost::new();
        host.config.buildbot.password = "secret".to_string();
        host
    }

    #[tokio::test]
    async fn test_install_sequence() {
        let host = host_with_password();
        let ctx = host.context();

        BuildbotStep.install(&ctx).await.unwrap();

        let calls = host.runner.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0].args, vec!["-m", "pip", "install", "buildbot-slave"]);
        assert!(calls[1].args[0].ends_with("buildslave"));
        assert_eq!(calls[1].args[1], "create-slave");
        assert_eq!(calls[1].args[3..], ["localhost:9989", "win2008", "secret"]);
        assert!(calls[2].args[0].ends_with("buildbot_service.py"));
        assert_eq!(calls[2].args[1..], ["--startup", "auto", "--interactive", "install"]);
        assert_eq!(calls[3].display(), "net start BuildBot");

        let directories = host
            .registry
            .get_value(
                Hive::LocalMachine,
                r"System\CurrentControlSet\services\BuildBot\Parameters",
                "directories",
            )
            .unwrap()
            .unwrap();
        assert_eq!(directories.data, path_arg(&host.config.buildbot.slave_dir).unwrap());
        assert_eq!(directories.kind, ValueKind::String);
    }

    #[tokio::test]
    async fn test_unresolved_password_is_config_error() {
        let mut host = TestHost::new();
        host.config.buildbot.password = "${WINPREP_TEST_UNSET_PASSWORD}".to_string();
        let ctx = host.context();

        let err = BuildbotStep.install(&ctx).await.unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
        assert!(host.runner.calls().is_empty());
    }

    #[test]
    fn test_installed_when_slave_dir_exists() {
        let host = host_with_password();
        let ctx = host.context();
        assert!(!BuildbotStep.is_installed(&ctx).unwrap());

        std::fs::create_dir_all(&host.config.buildbot.slave_dir).unwrap();
        assert!(BuildbotStep.is_installed(&ctx).unwrap());
    }

    #[test]
    fn test_parameters_key_uses_service_name() {
        assert_eq!(
            service_parameters_key("Slave"),
            r"System\CurrentControlSet\services\Slave\Parameters"
        );
    }
}
