use crate::error::{AppError, AppResult};
use crate::infrastructure::process::{CommandRunner, CommandSpec};

/// Windows 服务控制接口
pub trait ServiceController: Send + Sync {
    fn start(&self, runner: &dyn CommandRunner, name: &str) -> AppResult<()>;

    fn restart(&self, runner: &dyn CommandRunner, name: &str) -> AppResult<()>;
}

/// 通过 `net start` / `net stop` 控制服务
#[derive(Debug, Default)]
pub struct NetServiceController;

impl NetServiceController {
    fn net(runner: &dyn CommandRunner, verb: &str, name: &str) -> AppResult<()> {
        runner
            .run(&CommandSpec::new("net").args([verb, name]))
            .map_err(|e| AppError::Service {
                name: name.to_string(),
                reason: format!("net {} 失败: {}", verb, e),
            })
    }
}

impl ServiceController for NetServiceController {
    fn start(&self, runner: &dyn CommandRunner, name: &str) -> AppResult<()> {
        println!("▶️  启动服务 {}", name);
        Self::net(runner, "start", name)
    }

    fn restart(&self, runner: &dyn CommandRunner, name: &str) -> AppResult<()> {
        println!("🔄 重启服务 {}", name);
        // 服务未运行时 stop 会失败，忽略即可
        if let Err(e) = Self::net(runner, "stop", name) {
            log::warn!("{}", e);
        }
        Self::net(runner, "start", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRunner;

    #[test]
    fn test_start_uses_net_start() {
        let runner = RecordingRunner::new();
        NetServiceController.start(&runner, "BuildBot").unwrap();
        assert_eq!(runner.command_lines(), vec!["net start BuildBot"]);
    }

    #[test]
    fn test_restart_ignores_stop_failure() {
        let runner = RecordingRunner::new().fail_when(|spec| spec.args.first().map(String::as_str) == Some("stop"));
        NetServiceController.restart(&runner, "BuildBot").unwrap();
        assert_eq!(
            runner.command_lines(),
            vec!["net stop BuildBot", "net start BuildBot"]
        );
    }

    #[test]
    fn test_start_failure_is_service_error() {
        let runner = RecordingRunner::new().fail_when(|_| true);
        let err = NetServiceController.start(&runner, "BuildBot").unwrap_err();
        assert!(matches!(err, AppError::Service { .. }));
    }
}
