use crate::cli::commands::*;
use crate::cli::output::{OutputFormat, FORMATTER};
use crate::core::{ProvisionContext, Provisioner, StepFilter};
use crate::error::{AppError, AppResult};
use crate::infrastructure::config::{get_config_path, Config};
use crate::infrastructure::process::SystemRunner;
use crate::infrastructure::service::{NetServiceController, ServiceController};
use std::path::{Path, PathBuf};

/// 命令处理器
pub struct CommandHandler {
    config_path: Option<PathBuf>,
    quiet: bool,
}

impl CommandHandler {
    /// 创建新的命令处理器
    pub fn new(config_path: Option<PathBuf>, quiet: bool) -> Self {
        Self { config_path, quiet }
    }

    /// 处理命令
    pub async fn handle_command(&self, command: Commands) -> AppResult<()> {
        match command {
            Commands::Run {
                dry_run,
                only,
                skip,
                json,
            } => self.handle_run(dry_run, StepFilter { only, skip }, json).await,
            Commands::Status { json } => self.handle_status(json),
            Commands::Steps => self.handle_steps(),
            Commands::Config { action } => self.handle_config_command(action),
            Commands::Service { action } => self.handle_service_command(action),
        }
    }

    fn load_config(&self) -> AppResult<Config> {
        Config::load(self.config_path.as_deref())
    }

    fn config_path(&self) -> AppResult<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => get_config_path(),
        }
    }

    async fn handle_run(&self, dry_run: bool, filter: StepFilter, json: bool) -> AppResult<()> {
        let config = self.load_config()?;
        let show_progress = !self.quiet && !json;
        let ctx = ProvisionContext::system(config, dry_run, show_progress)?;

        log::info!("开始准备构建节点 (dry_run = {})", dry_run);
        let report = Provisioner::standard().run(&ctx, &filter).await?;
        print!(
            "{}",
            FORMATTER.format_report(&report, OutputFormat::from_json_flag(json))?
        );
        Ok(())
    }

    fn handle_status(&self, json: bool) -> AppResult<()> {
        let config = self.load_config()?;
        let ctx = ProvisionContext::system(config, true, false)?;
        let statuses = Provisioner::standard().status(&ctx)?;
        print!(
            "{}",
            FORMATTER.format_status(&statuses, OutputFormat::from_json_flag(json))?
        );
        Ok(())
    }

    fn handle_steps(&self) -> AppResult<()> {
        let steps: Vec<(String, String)> = Provisioner::standard()
            .steps()
            .iter()
            .map(|s| (s.id(), s.description()))
            .collect();
        print!("{}", FORMATTER.format_steps(&steps));
        Ok(())
    }

    /// 处理配置命令
    fn handle_config_command(&self, action: ConfigCommands) -> AppResult<()> {
        match action {
            ConfigCommands::Show => {
                print!("{}", self.load_config()?.to_toml()?);
            }
            ConfigCommands::Path => {
                println!("{}", self.config_path()?.display());
            }
            ConfigCommands::Init { force } => {
                let path = self.config_path()?;
                init_config(&path, force)?;
                println!("📝 已写入默认配置: {}", path.display());
            }
        }
        Ok(())
    }

    /// 处理服务命令
    fn handle_service_command(&self, action: ServiceCommands) -> AppResult<()> {
        let (name, restart) = match action {
            ServiceCommands::Start { name } => (name, false),
            ServiceCommands::Restart { name } => (name, true),
        };
        let name = match name {
            Some(name) => name,
            None => self.load_config()?.buildbot.service_name,
        };

        let controller = NetServiceController;
        if restart {
            controller.restart(&SystemRunner, &name)
        } else {
            controller.start(&SystemRunner, &name)
        }
    }
}

/// 写入默认配置，已存在的文件只有在 `force` 时才覆盖
pub fn init_config(path: &Path, force: bool) -> AppResult<()> {
    if path.exists() && !force {
        return Err(AppError::config(format!(
            "配置文件已存在: {}，使用 --force 覆盖",
            path.display()
        )));
    }
    Config::new().save_to(path)
}
