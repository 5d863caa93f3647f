use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// winprep CLI 应用程序
#[derive(Parser, Debug)]
#[command(name = "winprep")]
#[command(about = "Windows 构建节点准备工具，安装编译器、SDK、JDK 和 BuildBot 从机", long_about = None)]
#[command(version)]
pub struct Cli {
    /// 输出更多日志，可重复使用
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// 只输出错误
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// 配置文件路径，默认 ~/.winprep/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 顶级命令
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 按顺序执行安装步骤
    Run {
        /// 只检查并列出需要安装的步骤
        #[arg(long)]
        dry_run: bool,
        /// 只执行指定步骤
        #[arg(long, value_name = "ID")]
        only: Vec<String>,
        /// 跳过指定步骤
        #[arg(long, value_name = "ID")]
        skip: Vec<String>,
        /// JSON 格式输出报告
        #[arg(long)]
        json: bool,
    },
    /// 查看各步骤的安装状态
    Status {
        /// JSON 格式输出
        #[arg(long)]
        json: bool,
    },
    /// 列出所有步骤
    Steps,
    /// 配置管理
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
    /// BuildBot 服务管理
    Service {
        #[command(subcommand)]
        action: ServiceCommands,
    },
}

/// 配置管理命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// 显示当前生效的配置
    Show,
    /// 显示配置文件路径
    Path,
    /// 写入默认配置
    Init {
        /// 覆盖已有的配置文件
        #[arg(long)]
        force: bool,
    },
}

/// 服务管理命令
#[derive(Subcommand, Debug)]
pub enum ServiceCommands {
    /// 启动服务
    Start {
        /// 服务名，默认取配置中的 buildbot.service_name
        #[arg(long)]
        name: Option<String>,
    },
    /// 重启服务
    Restart {
        #[arg(long)]
        name: Option<String>,
    },
}

impl Cli {
    /// 由 -v / -q 决定的日志级别
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
