use clap::Parser;
use winprep::cli::{Cli, CommandHandler, Commands};
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .format_timestamp(None)
        .init();

    let operation = describe(&cli.command);
    let handler = CommandHandler::new(cli.config, cli.quiet);

    if let Err(e) = handler.handle_command(cli.command).await {
        eprint!("{}", e.with_context(operation).user_message());
        process::exit(1);
    }
}

fn describe(command: &Commands) -> &'static str {
    match command {
        Commands::Run { dry_run: true, .. } => "预演构建节点准备",
        Commands::Run { .. } => "准备构建节点",
        Commands::Status { .. } => "检查安装状态",
        Commands::Steps => "列出步骤",
        Commands::Config { .. } => "配置管理",
        Commands::Service { .. } => "服务管理",
    }
}
