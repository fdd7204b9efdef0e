use anyhow::Result;
use clap::Parser;
use contractor_onboard_submit::orchestrator::App;
use contractor_onboard_submit::{utils, Cli, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    utils::logging::init();

    // 加载配置：默认值 → 环境变量 → 命令行参数
    let mut config = Config::from_env();
    Cli::parse().apply(&mut config);

    utils::logging::init_log_file(&config.output_log_file)?;

    // 初始化并运行应用
    let _stats = App::initialize(config).await?.run().await?;

    Ok(())
}
