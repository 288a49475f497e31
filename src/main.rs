use anyhow::Result;
use book_reader::utils::logging;
use book_reader::{App, Command, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 解析命令
    let command = Command::parse(std::env::args().skip(1))?;

    // 初始化并运行应用
    App::initialize(config).await?.run(command).await?;

    Ok(())
}
