use anyhow::Result;
use mock_exam_builder::utils::logging;
use mock_exam_builder::{App, Config, DirectoryRenderer};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let _stats = App::initialize(config, Arc::new(DirectoryRenderer::new()))?
        .run()
        .await?;

    Ok(())
}
