//! 命令行应用 - 编排层
//!
//! 管理应用生命周期：初始化日志文件、构建网关、驱动一次完整会话

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::clients::AnalysisClient;
use crate::config::Config;
use crate::error::AppResult;
use crate::models::{load_documents, AnalysisResult, Document};
use crate::orchestrator::session_controller::{SessionActions, SessionController};
use crate::utils::logging::{append_log_line, init_log_file, log_startup};

/// 应用主结构
pub struct App {
    config: Config,
    controller: SessionController<AnalysisClient>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)
            .with_context(|| format!("无法创建日志文件: {}", config.output_log_file))?;

        log_startup(&config);

        let client = AnalysisClient::new(&config)?;

        Ok(Self {
            config,
            controller: SessionController::new(client),
        })
    }

    pub fn controller(&self) -> &SessionController<AnalysisClient> {
        &self.controller
    }

    /// 读取文件并完成 选择 → 上传 → 分析
    pub async fn run(&mut self, paths: &[PathBuf]) -> Result<AnalysisResult> {
        let documents = load_documents(paths).await?;
        let document = Document::single(documents)?;
        let file_name = document.file_name().to_string();

        match drive_session(&mut self.controller, document).await {
            Ok(()) => {
                let analysis = self
                    .controller
                    .session()
                    .analysis()
                    .cloned()
                    .context("会话已完成但没有分析结果")?;
                self.record(&format!(
                    "✓ {} 分析完成: 评分 {} ({})",
                    file_name, analysis.summary.overall_score, analysis.summary.health_status
                ));
                Ok(analysis)
            }
            Err(e) => {
                error!("❌ {} 处理失败: {}", file_name, e);
                self.record(&format!("❌ {} 处理失败: {}", file_name, e));
                Err(e.into())
            }
        }
    }

    /// 结束会话，释放持有的文件
    pub fn dismiss(&mut self) {
        if self.controller.dismiss().is_ok() {
            info!("会话已结束");
        }
    }

    fn record(&self, line: &str) {
        if let Err(e) = append_log_line(&self.config.output_log_file, line) {
            error!("写入日志文件失败: {}", e);
        }
    }
}

/// 通过会话操作接口跑完一次完整流程
///
/// 任何一步进入 `Failed` 都会停止，并返回会话中记录的错误
pub async fn drive_session(actions: &mut dyn SessionActions, document: Document) -> AppResult<()> {
    actions.select_file(document)?;

    info!("📤 正在上传...");
    actions.submit().await?;
    if let Some(error) = actions.view().error {
        return Err(error.clone().into());
    }

    info!("🔍 正在分析，可能需要几分钟...");
    actions.analyze().await?;
    if let Some(error) = actions.view().error {
        return Err(error.clone().into());
    }

    Ok(())
}
