use crate::models::document::{mime_for_path, Document};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从磁盘读取文档，根据扩展名推断 MIME 类型
///
/// 这里只负责读取，格式校验交给会话状态机
pub async fn load_document(path: &Path) -> Result<Document> {
    let bytes = fs::read(path)
        .await
        .with_context(|| format!("无法读取文件: {}", path.display()))?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .with_context(|| format!("路径中没有文件名: {}", path.display()))?;

    tracing::debug!("已读取 {} ({} 字节)", file_name, bytes.len());

    Ok(Document::new(file_name, mime_for_path(path), bytes))
}

/// 读取一次选择的全部文件
///
/// 读取失败的文件直接报错，不跳过
pub async fn load_documents(paths: &[PathBuf]) -> Result<Vec<Document>> {
    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        documents.push(load_document(path).await?);
    }
    Ok(documents)
}
