//! 上传文档与远端文档标识

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::ValidationError;

/// 唯一接受的文档 MIME 类型
pub const PDF_MIME: &str = "application/pdf";

/// 无法识别扩展名时使用的 MIME 类型
pub const OCTET_STREAM_MIME: &str = "application/octet-stream";

/// 用户选择的文档
///
/// 内容用 `Arc<[u8]>` 持有，会话状态和请求凭据之间共享同一份数据。
/// 上传时 multipart 需要拥有所有权的缓冲区，每次请求复制一次
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    file_name: String,
    content_type: String,
    bytes: Arc<[u8]>,
}

impl Document {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: Arc::from(bytes.into()),
        }
    }

    /// 创建 PDF 文档
    pub fn pdf(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(file_name, PDF_MIME, bytes)
    }

    /// 根据文件名推断 MIME 类型
    pub fn from_named_bytes(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_for_path(Path::new(&file_name));
        Self::new(file_name, content_type, bytes)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 是否为接受的格式（PDF）
    pub fn is_accepted_format(&self) -> bool {
        self.content_type
            .split(';')
            .next()
            .map(|mime| mime.trim().eq_ignore_ascii_case(PDF_MIME))
            .unwrap_or(false)
    }

    /// 校验文档是否可以上传
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.is_accepted_format() {
            return Err(ValidationError::UnsupportedFormat {
                file_name: self.file_name.clone(),
                content_type: self.content_type.clone(),
            });
        }
        if self.is_empty() {
            return Err(ValidationError::EmptyDocument {
                file_name: self.file_name.clone(),
            });
        }
        Ok(())
    }

    /// 从一次选择的文件列表中取出唯一的文档
    ///
    /// 多选和空选都在这里被拒绝，不会进入会话
    pub fn single(mut files: Vec<Document>) -> Result<Document, ValidationError> {
        match files.len() {
            0 => Err(ValidationError::NoFileSelected),
            1 => Ok(files.remove(0)),
            count => Err(ValidationError::TooManyFiles { count }),
        }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// 根据扩展名推断 MIME 类型
pub fn mime_for_path(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => PDF_MIME,
        _ => OCTET_STREAM_MIME,
    }
}

/// 远端服务在上传成功后分配的文档标识
///
/// 对客户端不透明，只用于下一次分析请求
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteDocumentId(String);

impl RemoteDocumentId {
    /// 空白标识视为无效，其余原样保留
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteDocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
