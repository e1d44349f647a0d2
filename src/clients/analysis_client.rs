//! 分析服务 HTTP 客户端
//!
//! 封装上传和分析两个接口，所有失败都归一化为 `GatewayError`
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde_json::Value;
use tracing::{debug, error};

use crate::clients::AnalysisGateway;
use crate::config::Config;
use crate::error::{ConfigError, FailureCause, GatewayError};
use crate::models::{AnalysisResult, Document, RemoteDocumentId};
use crate::services::map_analysis_response;
use crate::utils::logging::truncate_text;

const UPLOAD_PATH: [&str; 4] = ["api", "v1", "analyze", "upload"];
const ANALYZE_PATH: [&str; 4] = ["api", "v1", "analyze", "analyze"];

/// 错误响应体在消息中最多保留的字符数
const ERROR_BODY_PREVIEW: usize = 200;

/// 分析服务客户端
pub struct AnalysisClient {
    http: Client,
    base_url: Url,
    analyze_timeout: Duration,
}

impl AnalysisClient {
    /// 创建新的分析服务客户端
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url()?,
            analyze_timeout: config.analyze_timeout(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// 上传接口地址
    pub fn upload_url(&self) -> Url {
        self.endpoint(&UPLOAD_PATH)
    }

    /// 分析接口地址，标识作为单独的路径段编码
    pub fn analyze_url(&self, document_id: &RemoteDocumentId) -> Url {
        let mut segments = ANALYZE_PATH.to_vec();
        segments.push(document_id.as_str());
        self.endpoint(&segments)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // base_url 在构造时已确认可以作为 base
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send_submit(&self, document: &Document) -> Result<RemoteDocumentId, GatewayError> {
        document
            .validate()
            .map_err(|e| GatewayError::submission(FailureCause::InvalidInput, e.to_string()))?;

        let part = Part::bytes(document.bytes().to_vec())
            .file_name(document.file_name().to_string())
            .mime_str(document.content_type())
            .map_err(|e| GatewayError::submission(FailureCause::InvalidInput, e.to_string()))?;
        let form = Form::new().part("file", part);

        let url = self.upload_url();
        debug!("POST {} ({} 字节)", url, document.len());

        let response = self
            .http
            .post(url)
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(|e| GatewayError::submission(FailureCause::Transport, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = error_detail(response).await;
            return Err(GatewayError::submission(
                FailureCause::Status(status.as_u16()),
                detail,
            ));
        }

        let body: Value = response.json().await.map_err(|e| {
            GatewayError::submission(FailureCause::MalformedPayload, format!("响应不是有效的 JSON: {}", e))
        })?;
        debug!("上传响应: {}", body);

        body.get("filename")
            .and_then(Value::as_str)
            .and_then(RemoteDocumentId::parse)
            .ok_or_else(|| {
                GatewayError::submission(FailureCause::MalformedPayload, "响应中缺少 filename 标识")
            })
    }

    async fn send_analyze(
        &self,
        document_id: &RemoteDocumentId,
    ) -> Result<AnalysisResult, GatewayError> {
        let url = self.analyze_url(document_id);
        debug!("POST {}", url);

        let response = self
            .http
            .post(url)
            .header(ACCEPT, "application/json")
            .timeout(self.analyze_timeout)
            .send()
            .await
            .map_err(|e| GatewayError::analysis(FailureCause::Transport, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = error_detail(response).await;
            return Err(GatewayError::analysis(
                FailureCause::Status(status.as_u16()),
                detail,
            ));
        }

        let body: Value = response.json().await.map_err(|e| {
            GatewayError::analysis(FailureCause::MalformedPayload, format!("响应不是有效的 JSON: {}", e))
        })?;

        map_analysis_response(&body)
            .map_err(|e| GatewayError::analysis(FailureCause::MalformedPayload, e.to_string()))
    }
}

#[async_trait]
impl AnalysisGateway for AnalysisClient {
    async fn submit(&self, document: &Document) -> Result<RemoteDocumentId, GatewayError> {
        self.send_submit(document).await.map_err(|e| {
            error!("❌ {}", e);
            e
        })
    }

    async fn analyze(&self, document_id: &RemoteDocumentId) -> Result<AnalysisResult, GatewayError> {
        self.send_analyze(document_id).await.map_err(|e| {
            error!("❌ {}", e);
            e
        })
    }
}

/// 提取错误响应中的可读信息
///
/// 优先使用 `detail` / `message` 字段，否则取响应文本，最后退回状态码说明
async fn error_detail(response: Response) -> String {
    let status = response.status();
    let fallback = status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    let text = match response.text().await {
        Ok(text) => text,
        Err(_) => return fallback,
    };
    detail_from_body(&text).unwrap_or(fallback)
}

fn detail_from_body(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let detail = serde_json::from_str::<Value>(trimmed).ok().and_then(|json| {
        ["detail", "message"]
            .iter()
            .find_map(|key| json.get(*key))
            .map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    });
    let detail = detail.unwrap_or_else(|| trimmed.to_string());
    Some(truncate_text(&detail, ERROR_BODY_PREVIEW))
}
