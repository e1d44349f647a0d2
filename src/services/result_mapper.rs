//! 分析结果映射 - 业务能力层
//!
//! 把分析接口返回的 JSON 宽松地映射为 `AnalysisResult`。
//!
//! 远端服务的字段布局在多个版本间变化过：
//! - 早期 `metrics` 只有 `cash_flow` / `expense_breakdown`
//! - 后来增加 `income_sources`，`debt_and_savings` 拆分为
//!   `credit_utilization` / `outstanding_debt` / `financial_indicators`
//! - `outstanding_debt` 可能是一个数字，也可能是逐项列表
//!
//! 只有三个字段是必需的：`summary.overall_score`、`summary.health_status`、
//! `detailed_analysis.components`。其余字段缺失时使用默认值。

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::analysis::{
    AnalysisResult, ComponentAnalysis, DebtAndSavings, DebtItem, DetailedAnalysis,
    FinancialIndicator, Flag, IncomeSources, Metrics, NumericFields, OutstandingDebt,
    Recommendations, Severity, Summary,
};

/// 响应结构不满足最低要求
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// 必需字段缺失
    #[error("缺少必需字段: {path}")]
    MissingField { path: &'static str },
    /// 字段类型不符
    #[error("字段 {path} 类型错误，期望 {expected}")]
    WrongType {
        path: &'static str,
        expected: &'static str,
    },
}

/// 严重程度无法识别时的取值
const FALLBACK_SEVERITY: Severity = Severity::Medium;

/// 映射完整的分析接口响应体（包含 `final_output` 的外层对象）
pub fn map_analysis_response(body: &Value) -> Result<AnalysisResult, MappingError> {
    let final_output = required_object(body, "final_output", "final_output")?;
    map_final_output(final_output)
}

/// 映射 `final_output` 对象本身
pub fn map_final_output(output: &Map<String, Value>) -> Result<AnalysisResult, MappingError> {
    let summary = map_summary(output)?;
    let detailed_analysis = map_detailed_analysis(output)?;

    let recommendations = output
        .get("recommendations")
        .and_then(Value::as_object)
        .map(map_recommendations)
        .unwrap_or_default();

    let metrics = output
        .get("metrics")
        .and_then(Value::as_object)
        .map(map_metrics)
        .unwrap_or_default();

    debug!(
        "映射完成: 评分 {}，{} 个分项，{} 条警告",
        summary.overall_score,
        detailed_analysis.components.len(),
        recommendations.flags.len()
    );

    Ok(AnalysisResult {
        summary,
        detailed_analysis,
        recommendations,
        metrics,
    })
}

// ========== 必需字段 ==========

fn map_summary(output: &Map<String, Value>) -> Result<Summary, MappingError> {
    let summary = output
        .get("summary")
        .ok_or(MappingError::MissingField {
            path: "final_output.summary",
        })?
        .as_object()
        .ok_or(MappingError::WrongType {
            path: "final_output.summary",
            expected: "object",
        })?;

    let overall_score = match summary.get("overall_score") {
        None | Some(Value::Null) => {
            return Err(MappingError::MissingField {
                path: "final_output.summary.overall_score",
            })
        }
        Some(value) => lenient_number(value).ok_or(MappingError::WrongType {
            path: "final_output.summary.overall_score",
            expected: "number",
        })?,
    };

    let health_status = match summary.get("health_status") {
        None | Some(Value::Null) => {
            return Err(MappingError::MissingField {
                path: "final_output.summary.health_status",
            })
        }
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            return Err(MappingError::WrongType {
                path: "final_output.summary.health_status",
                expected: "string",
            })
        }
    };

    Ok(Summary {
        overall_score,
        health_status,
        key_findings: lenient_text(summary.get("key_findings")),
    })
}

fn map_detailed_analysis(output: &Map<String, Value>) -> Result<DetailedAnalysis, MappingError> {
    let detailed = required_object_in(
        output,
        "detailed_analysis",
        "final_output.detailed_analysis",
    )?;
    let raw_components = required_object_in(
        detailed,
        "components",
        "final_output.detailed_analysis.components",
    )?;

    let mut components = BTreeMap::new();
    for (name, raw) in raw_components {
        match map_component(raw) {
            Some(component) => {
                components.insert(name.clone(), component);
            }
            None => warn!("⚠️ 分项 {} 缺少有效评分，已忽略", name),
        }
    }

    Ok(DetailedAnalysis {
        components,
        narrative: lenient_text(detailed.get("narrative")),
    })
}

fn map_component(raw: &Value) -> Option<ComponentAnalysis> {
    let obj = raw.as_object()?;
    let score = obj.get("score").and_then(lenient_number)?;
    Some(ComponentAnalysis {
        score,
        status: lenient_text(obj.get("status")),
        summary: lenient_text(obj.get("summary")),
        details: obj.get("details").cloned().unwrap_or(Value::Null),
    })
}

// ========== 可选字段 ==========

fn map_recommendations(raw: &Map<String, Value>) -> Recommendations {
    let immediate_actions = match raw.get("immediate_actions") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| lenient_text(Some(item)))
            .filter(|text| !text.is_empty())
            .collect(),
        Some(Value::String(single)) if !single.trim().is_empty() => vec![single.clone()],
        _ => Vec::new(),
    };

    let flags = raw
        .get("flags")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(map_flag).collect())
        .unwrap_or_default();

    Recommendations {
        immediate_actions,
        flags,
    }
}

fn map_flag(raw: &Value) -> Option<Flag> {
    let obj = raw.as_object()?;
    let raw_severity = lenient_text(obj.get("severity"));
    let severity = Severity::parse(&raw_severity).unwrap_or_else(|| {
        warn!(
            "⚠️ 无法识别的警告等级 '{}'，按 {} 处理",
            raw_severity, FALLBACK_SEVERITY
        );
        FALLBACK_SEVERITY
    });
    Some(Flag {
        kind: lenient_text(obj.get("type")),
        severity,
        message: lenient_text(obj.get("message")),
    })
}

fn map_metrics(raw: &Map<String, Value>) -> Metrics {
    Metrics {
        cash_flow: numeric_fields(raw.get("cash_flow")),
        expense_breakdown: numeric_fields(raw.get("expense_breakdown")),
        income_sources: raw
            .get("income_sources")
            .and_then(Value::as_object)
            .map(map_income_sources),
        debt_and_savings: raw
            .get("debt_and_savings")
            .and_then(Value::as_object)
            .map(map_debt_and_savings),
    }
}

fn map_income_sources(raw: &Map<String, Value>) -> IncomeSources {
    IncomeSources {
        regular: raw.get("regular").and_then(count_or_number).unwrap_or(0.0),
        irregular: raw.get("irregular").and_then(count_or_number).unwrap_or(0.0),
    }
}

fn map_debt_and_savings(raw: &Map<String, Value>) -> DebtAndSavings {
    let credit_utilization = match raw.get("credit_utilization") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => n.as_f64().map(format_ratio_as_percent),
        _ => None,
    };

    let outstanding_debt = match raw.get("outstanding_debt") {
        Some(Value::Array(items)) => Some(OutstandingDebt::Itemized(
            items.iter().filter_map(map_debt_item).collect(),
        )),
        Some(value) => lenient_number(value).map(OutstandingDebt::Total),
        None => None,
    };

    let financial_indicators = raw
        .get("financial_indicators")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .map(|obj| FinancialIndicator {
                    category: lenient_text(obj.get("category")),
                    observation: lenient_text(obj.get("observation")),
                    impact: lenient_text(obj.get("impact")),
                })
                .collect()
        })
        .unwrap_or_default();

    DebtAndSavings {
        credit_utilization,
        outstanding_debt,
        financial_indicators,
    }
}

fn map_debt_item(raw: &Value) -> Option<DebtItem> {
    match raw {
        Value::Object(obj) => Some(DebtItem {
            amount: obj.get("amount").and_then(lenient_number).unwrap_or(0.0),
            description: lenient_text(obj.get("description")),
        }),
        other => lenient_number(other).map(|amount| DebtItem {
            amount,
            description: String::new(),
        }),
    }
}

// ========== 辅助函数 ==========

fn required_object<'a>(
    value: &'a Value,
    key: &str,
    path: &'static str,
) -> Result<&'a Map<String, Value>, MappingError> {
    let obj = value.as_object().ok_or(MappingError::WrongType {
        path: "<root>",
        expected: "object",
    })?;
    required_object_in(obj, key, path)
}

fn required_object_in<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &'static str,
) -> Result<&'a Map<String, Value>, MappingError> {
    match obj.get(key) {
        None | Some(Value::Null) => Err(MappingError::MissingField { path }),
        Some(Value::Object(inner)) => Ok(inner),
        Some(_) => Err(MappingError::WrongType {
            path,
            expected: "object",
        }),
    }
}

/// 数字或数字字符串（允许 `%` 后缀），NaN / 无穷大视为无效
fn lenient_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// 数字，或者列表（取条目数）
fn count_or_number(value: &Value) -> Option<f64> {
    match value {
        Value::Array(items) => Some(items.len() as f64),
        other => lenient_number(other),
    }
}

/// 字符串原样返回，缺失为空串，其他类型转为 JSON 文本
fn lenient_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// 非数字字段直接丢弃
fn numeric_fields(value: Option<&Value>) -> NumericFields {
    let mut fields = BTreeMap::new();
    if let Some(obj) = value.and_then(Value::as_object) {
        for (key, raw) in obj {
            match lenient_number(raw) {
                Some(n) => {
                    fields.insert(key.clone(), n);
                }
                None => debug!("忽略非数值指标 {}: {}", key, raw),
            }
        }
    }
    NumericFields(fields)
}

/// 0.45 -> "45%"
fn format_ratio_as_percent(ratio: f64) -> String {
    let percent = format!("{:.1}", ratio * 100.0);
    let trimmed = percent.strip_suffix(".0").unwrap_or(&percent);
    format!("{}%", trimmed)
}
