//! 把分析结果渲染为终端文本

use std::fmt::Write;

use crate::models::{AnalysisResult, OutstandingDebt, Severity};

/// 渲染完整报告
pub fn render_report(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let summary = &result.summary;

    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(
        out,
        "📊 总体评分: {} ({})",
        format_number(summary.overall_score),
        result.score_band()
    );
    let _ = writeln!(out, "🏦 健康状况: {}", summary.health_status);
    if let Some(decision) = summary.decision() {
        let _ = writeln!(out, "📝 结论: {}", decision);
    }
    if let Some(stated) = summary.stated_score() {
        if f64::from(stated) != summary.overall_score.round() {
            let _ = writeln!(out, "⚠️ 关键发现中的评分为 {}，与总体评分不一致", stated);
        }
    }
    let _ = writeln!(out, "{}", "=".repeat(60));

    if !summary.key_findings.is_empty() {
        let _ = writeln!(out, "\n关键发现:\n{}", summary.key_findings);
    }

    if !result.detailed_analysis.components.is_empty() {
        let _ = writeln!(out, "\n分项评分:");
        for (name, component) in &result.detailed_analysis.components {
            let _ = writeln!(
                out,
                "  - {}: {} [{}] {}",
                name,
                format_number(component.score),
                component.status,
                component.summary
            );
        }
    }

    if !result.detailed_analysis.narrative.is_empty() {
        let _ = writeln!(out, "\n详细分析:\n{}", result.detailed_analysis.narrative);
    }

    let recs = &result.recommendations;
    if !recs.immediate_actions.is_empty() {
        let _ = writeln!(out, "\n建议措施:");
        for (i, action) in recs.immediate_actions.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, action);
        }
    }
    if !recs.flags.is_empty() {
        let _ = writeln!(out, "\n⚠️ 警告:");
        // 高等级在前
        for severity in [Severity::High, Severity::Medium, Severity::Low] {
            for flag in result
                .flags_at_least(severity)
                .filter(|flag| flag.severity == severity)
            {
                let _ = writeln!(out, "  [{}] {}: {}", flag.severity, flag.kind, flag.message);
            }
        }
        let urgent = result.flags_at_least(Severity::High).count();
        if urgent > 0 {
            let _ = writeln!(out, "  共 {} 条高等级警告需要优先处理", urgent);
        }
    }

    render_metrics(&mut out, result);
    out
}

fn render_metrics(out: &mut String, result: &AnalysisResult) {
    let metrics = &result.metrics;
    let _ = writeln!(out, "\n财务指标:");

    for (title, fields) in [
        ("现金流", &metrics.cash_flow),
        ("支出构成", &metrics.expense_breakdown),
    ] {
        if fields.is_empty() {
            continue;
        }
        let _ = writeln!(out, "  {}:", title);
        for (name, value) in fields.iter() {
            let _ = writeln!(out, "    {}: {}", name, format_number(value));
        }
    }

    if let Some(income) = &metrics.income_sources {
        let _ = writeln!(
            out,
            "  收入来源: 固定 {} / 非固定 {}",
            format_number(income.regular),
            format_number(income.irregular)
        );
    }

    if let Some(debt) = &metrics.debt_and_savings {
        if let Some(utilization) = &debt.credit_utilization {
            let _ = writeln!(out, "  信用使用率: {}", utilization);
        }
        if let Some(outstanding) = &debt.outstanding_debt {
            let _ = writeln!(out, "  未偿债务: {}", format_number(outstanding.total()));
            if let OutstandingDebt::Itemized(items) = outstanding {
                for item in items {
                    let _ = writeln!(
                        out,
                        "    - {} ({})",
                        format_number(item.amount),
                        item.description
                    );
                }
            }
        }
        for indicator in &debt.financial_indicators {
            let _ = writeln!(
                out,
                "  • {}: {} ({})",
                indicator.category, indicator.observation, indicator.impact
            );
        }
    }
}

/// 整数不带小数点，其余保留两位
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::map_analysis_response;
    use serde_json::json;

    #[test]
    fn test_report_contains_key_sections() {
        let result = map_analysis_response(&json!({
            "final_output": {
                "summary": {
                    "overall_score": 82,
                    "health_status": "Good: Loan Approved",
                    "key_findings": "Score: 82\nDecision: LOAN_APPROVED"
                },
                "detailed_analysis": {
                    "components": {"cash_flow": {"score": 80, "status": "Loan Approved", "summary": "steady"}},
                    "narrative": "Consistent income."
                },
                "recommendations": {
                    "immediate_actions": ["Build an emergency fund"],
                    "flags": [{"type": "debt", "severity": "high", "message": "High utilization"}]
                },
                "metrics": {
                    "cash_flow": {"net_monthly_flow": 500.5},
                    "debt_and_savings": {
                        "outstanding_debt": [{"amount": 300, "description": "card"}]
                    }
                }
            }
        }))
        .unwrap();

        let report = render_report(&result);
        assert!(report.contains("总体评分: 82 (良好)"));
        assert!(report.contains("结论: LOAN_APPROVED"));
        assert!(report.contains("cash_flow: 80 [Loan Approved] steady"));
        assert!(report.contains("1. Build an emergency fund"));
        assert!(report.contains("[HIGH] debt: High utilization"));
        assert!(report.contains("net_monthly_flow: 500.50"));
        assert!(report.contains("未偿债务: 300"));
    }

    #[test]
    fn test_report_orders_flags_and_flags_score_mismatch() {
        let result = map_analysis_response(&json!({
            "final_output": {
                "summary": {
                    "overall_score": 45,
                    "health_status": "Poor: Loan Denied",
                    "key_findings": "Score: 60\nDecision: LOAN_DENIED"
                },
                "detailed_analysis": {"components": {}},
                "recommendations": {
                    "flags": [
                        {"type": "income", "severity": "low", "message": "Irregular deposits"},
                        {"type": "debt", "severity": "HIGH", "message": "Overdue loan"},
                        {"type": "spending", "severity": "medium", "message": "Gambling"}
                    ]
                }
            }
        }))
        .unwrap();

        let report = render_report(&result);
        assert!(report.contains("总体评分: 45 (较差)"));
        assert!(report.contains("关键发现中的评分为 60"));

        let high = report.find("[HIGH] debt").unwrap();
        let medium = report.find("[MEDIUM] spending").unwrap();
        let low = report.find("[LOW] income").unwrap();
        assert!(high < medium && medium < low);
        assert!(report.contains("共 1 条高等级警告"));
    }

    #[test]
    fn test_matching_stated_score_is_not_reported() {
        let result = map_analysis_response(&json!({
            "final_output": {
                "summary": {
                    "overall_score": 82,
                    "health_status": "Good",
                    "key_findings": "Score: 82"
                },
                "detailed_analysis": {"components": {}}
            }
        }))
        .unwrap();

        let report = render_report(&result);
        assert!(!report.contains("不一致"));
        assert!(!report.contains("高等级警告"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(82.0), "82");
        assert_eq!(format_number(-20.0), "-20");
        assert_eq!(format_number(0.126), "0.13");
    }
}
