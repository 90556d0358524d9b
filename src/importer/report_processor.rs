// ==========================================
// HPV 疫苗接种追踪系统 - 月报处理器
// ==========================================
// 职责: 原始行 → 标准化月报；行级错误只累积，不中断批次
// 流程: 中心名称 → 中心匹配 → 月份 → 数值 → 布尔/文本 → 派生总剂次
// ==========================================

use crate::domain::report::{CanonicalReport, ImportResult, RowError};
use crate::domain::row::RawRow;
use crate::importer::center_matcher::CenterMatcher;
use crate::importer::column_resolver::{columns, ColumnResolver};
use crate::importer::value_coercer::ValueCoercer;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};

pub const MSG_MISSING_PHC_NAME: &str = "Missing PHC name";
pub const MSG_MISSING_MONTH_OR_YEAR: &str = "Missing month or year";
pub const MSG_INVALID_NUMERICS: &str = "Missing or invalid numeric values";

/// 单行处理结果
#[derive(Debug)]
enum RowOutcome {
    Accepted(CanonicalReport),
    Rejected {
        error: RowError,
        unmatched_center: Option<String>,
    },
}

impl RowOutcome {
    fn reject(row: usize, message: impl Into<String>) -> Self {
        RowOutcome::Rejected {
            error: RowError {
                row,
                message: message.into(),
            },
            unmatched_center: None,
        }
    }
}

pub struct ReportProcessor {
    resolver: ColumnResolver,
    coercer: ValueCoercer,
}

impl Default for ReportProcessor {
    fn default() -> Self {
        Self::new(ValueCoercer::default())
    }
}

impl ReportProcessor {
    pub fn new(coercer: ValueCoercer) -> Self {
        Self {
            resolver: ColumnResolver,
            coercer,
        }
    }

    /// 处理全部行
    ///
    /// # 说明
    /// - 每行独立处理，单行失败不影响其他行
    /// - processed_reports 保持输入顺序；errors 按行号递增
    /// - unmatched_centers 去重
    #[instrument(skip(self, rows, matcher))]
    pub fn process<I>(&self, rows: I, matcher: &CenterMatcher, acting_user_id: &str) -> ImportResult
    where
        I: IntoIterator<Item = RawRow>,
    {
        let mut unmatched: BTreeSet<String> = BTreeSet::new();

        let mut result = rows
            .into_iter()
            .enumerate()
            .map(|(idx, row)| self.process_row(&row, idx + 1, matcher))
            .fold(ImportResult::default(), |mut acc, outcome| {
                match outcome {
                    RowOutcome::Accepted(report) => acc.processed_reports.push(report),
                    RowOutcome::Rejected {
                        error,
                        unmatched_center,
                    } => {
                        warn!(row = error.row, message = %error.message, "行被拒绝");
                        if let Some(name) = unmatched_center {
                            unmatched.insert(name);
                        }
                        acc.errors.push(error);
                    }
                }
                acc
            });

        result.unmatched_centers = unmatched.into_iter().collect();

        info!(
            processed = result.processed_reports.len(),
            errors = result.errors.len(),
            unmatched = result.unmatched_centers.len(),
            "月报行处理完成"
        );
        result
    }

    fn process_row(&self, row: &RawRow, row_number: usize, matcher: &CenterMatcher) -> RowOutcome {
        // 1. 中心名称
        let center_name = match self
            .resolver
            .resolve(row, columns::PHC_NAME)
            .and_then(|v| v.as_text())
        {
            Some(name) => name,
            None => return RowOutcome::reject(row_number, MSG_MISSING_PHC_NAME),
        };

        // 2. 中心匹配
        let center = match matcher.find(&center_name) {
            Some(center) => center,
            None => {
                return RowOutcome::Rejected {
                    error: RowError {
                        row: row_number,
                        message: format!("PHC not found: \"{}\"", center_name),
                    },
                    unmatched_center: Some(center_name),
                }
            }
        };

        // 3. 月份
        let month = self
            .resolver
            .resolve(row, columns::MONTH)
            .filter(|v| !v.is_blank());
        let year = self
            .resolver
            .resolve(row, columns::YEAR)
            .filter(|v| !v.is_blank());
        let (year, month) = match (year, month) {
            (Some(year), Some(month)) => (year, month),
            _ => return RowOutcome::reject(row_number, MSG_MISSING_MONTH_OR_YEAR),
        };
        let report_month = match self.coercer.to_report_month(year, month) {
            Ok(date) => date,
            Err(e) => return RowOutcome::reject(row_number, e.to_string()),
        };

        // 4. 数值（四项全有或整行拒绝）
        let numeric = |aliases: &[&str]| {
            self.coercer
                .to_numeric(self.resolver.resolve(row, aliases))
                .and_then(|n| u32::try_from(n).ok())
        };
        let (stock_beginning, stock_end, fixed_doses, outreach_doses) = match (
            numeric(columns::STOCK_BEGINNING),
            numeric(columns::STOCK_END),
            numeric(columns::FIXED_DOSES),
            numeric(columns::OUTREACH_DOSES),
        ) {
            (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
            _ => return RowOutcome::reject(row_number, MSG_INVALID_NUMERICS),
        };

        // 5. 布尔与可选文本
        let flag = |aliases: &[&str], default: bool| {
            self.coercer
                .to_boolean(self.resolver.resolve(row, aliases), default)
        };
        let text = |aliases: &[&str]| {
            self.coercer
                .to_optional_text(self.resolver.resolve(row, aliases))
        };

        // 6. 总剂次始终派生
        let total_doses = match fixed_doses.checked_add(outreach_doses) {
            Some(total) => total,
            None => return RowOutcome::reject(row_number, MSG_INVALID_NUMERICS),
        };

        debug!(row = row_number, center_id = %center.id, month = %report_month, "行转换成功");

        // 7. 输出
        RowOutcome::Accepted(CanonicalReport {
            center_id: center.id.clone(),
            center_name: center.name.clone(),
            report_month,
            in_stock: flag(columns::IN_STOCK, true),
            stock_beginning,
            stock_end,
            shortage: flag(columns::SHORTAGE, false),
            shortage_response: text(columns::SHORTAGE_RESPONSE),
            outreach: flag(columns::OUTREACH, false),
            fixed_doses,
            outreach_doses,
            total_doses,
            misinformation: text(columns::MISINFORMATION),
            dhis_check: flag(columns::DHIS_CHECK, false),
        })
    }
}
