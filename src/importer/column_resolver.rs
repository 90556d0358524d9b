// ==========================================
// HPV 疫苗接种追踪系统 - 列解析器
// ==========================================
// 职责: 按别名顺序查找列值（先精确，再大小写不敏感）
// 说明: 找不到是正常结果，不产生错误
// ==========================================

use crate::domain::row::{CellValue, RawRow};

// ==========================================
// 列名别名表（表格列名为唯一的外部契约）
// ==========================================
pub mod columns {
    pub const PHC_NAME: &[&str] = &["PHC Name", "PHCName", "Center Name", "Healthcare Center"];
    pub const MONTH: &[&str] = &["Month", "Report Month", "Reporting Month"];
    pub const YEAR: &[&str] = &["Year", "Report Year", "Reporting Year"];

    pub const STOCK_BEGINNING: &[&str] = &[
        "Stock Beginning",
        "Stock at Beginning",
        "Beginning Stock",
        "Opening Stock",
        "stock_beginning",
    ];
    pub const STOCK_END: &[&str] = &[
        "Stock End",
        "Stock at End",
        "Ending Stock",
        "Closing Stock",
        "stock_end",
    ];
    pub const FIXED_DOSES: &[&str] = &["Fixed Doses", "Fixed", "Doses Fixed", "fixed_doses"];
    pub const OUTREACH_DOSES: &[&str] = &["Outreach Doses", "Doses Outreach", "outreach_doses"];

    pub const IN_STOCK: &[&str] = &["In Stock", "HPV In Stock", "in_stock"];
    pub const SHORTAGE: &[&str] = &["Shortage", "Stock Shortage", "shortage"];
    pub const SHORTAGE_RESPONSE: &[&str] =
        &["Shortage Response", "Response to Shortage", "shortage_response"];
    pub const OUTREACH: &[&str] = &["Outreach", "Outreach Conducted", "outreach"];
    pub const MISINFORMATION: &[&str] =
        &["Misinformation", "Misinformation Reported", "misinformation"];
    pub const DHIS_CHECK: &[&str] = &["DHIS Check", "DHIS2 Check", "DHIS Checked", "dhis_check"];
}

/// 表头规范化：小写 + 去除全部空白
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

pub struct ColumnResolver;

impl ColumnResolver {
    /// 按候选列名顺序查找列值
    ///
    /// # 规则
    /// 1. 每个候选名先做精确匹配
    /// 2. 再对行内所有列名做大小写、空白不敏感匹配（与必填表头校验一致）
    /// 3. 返回第一个命中的值；全部未命中返回 None
    pub fn resolve<'a>(&self, row: &'a RawRow, candidates: &[&str]) -> Option<&'a CellValue> {
        for candidate in candidates {
            if let Some(value) = row.get(candidate) {
                return Some(value);
            }

            let wanted = normalize_header(candidate);
            if let Some((_, value)) = row
                .iter()
                .find(|(key, _)| normalize_header(key) == wanted)
            {
                return Some(value);
            }
        }
        None
    }
}
