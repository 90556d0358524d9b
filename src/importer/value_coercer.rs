// ==========================================
// HPV 疫苗接种追踪系统 - 值转换器
// ==========================================
// 职责: 单元格值 → 整数 / 布尔 / 月报月份
// 说明: 纯函数；除月份/年份非法外不产生错误
// ==========================================

use crate::domain::row::CellValue;
use crate::importer::error::ImportError;
use chrono::NaiveDate;

/// 两位年份分界（< 50 → 20xx，>= 50 → 19xx）
pub const DEFAULT_YEAR_PIVOT: i32 = 50;

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

pub struct ValueCoercer {
    year_pivot: i32,
}

impl Default for ValueCoercer {
    fn default() -> Self {
        Self::new(DEFAULT_YEAR_PIVOT)
    }
}

impl ValueCoercer {
    pub fn new(year_pivot: i32) -> Self {
        Self { year_pivot }
    }

    /// 转整数
    ///
    /// # 规则
    /// - 缺失/空值 → None
    /// - 数字单元格 → 截断取整
    /// - 文本 → 按十进制解析前导整数（仅忽略三位一组的千分位逗号）；无数字 → None（视为缺失而非 0）
    /// - 布尔 → None
    pub fn to_numeric(&self, value: Option<&CellValue>) -> Option<i64> {
        match value? {
            CellValue::Empty | CellValue::Bool(_) => None,
            CellValue::Number(n) if n.is_finite() => Some(n.trunc() as i64),
            CellValue::Number(_) => None,
            CellValue::Text(text) => parse_leading_int(text),
        }
    }

    /// 转布尔
    ///
    /// # 规则
    /// - 缺失/空值 → default
    /// - 布尔 → 原值；数字 → 非零为 true
    /// - 文本（去空白、忽略大小写）: yes/true/1/y → true；no/false/0/n → false；其他 → default
    pub fn to_boolean(&self, value: Option<&CellValue>, default: bool) -> bool {
        match value {
            None | Some(CellValue::Empty) => default,
            Some(CellValue::Bool(b)) => *b,
            Some(CellValue::Number(n)) => *n != 0.0,
            Some(CellValue::Text(text)) => match text.trim().to_lowercase().as_str() {
                "yes" | "true" | "1" | "y" => true,
                "no" | "false" | "0" | "n" => false,
                _ => default,
            },
        }
    }

    /// 可选文本（空值 → None）
    pub fn to_optional_text(&self, value: Option<&CellValue>) -> Option<String> {
        value.and_then(CellValue::as_text)
    }

    /// 年 + 月 → 月初日期（YYYY-MM-01）
    ///
    /// # 规则
    /// - 月: 1–12 整数，或英文月份全称/片段（忽略大小写，子串匹配，先命中者优先）
    /// - 年: 整数；0–99 按分界展开
    pub fn to_report_month(
        &self,
        year: &CellValue,
        month: &CellValue,
    ) -> Result<NaiveDate, ImportError> {
        let month_text = month.as_text().unwrap_or_default();
        let month_no = parse_month(&month_text)
            .ok_or_else(|| ImportError::InvalidMonth(month_text.clone()))?;

        let year_text = year.as_text().unwrap_or_default();
        let year_no = self
            .parse_year(&year_text)
            .ok_or_else(|| ImportError::InvalidYear(year_text.clone()))?;

        NaiveDate::from_ymd_opt(year_no, month_no, 1)
            .ok_or(ImportError::InvalidYear(year_text))
    }

    fn parse_year(&self, text: &str) -> Option<i32> {
        let year = parse_leading_int(text)?;
        let year = i32::try_from(year).ok()?;
        match year {
            y if y < 0 => None,
            y if y < 100 => Some(if y < self.year_pivot { 2000 + y } else { 1900 + y }),
            y => Some(y),
        }
    }
}

fn parse_month(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(n) = text.parse::<u32>() {
        if (1..=12).contains(&n) {
            return Some(n);
        }
    }

    let lower = text.to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|name| name.contains(lower.as_str()))
        .map(|idx| idx as u32 + 1)
}

/// 前导整数；逗号仅在分隔三位一组的千分位时忽略（"1,000" → 1000，"1,2,3" → 1）
fn parse_leading_int(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let bytes = rest.as_bytes();
    let lead = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if lead == 0 {
        return None;
    }

    let mut digits = String::from(&rest[..lead]);
    let mut pos = lead;
    // 首组不超过 3 位时才可能是千分位
    if lead <= 3 {
        while bytes.get(pos) == Some(&b',') {
            let group = &bytes[pos + 1..];
            let run = group.iter().take_while(|b| b.is_ascii_digit()).count();
            if run != 3 {
                break;
            }
            digits.push_str(&rest[pos + 1..pos + 4]);
            pos += 4;
        }
    }

    let value = digits.parse::<i64>().ok()?;
    Some(if negative { -value } else { value })
}
