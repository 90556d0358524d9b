// ==========================================
// HPV 疫苗接种追踪系统 - 原始行模型
// ==========================================
// 用途: 文件解析产物（表头 → 单元格值）
// 生命周期: 解析后只读，仅在导入流程内
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// CellValue - 单元格值
// ==========================================
// CSV 单元格一律为 Text/Empty；Excel 单元格保留原生类型
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// 空值判定（Empty 或仅含空白的文本）
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 转为去空白后的文本；空值返回 None
    pub fn as_text(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        Some(self.to_string().trim().to_string())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            // 整数值不带小数点输出（Excel 数字单元格均为 f64）
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

// ==========================================
// RawRow - 原始行记录
// ==========================================
// 保留表头原始顺序，便于大小写不敏感查找时结果确定
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow {
    cells: Vec<(String, CellValue)>,
}

impl RawRow {
    pub fn new(cells: Vec<(String, CellValue)>) -> Self {
        Self { cells }
    }

    /// 由文本键值对构造（空字符串视为 Empty）
    pub fn from_text_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            cells: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), CellValue::from(*v)))
                .collect(),
        }
    }

    /// 精确键查找
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// 整行均为空值
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_blank())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_display_integer_number() {
        assert_eq!(CellValue::Number(12.0).to_string(), "12");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn test_cell_value_blank() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::Text("   ".to_string()).is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
        assert!(!CellValue::Bool(false).is_blank());
    }

    #[test]
    fn test_raw_row_exact_lookup() {
        let row = RawRow::from_text_pairs(&[("PHC Name", "Kuje PHC"), ("Month", "")]);
        assert_eq!(
            row.get("PHC Name"),
            Some(&CellValue::Text("Kuje PHC".to_string()))
        );
        assert_eq!(row.get("Month"), Some(&CellValue::Empty));
        assert_eq!(row.get("phc name"), None);
        assert!(!row.is_blank());
    }
}
