// ==========================================
// HPV 疫苗接种追踪系统 - 中心名称匹配器
// ==========================================
// 职责: 自由文本中心名称 → 中心引用
// 规则: 小写后仅保留 a-z0-9 作为索引键；不做相似度匹配
// ==========================================

use crate::domain::center::HealthcareCenterRef;
use crate::importer::error::ImportError;
use crate::repository::CenterRepository;
use std::collections::HashMap;
use tracing::{info, warn};

/// 名称规范化（"St. Mary's Clinic" → "stmarysclinic"）
pub fn normalize_center_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

pub struct CenterMatcher {
    index: HashMap<String, HealthcareCenterRef>,
    collisions: Vec<String>,
}

impl CenterMatcher {
    /// 由中心列表构建索引
    ///
    /// 规范化后同名的中心: 后加载者覆盖先加载者，并记录告警
    pub fn new(centers: Vec<HealthcareCenterRef>) -> Self {
        let mut index: HashMap<String, HealthcareCenterRef> = HashMap::new();
        let mut collisions = Vec::new();

        for center in centers {
            let key = normalize_center_name(&center.name);
            if key.is_empty() {
                warn!(center_id = %center.id, name = %center.name, "中心名称规范化后为空，跳过索引");
                continue;
            }

            if let Some(previous) = index.insert(key.clone(), center) {
                warn!(
                    key = %key,
                    overwritten_id = %previous.id,
                    "中心名称规范化后重复，后加载者生效"
                );
                collisions.push(key);
            }
        }

        Self { index, collisions }
    }

    /// 从中心仓储加载（单次导入一次）
    pub async fn load<R>(center_repo: &R) -> Result<Self, ImportError>
    where
        R: CenterRepository + ?Sized,
    {
        let centers = center_repo
            .list_centers()
            .await
            .map_err(|e| ImportError::CenterLoadError(e.to_string()))?;

        info!(centers = centers.len(), "中心列表加载完成");
        Ok(Self::new(centers))
    }

    /// 按名称查找中心；未命中返回 None（不重试）
    pub fn find(&self, name: &str) -> Option<&HealthcareCenterRef> {
        let key = normalize_center_name(name);
        if key.is_empty() {
            return None;
        }
        self.index.get(&key)
    }

    /// 规范化后重复的索引键
    pub fn collisions(&self) -> &[String] {
        &self.collisions
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
