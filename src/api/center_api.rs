// ==========================================
// HPV 疫苗接种追踪系统 - 医疗中心 API
// ==========================================
// 职责: 中心登记、查询、删除
// 规则: 规范化名称不得与已有中心重复（保证导入匹配无歧义）
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::center::{HealthcareCenter, HealthcareCenterRef, NewCenterRequest};
use crate::importer::center_matcher::normalize_center_name;
use crate::repository::{CenterRepository, ReportRepository};

// ==========================================
// CenterApi - 医疗中心 API
// ==========================================
pub struct CenterApi {
    center_repo: Arc<dyn CenterRepository>,
    report_repo: Arc<dyn ReportRepository>,
}

impl CenterApi {
    /// 创建新的CenterApi实例
    pub fn new(
        center_repo: Arc<dyn CenterRepository>,
        report_repo: Arc<dyn ReportRepository>,
    ) -> Self {
        Self {
            center_repo,
            report_repo,
        }
    }

    /// 登记新中心
    ///
    /// # 校验
    /// - name/state/lga 去空白后不得为空
    /// - 名称规范化后不得为空，且不得与已有中心冲突
    pub async fn register_center(&self, request: NewCenterRequest) -> ApiResult<HealthcareCenter> {
        let name = required_field("name", &request.name)?;
        let state = required_field("state", &request.state)?;
        let lga = required_field("lga", &request.lga)?;

        let key = normalize_center_name(&name);
        if key.is_empty() {
            return Err(ApiError::InvalidInput(format!(
                "center name \"{}\" has no letters or digits",
                name
            )));
        }

        let existing = self.center_repo.list_centers().await?;
        if let Some(clash) = existing
            .iter()
            .find(|c| normalize_center_name(&c.name) == key)
        {
            warn!(name = %name, existing_id = %clash.id, "中心名称冲突，拒绝登记");
            return Err(ApiError::BusinessRuleViolation(format!(
                "center name \"{}\" conflicts with existing center \"{}\"",
                name, clash.name
            )));
        }

        let center = HealthcareCenter {
            center: HealthcareCenterRef {
                id: Uuid::new_v4().to_string(),
                name,
                state,
                lga,
            },
            created_at: Utc::now(),
        };
        self.center_repo.insert_center(&center).await?;

        info!(center_id = %center.center.id, name = %center.center.name, "中心登记成功");
        Ok(center)
    }

    /// 查询全部中心
    pub async fn list_centers(&self) -> ApiResult<Vec<HealthcareCenterRef>> {
        Ok(self.center_repo.list_centers().await?)
    }

    /// 查询单个中心
    pub async fn get_center(&self, center_id: &str) -> ApiResult<HealthcareCenter> {
        self.center_repo
            .find_center(center_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("healthcare center {}", center_id)))
    }

    /// 删除中心（仍有月报引用时拒绝）
    pub async fn delete_center(&self, center_id: &str) -> ApiResult<()> {
        let reports = self.report_repo.list_reports_by_center(center_id).await?;
        if !reports.is_empty() {
            return Err(ApiError::BusinessRuleViolation(format!(
                "center {} still has {} monthly report(s)",
                center_id,
                reports.len()
            )));
        }

        if !self.center_repo.delete_center(center_id).await? {
            return Err(ApiError::NotFound(format!("healthcare center {}", center_id)));
        }

        info!(center_id = %center_id, "中心已删除");
        Ok(())
    }
}

fn required_field(field: &str, value: &str) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}
