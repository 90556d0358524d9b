// ==========================================
// HPV 疫苗接种追踪系统 - 医疗中心领域模型
// ==========================================
// 对齐: healthcare_centers 表
// 用途: 导入层只读引用；登记接口写入
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// HealthcareCenterRef - 医疗中心引用
// ==========================================
// 单次导入期间视为时点快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthcareCenterRef {
    pub id: String,    // 中心 ID（UUID，不透明）
    pub name: String,  // 中心名称（PHC 名称）
    pub state: String, // 州
    pub lga: String,   // 地方政府区
}

// ==========================================
// HealthcareCenter - 医疗中心完整记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthcareCenter {
    #[serde(flatten)]
    pub center: HealthcareCenterRef,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// NewCenterRequest - 中心登记请求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCenterRequest {
    pub name: String,
    pub state: String,
    pub lga: String,
}
