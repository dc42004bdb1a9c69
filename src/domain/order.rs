// ==========================================
// 印章定制订单管理系统 - 订单领域模型
// ==========================================
// 红线: 订单级合计是派生读模型,永远可由条目集重算
// ==========================================

use crate::domain::types::{SaleState, ShippingState};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// Order - 订单头
// ==========================================
// 同一客户、同一发货选择下的一组条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    // ===== 主键与关联 =====
    pub order_id: String,    // 订单唯一标识（UUID）
    pub customer_id: String, // 客户引用

    // ===== 发货选择 =====
    pub carrier: Option<String>, // 承运商（"Otro" = 通用兜底,运费按待定处理）
    pub service: Option<String>, // 服务档位
    pub origin: Option<String>,  // 寄出地

    // ===== 发货状态（单一事实,条目行仅是冗余副本）=====
    pub shipping_state: ShippingState,

    // ===== 缓存合计（派生,读取时可由聚合引擎重算）=====
    pub total_value: f64,
    pub total_deposit: f64,
    pub total_remaining: f64,
    pub sale_summary: Option<SaleState>, // 全单一致时的销售状态,混合为 None

    // ===== 交期与任务 =====
    pub deadline: Option<NaiveDate>,
    pub tasks: Vec<String>, // 待办清单

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// 新建订单头（无条目,合计为零）
    pub fn new(customer_id: &str) -> Self {
        let now = Utc::now();
        Self {
            order_id: Uuid::new_v4().to_string(),
            customer_id: customer_id.to_string(),
            carrier: None,
            service: None,
            origin: None,
            shipping_state: ShippingState::NoShipment,
            total_value: 0.0,
            total_deposit: 0.0,
            total_remaining: 0.0,
            sale_summary: None,
            deadline: None,
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
