// ==========================================
// 印章定制订单管理系统 - 印章条目领域模型
// ==========================================
// 红线: 优先标志是独立布尔字段,不从制作状态派生
// 用途: 存储边界写入/读取,引擎层按值计算
// ==========================================

use crate::domain::types::{
    AspireSubstate, FabricationState, ProductionState, SaleState, ShippingState,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// Stamp - 印章条目（订单行）
// ==========================================
// 一个订单包含一个或多个条目,每个条目独立走
// 制作/销售生命周期;发货状态逻辑上属于整单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stamp {
    // ===== 主键与关联 =====
    pub stamp_id: String, // 条目唯一标识（UUID）
    pub order_id: String, // 所属订单（FK）

    // ===== 规格 =====
    pub stamp_type: Option<String>, // 印章类型
    pub width_cm: Option<f64>,      // 定制宽度（cm）
    pub height_cm: Option<f64>,     // 定制高度（cm）

    // ===== 生命周期状态 =====
    pub production: ProductionState,  // 生产状态（制作 + Aspire 合并变体）
    pub sale_state: SaleState,        // 销售状态
    pub shipping_state: ShippingState, // 发货状态（整单共享,按条目冗余存储）
    pub is_priority: bool,            // 优先标志（与生命周期状态正交）

    // ===== 排产指派 =====
    pub machine: Option<String>, // 机器指派（自由文本,与 program 互相独立）
    pub program: Option<String>, // 程序名（仅显式编辑可变更）

    // ===== 金额 =====
    pub value: f64,                     // 条目金额
    pub deposit: f64,                   // 已收定金
    pub stored_remaining: Option<f64>,  // 外部系统持久化的剩余额（可能已含运费）

    // ===== 文件引用（引擎不解释内容）=====
    pub base_file: Option<String>,   // 底图文件
    pub vector_file: Option<String>, // 矢量文件
    pub photo_file: Option<String>,  // 成品照片

    // ===== 备注 =====
    pub notes: Option<String>,

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stamp {
    /// 在订单内新建条目（初始状态: 未开始/已收定金/未发货/非优先）
    pub fn new(order_id: &str) -> Self {
        let now = Utc::now();
        Self {
            stamp_id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            stamp_type: None,
            width_cm: None,
            height_cm: None,
            production: ProductionState::NotStarted,
            sale_state: SaleState::Deposited,
            shipping_state: ShippingState::NoShipment,
            is_priority: false,
            machine: None,
            program: None,
            value: 0.0,
            deposit: 0.0,
            stored_remaining: None,
            base_file: None,
            vector_file: None,
            photo_file: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 制作状态投影
    pub fn fabrication_state(&self) -> FabricationState {
        self.production.fabrication()
    }

    /// Aspire 子状态投影
    pub fn aspire_substate(&self) -> Option<AspireSubstate> {
        self.production.aspire()
    }

    /// 面积（cm²,排序用;缺失尺寸 → None）
    pub fn area_cm2(&self) -> Option<f64> {
        match (self.width_cm, self.height_cm) {
            (Some(w), Some(h)) => Some(w * h),
            _ => None,
        }
    }

    /// 条目级基础剩余额（不含运费）
    pub fn base_remaining(&self) -> f64 {
        self.value - self.deposit
    }
}

// ==========================================
// RawStampRecord - 存储边界中间结构体
// ==========================================
// 用途: 托管库行 → Stamp 的归一化入口
// 历史翻译在此完成,引擎层只见归一化后的词汇
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawStampRecord {
    pub stamp_id: String,
    pub order_id: String,
    pub stamp_type: Option<String>,
    pub width_cm: Option<f64>,
    pub height_cm: Option<f64>,
    pub fabrication_src: Option<String>, // 制作状态源值（西语,可能为历史 "Prioridad"）
    pub sale_src: Option<String>,        // 销售状态源值
    pub shipping_src: Option<String>,    // 发货状态源值
    pub aspire_src: Option<String>,      // Aspire 子状态源值
    pub priority_flag: bool,             // 独立优先字段源值
    pub machine: Option<String>,
    pub program: Option<String>,
    pub value: f64,
    pub deposit: f64,
    pub stored_remaining: Option<f64>,
    pub base_file: Option<String>,
    pub vector_file: Option<String>,
    pub photo_file: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 边界归一化失败（行级,不阻断其他行）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecodeError {
    pub field: &'static str,
    pub value: String,
}

impl RawStampRecord {
    /// 归一化为引擎实体
    ///
    /// # 翻译规则
    /// 1. 历史 "Prioridad" → 制作状态 NOT_STARTED + is_priority=true
    ///    （布尔优先字段为准: 两处任一为真即为优先）
    /// 2. 制作状态列与 Aspire 列融合为 ProductionState(子状态非空优先)
    /// 3. 状态列缺失 → 条目创建初始值
    pub fn normalize(self) -> Result<Stamp, FieldDecodeError> {
        let mut is_priority = self.priority_flag;

        let fabrication = match self.fabrication_src.as_deref() {
            None => FabricationState::NotStarted,
            Some("Prioridad") => {
                // 历史枚举值在此消化,不进入引擎词汇表
                is_priority = true;
                FabricationState::NotStarted
            }
            Some(raw) => FabricationState::from_db_str(raw).ok_or(FieldDecodeError {
                field: "fabrication_state",
                value: raw.to_string(),
            })?,
        };

        let aspire = match self.aspire_src.as_deref() {
            None => None,
            Some(raw) => Some(AspireSubstate::from_db_str(raw).ok_or(FieldDecodeError {
                field: "aspire_substate",
                value: raw.to_string(),
            })?),
        };

        let sale_state = match self.sale_src.as_deref() {
            None => SaleState::Deposited,
            Some(raw) => SaleState::from_db_str(raw).ok_or(FieldDecodeError {
                field: "sale_state",
                value: raw.to_string(),
            })?,
        };

        let shipping_state = match self.shipping_src.as_deref() {
            None => ShippingState::NoShipment,
            Some(raw) => ShippingState::from_db_str(raw).ok_or(FieldDecodeError {
                field: "shipping_state",
                value: raw.to_string(),
            })?,
        };

        Ok(Stamp {
            stamp_id: self.stamp_id,
            order_id: self.order_id,
            stamp_type: self.stamp_type,
            width_cm: self.width_cm,
            height_cm: self.height_cm,
            production: ProductionState::from_parts(fabrication, aspire),
            sale_state,
            shipping_state,
            is_priority,
            machine: self.machine,
            program: self.program,
            value: self.value,
            deposit: self.deposit,
            stored_remaining: self.stored_remaining,
            base_file: self.base_file,
            vector_file: self.vector_file,
            photo_file: self.photo_file,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
