// ==========================================
// 印章定制订单管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、状态类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod order;
pub mod stamp;
pub mod types;

// 重导出核心类型
pub use order::Order;
pub use stamp::{FieldDecodeError, RawStampRecord, Stamp};
pub use types::{
    AspireSubstate, FabricationState, ProductionState, SaleState, ShippingState,
};
