// ==========================================
// 印章定制订单管理系统 - 引擎层
// ==========================================
// 职责: 实现订单/条目业务规则引擎,不拼 SQL
// 红线: Engine 不拼 SQL, 所有规则必须输出 reason
// ==========================================

pub mod aggregation;
pub mod balance;
pub mod priority;
pub mod repositories;
pub mod transition_core;

// 重导出核心引擎
pub use aggregation::{AggregationError, FabricationSummary, OrderAggregator, OrderSummary};
pub use balance::{
    BalanceCore, BalanceView, ShippingCostResolution, StaleRemainingPolicy, FALLBACK_CARRIER,
    REMAINING_EPSILON,
};
pub use priority::{QueueComparator, RankKey, SortCriterion, SortDirection, SortKey};
pub use repositories::OrderRepositories;
pub use transition_core::{
    GuardViolation, SiblingPatch, TransitionCore, TransitionOutcome, TransitionRequest,
};
