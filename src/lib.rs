// ==========================================
// 印章定制订单管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 订单/条目生命周期规则引擎
// 红线: 引擎层纯函数;存储边界消化历史词汇;补丁集整体落库
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AspireSubstate, FabricationState, ProductionState, SaleState, ShippingState,
};

// 领域实体
pub use domain::{Order, RawStampRecord, Stamp};

// 引擎
pub use engine::{
    BalanceCore, BalanceView, FabricationSummary, GuardViolation, OrderAggregator,
    OrderSummary, QueueComparator, RankKey, ShippingCostResolution, SortCriterion,
    SortDirection, SortKey, StaleRemainingPolicy, TransitionCore, TransitionOutcome,
    TransitionRequest,
};

// API
pub use api::{OrderApi, QueueApi, StampApi, TransitionReport};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "印章定制订单管理系统";
