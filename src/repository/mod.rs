// ==========================================
// 印章定制订单管理系统 - 数据仓储层
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 红线: Repository 不含守卫/聚合逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod order_repo;
pub mod shipping_rate_repo;
pub mod stamp_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use order_repo::OrderRepository;
pub use shipping_rate_repo::ShippingRateRepository;
pub use stamp_repo::StampRepository;
