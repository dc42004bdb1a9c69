// ==========================================
// 印章定制订单管理系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合 API 层所需的全部 Repository
// 目标: 减少服务构造函数参数数量,便于测试时整体注入
// ==========================================

use std::sync::Arc;

use crate::repository::{OrderRepository, ShippingRateRepository, StampRepository};

/// 订单引擎仓储集合
#[derive(Clone)]
pub struct OrderRepositories {
    /// 印章条目仓储
    pub stamp_repo: Arc<StampRepository>,
    /// 订单仓储
    pub order_repo: Arc<OrderRepository>,
    /// 运费价目仓储
    pub shipping_rate_repo: Arc<ShippingRateRepository>,
}

impl OrderRepositories {
    /// 创建新的仓储集合
    pub fn new(
        stamp_repo: Arc<StampRepository>,
        order_repo: Arc<OrderRepository>,
        shipping_rate_repo: Arc<ShippingRateRepository>,
    ) -> Self {
        Self {
            stamp_repo,
            order_repo,
            shipping_rate_repo,
        }
    }

    /// 从同一数据库连接构建全套仓储
    pub fn from_shared_connection(
        conn: std::sync::Arc<std::sync::Mutex<rusqlite::Connection>>,
    ) -> Self {
        Self {
            stamp_repo: Arc::new(StampRepository::from_connection(conn.clone())),
            order_repo: Arc::new(OrderRepository::from_connection(conn.clone())),
            shipping_rate_repo: Arc::new(ShippingRateRepository::from_connection(conn)),
        }
    }
}
