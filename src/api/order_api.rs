// ==========================================
// 印章定制订单管理系统 - 订单 API
// ==========================================
// 职责: 订单 CRUD、聚合读模型、余额结算
// 说明: 聚合与结算均为读时投影,不落库（缓存刷新走条目 API）
// ==========================================

use std::sync::Arc;
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::config::EngineConfigReader;
use crate::domain::order::Order;
use crate::engine::aggregation::{OrderAggregator, OrderSummary};
use crate::engine::balance::{BalanceCore, BalanceView};
use crate::engine::repositories::OrderRepositories;

// ==========================================
// OrderHeaderEdit - 订单头编辑
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct OrderHeaderEdit {
    pub customer_id: Option<String>,
    pub carrier: Option<Option<String>>,
    pub service: Option<Option<String>>,
    pub origin: Option<Option<String>>,
    pub deadline: Option<Option<chrono::NaiveDate>>,
    pub tasks: Option<Vec<String>>,
}

// ==========================================
// OrderApi - 订单 API
// ==========================================
pub struct OrderApi {
    repos: OrderRepositories,
    config: Arc<dyn EngineConfigReader>,
}

impl OrderApi {
    /// 创建新的 OrderApi 实例
    pub fn new(repos: OrderRepositories, config: Arc<dyn EngineConfigReader>) -> Self {
        Self { repos, config }
    }

    // ==========================================
    // 订单 CRUD
    // ==========================================

    /// 创建订单头
    pub async fn create_order(&self, customer_id: &str) -> ApiResult<Order> {
        if customer_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("客户ID不能为空".to_string()));
        }

        let order = Order::new(customer_id);
        self.repos.order_repo.insert(&order)?;
        debug!(order_id = %order.order_id, customer_id, "订单已创建");
        Ok(order)
    }

    /// 查询订单头
    pub async fn get_order(&self, order_id: &str) -> ApiResult<Order> {
        self.repos
            .order_repo
            .find_by_id(order_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Order(id={})不存在", order_id)))
    }

    /// 订单头编辑（客户/发货选择/交期/任务）
    pub async fn edit_header(&self, order_id: &str, edit: OrderHeaderEdit) -> ApiResult<Order> {
        let mut order = self.get_order(order_id).await?;

        if let Some(v) = edit.customer_id {
            if v.trim().is_empty() {
                return Err(ApiError::InvalidInput("客户ID不能为空".to_string()));
            }
            order.customer_id = v;
        }
        if let Some(v) = edit.carrier {
            order.carrier = v;
        }
        if let Some(v) = edit.service {
            order.service = v;
        }
        if let Some(v) = edit.origin {
            order.origin = v;
        }
        if let Some(v) = edit.deadline {
            order.deadline = v;
        }
        if let Some(v) = edit.tasks {
            order.tasks = v;
        }

        self.repos.order_repo.update_header(&order)?;
        Ok(order)
    }

    /// 删除订单（级联删除条目;条目删除不会反向删除订单）
    pub async fn delete_order(&self, order_id: &str) -> ApiResult<()> {
        self.repos.order_repo.delete(order_id)?;
        debug!(order_id, "订单及其条目已删除");
        Ok(())
    }

    // ==========================================
    // 读模型
    // ==========================================

    /// 订单聚合读模型
    ///
    /// # 返回
    /// - Ok(OrderSummary): 派生读模型
    /// - Err(AggregationFailed): 空单或条目归属错误
    pub async fn order_summary(&self, order_id: &str) -> ApiResult<OrderSummary> {
        let order = self.get_order(order_id).await?;
        let stamps = self.repos.stamp_repo.find_by_order(order_id)?;
        Ok(OrderAggregator::aggregate(&order, &stamps)?)
    }

    /// 订单余额（折算运费,防重复）
    ///
    /// # 流程
    /// 1. base = Σ(条目金额 − 定金)
    /// 2. (承运商, 服务) 查价目表;缺失/兜底/未命中 → 待定
    /// 3. 以订单缓存 total_remaining 为持久化口径,走防重复启发式
    pub async fn order_balance(&self, order_id: &str) -> ApiResult<BalanceView> {
        let order = self.get_order(order_id).await?;
        let stamps = self.repos.stamp_repo.find_by_order(order_id)?;
        if stamps.is_empty() {
            return Err(ApiError::AggregationFailed(
                crate::engine::aggregation::AggregationError::EmptyOrder {
                    order_id: order_id.to_string(),
                },
            ));
        }

        let base: f64 = stamps.iter().map(|s| s.base_remaining()).sum();

        let table_cost = self
            .repos
            .shipping_rate_repo
            .find_cost(order.carrier.as_deref(), order.service.as_deref())?;
        let resolution = BalanceCore::resolve_shipping_cost(order.carrier.as_deref(), table_cost);

        let policy = self
            .config
            .get_stale_remaining_policy()
            .await
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        Ok(BalanceCore::remaining(
            base,
            Some(order.total_remaining),
            resolution,
            policy,
        ))
    }

    /// 条目余额（同一启发式,作用于单条目）
    pub async fn stamp_balance(&self, stamp_id: &str) -> ApiResult<BalanceView> {
        let stamp = self
            .repos
            .stamp_repo
            .find_by_id(stamp_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Stamp(id={})不存在", stamp_id)))?;
        let order = self.get_order(&stamp.order_id).await?;

        let table_cost = self
            .repos
            .shipping_rate_repo
            .find_cost(order.carrier.as_deref(), order.service.as_deref())?;
        let resolution = BalanceCore::resolve_shipping_cost(order.carrier.as_deref(), table_cost);

        let policy = self
            .config
            .get_stale_remaining_policy()
            .await
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        Ok(BalanceCore::remaining(
            stamp.base_remaining(),
            stamp.stored_remaining,
            resolution,
            policy,
        ))
    }
}
