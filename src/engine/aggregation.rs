// ==========================================
// 印章定制订单管理系统 - 订单聚合引擎
// ==========================================
// 职责: 由条目集派生订单级读模型（合计/优先/摘要）
// 红线: 纯函数,读时投影;输入不一致必须整体失败,禁止部分求和
// ==========================================

use crate::domain::order::Order;
use crate::domain::stamp::Stamp;
use crate::domain::types::{FabricationState, SaleState, ShippingState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==========================================
// FabricationSummary - 订单级制作摘要
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FabricationSummary {
    /// 全部条目同一制作状态（单条目订单恒为此分支）
    Uniform(FabricationState),
    /// 状态不一致;排序时按最紧迫条目处理
    Mixed,
}

// ==========================================
// OrderSummary - 订单读模型
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: String,
    pub item_count: usize,
    pub total_value: f64,
    pub total_deposit: f64,
    /// 不含运费的剩余额（运费由结算引擎另行折算）
    pub total_remaining: f64,
    pub has_priority: bool,
    pub fabrication_summary: FabricationSummary,
    /// 全单一致时的销售状态,混合为 None
    pub sale_summary: Option<SaleState>,
    /// 整单共享的发货状态
    pub shipping_state: ShippingState,
}

// ==========================================
// AggregationError - 聚合输入不一致
// ==========================================
// 对该次计算是致命的: 不返回部分结果
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    #[error("订单 {order_id} 无条目,无法聚合")]
    EmptyOrder { order_id: String },

    #[error("条目 {stamp_id} 属于订单 {item_order_id},不属于 {order_id}")]
    ForeignItem {
        order_id: String,
        stamp_id: String,
        item_order_id: String,
    },
}

// ==========================================
// OrderAggregator - 聚合引擎
// ==========================================
pub struct OrderAggregator;

impl OrderAggregator {
    /// 聚合订单读模型
    ///
    /// # 参数
    /// - order: 订单头
    /// - stamps: 该订单全部条目
    ///
    /// # 返回
    /// - Ok(OrderSummary): 派生读模型
    /// - Err(AggregationError): 空单或条目归属错误
    pub fn aggregate(order: &Order, stamps: &[Stamp]) -> Result<OrderSummary, AggregationError> {
        // 校验先行: 不一致输入禁止产出部分求和结果
        if stamps.is_empty() {
            return Err(AggregationError::EmptyOrder {
                order_id: order.order_id.clone(),
            });
        }
        for stamp in stamps {
            if stamp.order_id != order.order_id {
                return Err(AggregationError::ForeignItem {
                    order_id: order.order_id.clone(),
                    stamp_id: stamp.stamp_id.clone(),
                    item_order_id: stamp.order_id.clone(),
                });
            }
        }

        let total_value: f64 = stamps.iter().map(|s| s.value).sum();
        let total_deposit: f64 = stamps.iter().map(|s| s.deposit).sum();
        let has_priority = stamps.iter().any(|s| s.is_priority);

        let first_fab = stamps[0].fabrication_state();
        let fabrication_summary = if stamps.iter().all(|s| s.fabrication_state() == first_fab) {
            FabricationSummary::Uniform(first_fab)
        } else {
            FabricationSummary::Mixed
        };

        let first_sale = stamps[0].sale_state;
        let sale_summary = if stamps.iter().all(|s| s.sale_state == first_sale) {
            Some(first_sale)
        } else {
            None
        };

        Ok(OrderSummary {
            order_id: order.order_id.clone(),
            item_count: stamps.len(),
            total_value,
            total_deposit,
            total_remaining: total_value - total_deposit,
            has_priority,
            fabrication_summary,
            sale_summary,
            shipping_state: order.shipping_state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ProductionState;

    fn order_with_items(values: &[(f64, f64)]) -> (Order, Vec<Stamp>) {
        let order = Order::new("C001");
        let stamps = values
            .iter()
            .map(|(value, deposit)| {
                let mut s = Stamp::new(&order.order_id);
                s.value = *value;
                s.deposit = *deposit;
                s
            })
            .collect();
        (order, stamps)
    }

    #[test]
    fn test_totals_are_item_sums() {
        let (order, stamps) = order_with_items(&[(1000.0, 200.0), (500.0, 0.0)]);

        let summary = OrderAggregator::aggregate(&order, &stamps).unwrap();

        assert_eq!(summary.item_count, 2);
        assert_eq!(summary.total_value, 1500.0);
        assert_eq!(summary.total_deposit, 200.0);
        assert_eq!(summary.total_remaining, 1300.0);
    }

    #[test]
    fn test_single_item_inherits_state() {
        let (order, mut stamps) = order_with_items(&[(800.0, 100.0)]);
        stamps[0].production = ProductionState::Verify;

        let summary = OrderAggregator::aggregate(&order, &stamps).unwrap();

        assert_eq!(
            summary.fabrication_summary,
            FabricationSummary::Uniform(FabricationState::Verify)
        );
        assert_eq!(summary.sale_summary, Some(SaleState::Deposited));
    }

    #[test]
    fn test_mixed_states() {
        let (order, mut stamps) = order_with_items(&[(100.0, 0.0), (200.0, 0.0)]);
        stamps[0].production = ProductionState::Done;
        stamps[0].sale_state = SaleState::Transferred;
        stamps[1].production = ProductionState::InProgress;

        let summary = OrderAggregator::aggregate(&order, &stamps).unwrap();

        assert_eq!(summary.fabrication_summary, FabricationSummary::Mixed);
        assert_eq!(summary.sale_summary, None);
    }

    #[test]
    fn test_priority_any_semantics() {
        let (order, mut stamps) = order_with_items(&[(100.0, 0.0), (200.0, 0.0)]);
        stamps[1].is_priority = true;

        let summary = OrderAggregator::aggregate(&order, &stamps).unwrap();
        assert!(summary.has_priority);
    }

    #[test]
    fn test_empty_order_is_fatal() {
        let order = Order::new("C001");
        let err = OrderAggregator::aggregate(&order, &[]).unwrap_err();
        assert!(matches!(err, AggregationError::EmptyOrder { .. }));
    }

    #[test]
    fn test_foreign_item_is_fatal() {
        let (order, mut stamps) = order_with_items(&[(100.0, 0.0)]);
        stamps.push(Stamp::new("otro-pedido"));

        let err = OrderAggregator::aggregate(&order, &stamps).unwrap_err();
        assert!(matches!(err, AggregationError::ForeignItem { .. }));
    }
}
