// ==========================================
// 印章定制订单管理系统 - 余额结算引擎
// ==========================================
// 职责: 计算条目/订单剩余额,折算外部定价运费
// 红线: 运费防重复折算;幂等,反复计算不得漂移
// 说明: 持久化的剩余额可能由外部系统在别的时点算出,
//       是否已含运费只能用 epsilon 启发式判断
// ==========================================

use serde::{Deserialize, Serialize};

/// 运费重复折算判定阈值（货币单位）
pub const REMAINING_EPSILON: f64 = 0.01;

/// 通用兜底承运商: 运费按待定处理
pub const FALLBACK_CARRIER: &str = "Otro";

// ==========================================
// ShippingCostResolution - 运费解析结果
// ==========================================
// 未知线路不是错误: 归零并打待定标记
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingCostResolution {
    /// (承运商, 服务) 命中价目表
    Priced(f64),
    /// 承运商缺失/兜底承运商/线路未定价
    Pending,
}

impl ShippingCostResolution {
    /// 折算金额（待定 → 0）
    pub fn amount(&self) -> f64 {
        match self {
            ShippingCostResolution::Priced(cost) => *cost,
            ShippingCostResolution::Pending => 0.0,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ShippingCostResolution::Pending)
    }
}

// ==========================================
// StaleRemainingPolicy - 运费价目变动后的口径
// ==========================================
// 持久化剩余额与当前运费对不上时的处理策略（配置项）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaleRemainingPolicy {
    /// 视为过期,按当前运费重算（默认;显示口径跟随价目表）
    RecomputeOnMismatch,
    /// 已折入过运费的旧值保留（历史口径优先）
    PreserveStored,
}

impl Default for StaleRemainingPolicy {
    fn default() -> Self {
        StaleRemainingPolicy::RecomputeOnMismatch
    }
}

impl StaleRemainingPolicy {
    /// 从配置存储值解析
    pub fn from_db_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "PRESERVE_STORED" => StaleRemainingPolicy::PreserveStored,
            _ => StaleRemainingPolicy::RecomputeOnMismatch, // 默认值
        }
    }

    /// 转换为配置存储值
    pub fn to_db_str(&self) -> &'static str {
        match self {
            StaleRemainingPolicy::RecomputeOnMismatch => "RECOMPUTE_ON_MISMATCH",
            StaleRemainingPolicy::PreserveStored => "PRESERVE_STORED",
        }
    }
}

// ==========================================
// BalanceView - 余额读模型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceView {
    /// 展示金额
    pub amount: f64,
    /// 持久化口径是否已含运费（false = 本次计算临时加上）
    pub includes_shipping: bool,
    /// 运费待定（承运商缺失/兜底/线路未定价）
    pub shipping_pending: bool,
}

// ==========================================
// BalanceCore - 纯函数结算引擎
// ==========================================
pub struct BalanceCore;

impl BalanceCore {
    /// 解析运费
    ///
    /// # 规则
    /// 1. 承运商缺失 → PENDING
    /// 2. 兜底承运商 ("Otro") → PENDING
    /// 3. 价目表未命中 → PENDING
    /// 4. 否则 → PRICED(查表金额)
    ///
    /// # 参数
    /// - carrier: 订单承运商
    /// - table_cost: (承运商, 服务) 查表结果
    pub fn resolve_shipping_cost(
        carrier: Option<&str>,
        table_cost: Option<f64>,
    ) -> ShippingCostResolution {
        match carrier {
            None => ShippingCostResolution::Pending,
            Some(c) if c == FALLBACK_CARRIER => ShippingCostResolution::Pending,
            Some(_) => match table_cost {
                Some(cost) => ShippingCostResolution::Priced(cost),
                None => ShippingCostResolution::Pending,
            },
        }
    }

    /// 计算剩余额
    ///
    /// # 规则
    /// 1. base = 金额 − 定金（订单 = 条目求和）
    /// 2. |（stored − base）− 运费| < ε → 运费已折入,原样返回 stored
    /// 3. 否则按策略:
    ///    - RECOMPUTE_ON_MISMATCH → base + 运费,includes_shipping=false
    ///    - PRESERVE_STORED → 已折入过运费的旧值（|stored − base| ≥ ε）保留
    ///
    /// # 参数
    /// - base: 不含运费的基础剩余额
    /// - stored: 外部系统持久化的剩余额（可能已含运费）
    /// - resolution: 运费解析结果
    /// - policy: 价目变动口径
    pub fn remaining(
        base: f64,
        stored: Option<f64>,
        resolution: ShippingCostResolution,
        policy: StaleRemainingPolicy,
    ) -> BalanceView {
        let cost = resolution.amount();
        let shipping_pending = resolution.is_pending();

        if let Some(stored) = stored {
            // 规则 2: 防重复折算
            if ((stored - base) - cost).abs() < REMAINING_EPSILON {
                return BalanceView {
                    amount: stored,
                    includes_shipping: true,
                    shipping_pending,
                };
            }

            // 规则 3: 对不上时按策略
            if policy == StaleRemainingPolicy::PreserveStored
                && (stored - base).abs() >= REMAINING_EPSILON
            {
                return BalanceView {
                    amount: stored,
                    includes_shipping: true,
                    shipping_pending,
                };
            }
        }

        BalanceView {
            amount: base + cost,
            includes_shipping: false,
            shipping_pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================
    // 测试 1: 运费解析
    // ==========================================

    #[test]
    fn test_resolve_priced_route() {
        let res = BalanceCore::resolve_shipping_cost(Some("Andreani"), Some(150.0));
        assert_eq!(res, ShippingCostResolution::Priced(150.0));
        assert_eq!(res.amount(), 150.0);
        assert!(!res.is_pending());
    }

    #[test]
    fn test_resolve_missing_carrier() {
        let res = BalanceCore::resolve_shipping_cost(None, Some(150.0));
        assert!(res.is_pending());
        assert_eq!(res.amount(), 0.0);
    }

    #[test]
    fn test_resolve_fallback_carrier() {
        // 兜底承运商即使查表命中也按待定
        let res = BalanceCore::resolve_shipping_cost(Some("Otro"), Some(150.0));
        assert!(res.is_pending());
    }

    #[test]
    fn test_resolve_unknown_route_is_not_error() {
        let res = BalanceCore::resolve_shipping_cost(Some("Correo Argentino"), None);
        assert!(res.is_pending());
    }

    // ==========================================
    // 测试 2: 防重复折算
    // ==========================================

    #[test]
    fn test_first_computation_adds_shipping() {
        // 两条目: 1000-200 + 500-0 = 1300,运费 150
        let view = BalanceCore::remaining(
            1300.0,
            None,
            ShippingCostResolution::Priced(150.0),
            StaleRemainingPolicy::default(),
        );
        assert_eq!(view.amount, 1450.0);
        assert!(!view.includes_shipping);
        assert!(!view.shipping_pending);
    }

    #[test]
    fn test_second_computation_detects_folded_shipping() {
        // 1450 已持久化 → 不再加 150
        let view = BalanceCore::remaining(
            1300.0,
            Some(1450.0),
            ShippingCostResolution::Priced(150.0),
            StaleRemainingPolicy::default(),
        );
        assert_eq!(view.amount, 1450.0);
        assert!(view.includes_shipping);
    }

    #[test]
    fn test_remaining_is_idempotent() {
        let compute = || {
            BalanceCore::remaining(
                1300.0,
                Some(1450.0),
                ShippingCostResolution::Priced(150.0),
                StaleRemainingPolicy::default(),
            )
        };
        assert_eq!(compute(), compute());
    }

    #[test]
    fn test_epsilon_tolerance() {
        // 差 0.005 仍视为已折入
        let view = BalanceCore::remaining(
            1300.0,
            Some(1450.005),
            ShippingCostResolution::Priced(150.0),
            StaleRemainingPolicy::default(),
        );
        assert!(view.includes_shipping);
        assert_eq!(view.amount, 1450.005);
    }

    #[test]
    fn test_pending_shipping_keeps_base() {
        let view = BalanceCore::remaining(
            1300.0,
            None,
            ShippingCostResolution::Pending,
            StaleRemainingPolicy::default(),
        );
        assert_eq!(view.amount, 1300.0);
        assert!(view.shipping_pending);
    }

    // ==========================================
    // 测试 3: 价目变动口径
    // ==========================================

    #[test]
    fn test_recompute_on_mismatch_follows_current_price() {
        // 旧值按 120 折入,价目改为 150 → 默认口径重算
        let view = BalanceCore::remaining(
            1300.0,
            Some(1420.0),
            ShippingCostResolution::Priced(150.0),
            StaleRemainingPolicy::RecomputeOnMismatch,
        );
        assert_eq!(view.amount, 1450.0);
        assert!(!view.includes_shipping);
    }

    #[test]
    fn test_preserve_stored_keeps_historical_figure() {
        let view = BalanceCore::remaining(
            1300.0,
            Some(1420.0),
            ShippingCostResolution::Priced(150.0),
            StaleRemainingPolicy::PreserveStored,
        );
        assert_eq!(view.amount, 1420.0);
        assert!(view.includes_shipping);
    }

    #[test]
    fn test_preserve_stored_without_folded_shipping_recomputes() {
        // stored == base: 还没折入过运费,保留策略也照常加运费
        let view = BalanceCore::remaining(
            1300.0,
            Some(1300.0),
            ShippingCostResolution::Priced(150.0),
            StaleRemainingPolicy::PreserveStored,
        );
        assert_eq!(view.amount, 1450.0);
        assert!(!view.includes_shipping);
    }

    #[test]
    fn test_policy_db_round_trip() {
        for policy in [
            StaleRemainingPolicy::RecomputeOnMismatch,
            StaleRemainingPolicy::PreserveStored,
        ] {
            assert_eq!(StaleRemainingPolicy::from_db_str(policy.to_db_str()), policy);
        }
        // 未知值回落默认
        assert_eq!(
            StaleRemainingPolicy::from_db_str("???"),
            StaleRemainingPolicy::RecomputeOnMismatch
        );
    }
}
