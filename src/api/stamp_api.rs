// ==========================================
// 印章定制订单管理系统 - 条目 API
// ==========================================
// 职责: 条目创建/查询/自由字段编辑/状态流转应用
// 说明: 守卫引擎是事实源;本层负责取数、落库与缓存刷新
// 红线: 补丁集单事务落库,部分失败上浮为致命错误
// ==========================================

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::stamp::Stamp;
use crate::engine::aggregation::OrderAggregator;
use crate::engine::repositories::OrderRepositories;
use crate::engine::transition_core::{GuardViolation, TransitionCore, TransitionRequest};

// ==========================================
// TransitionReport - 流转应用结果
// ==========================================
/// 守卫拒绝不是错误: 调用方必须对两个分支分别处理
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionReport {
    /// 已应用（含扇出条数与决策原因）
    Applied {
        stamp: Stamp,
        fan_out: usize,
        reasons: Vec<String>,
    },
    /// 守卫拒绝,未产生任何写入
    Rejected {
        reason: String,
        violation: GuardViolation,
    },
}

// ==========================================
// StampFieldEdit - 自由字段编辑
// ==========================================
// 金额/备注/尺寸等不设守卫,None 表示不修改
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StampFieldEdit {
    pub stamp_type: Option<Option<String>>,
    pub width_cm: Option<Option<f64>>,
    pub height_cm: Option<Option<f64>>,
    pub value: Option<f64>,
    pub deposit: Option<f64>,
    pub base_file: Option<Option<String>>,
    pub vector_file: Option<Option<String>>,
    pub photo_file: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

// ==========================================
// StampApi - 条目 API
// ==========================================
pub struct StampApi {
    repos: OrderRepositories,
}

impl StampApi {
    /// 创建新的 StampApi 实例
    pub fn new(repos: OrderRepositories) -> Self {
        Self { repos }
    }

    // ==========================================
    // 状态流转
    // ==========================================

    /// 应用状态流转请求
    ///
    /// # 流程
    /// 1. 取目标条目与同单全部条目
    /// 2. 守卫引擎裁决
    /// 3. 接受 → 补丁集单事务落库,必要时刷新订单缓存
    /// 4. 拒绝 → 原样返回原因,零写入
    pub async fn apply_transition(
        &self,
        stamp_id: &str,
        request: TransitionRequest,
    ) -> ApiResult<TransitionReport> {
        if stamp_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("条目ID不能为空".to_string()));
        }

        let stamp = self
            .repos
            .stamp_repo
            .find_by_id(stamp_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Stamp(id={})不存在", stamp_id)))?;

        let siblings = self.repos.stamp_repo.find_by_order(&stamp.order_id)?;

        match TransitionCore::apply(&stamp, &siblings, request) {
            Err(violation) => {
                warn!(stamp_id, %violation, "状态流转被守卫拒绝");
                Ok(TransitionReport::Rejected {
                    reason: violation.to_string(),
                    violation,
                })
            }
            Ok(outcome) => {
                let fan_out = outcome.sibling_patches.len();
                self.repos.stamp_repo.apply_patch_set(
                    &outcome.stamp,
                    &outcome.sibling_patches,
                    outcome.order_shipping_state,
                )?;

                if outcome.order_cache_stale {
                    self.refresh_order_cache(&outcome.stamp.order_id).await?;
                }

                debug!(stamp_id, fan_out, "状态流转已应用");
                Ok(TransitionReport::Applied {
                    stamp: outcome.stamp,
                    fan_out,
                    reasons: outcome.reasons,
                })
            }
        }
    }

    // ==========================================
    // 条目 CRUD
    // ==========================================

    /// 在订单内创建条目（初始: 未开始/已收定金/未发货/非优先）
    pub async fn create_stamp(&self, order_id: &str) -> ApiResult<Stamp> {
        let order = self
            .repos
            .order_repo
            .find_by_id(order_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Order(id={})不存在", order_id)))?;

        let mut stamp = Stamp::new(order_id);
        // 新条目继承整单发货状态（冗余列保持同步）
        stamp.shipping_state = order.shipping_state;
        self.repos.stamp_repo.insert(&stamp)?;
        self.refresh_order_cache(order_id).await?;

        debug!(stamp_id = %stamp.stamp_id, order_id, "条目已创建");
        Ok(stamp)
    }

    /// 查询条目
    pub async fn get_stamp(&self, stamp_id: &str) -> ApiResult<Stamp> {
        self.repos
            .stamp_repo
            .find_by_id(stamp_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Stamp(id={})不存在", stamp_id)))
    }

    /// 自由字段编辑（金额/备注/尺寸等,无守卫）
    pub async fn edit_fields(&self, stamp_id: &str, edit: StampFieldEdit) -> ApiResult<Stamp> {
        let mut stamp = self
            .repos
            .stamp_repo
            .find_by_id(stamp_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Stamp(id={})不存在", stamp_id)))?;

        if let Some(v) = edit.stamp_type {
            stamp.stamp_type = v;
        }
        if let Some(v) = edit.width_cm {
            stamp.width_cm = v;
        }
        if let Some(v) = edit.height_cm {
            stamp.height_cm = v;
        }
        if let Some(v) = edit.value {
            if v < 0.0 {
                return Err(ApiError::InvalidInput("金额不能为负".to_string()));
            }
            stamp.value = v;
        }
        if let Some(v) = edit.deposit {
            if v < 0.0 {
                return Err(ApiError::InvalidInput("定金不能为负".to_string()));
            }
            stamp.deposit = v;
        }
        if let Some(v) = edit.base_file {
            stamp.base_file = v;
        }
        if let Some(v) = edit.vector_file {
            stamp.vector_file = v;
        }
        if let Some(v) = edit.photo_file {
            stamp.photo_file = v;
        }
        if let Some(v) = edit.notes {
            stamp.notes = v;
        }

        self.repos.stamp_repo.update(&stamp)?;
        // 金额类字段变动会使缓存合计失效,统一刷新
        self.refresh_order_cache(&stamp.order_id).await?;
        Ok(stamp)
    }

    /// 删除条目（不删除订单）
    pub async fn delete_stamp(&self, stamp_id: &str) -> ApiResult<()> {
        let stamp = self
            .repos
            .stamp_repo
            .find_by_id(stamp_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Stamp(id={})不存在", stamp_id)))?;

        self.repos.stamp_repo.delete(stamp_id)?;
        self.refresh_order_cache(&stamp.order_id).await?;
        Ok(())
    }

    // ==========================================
    // 缓存刷新
    // ==========================================

    /// 重算并写回订单缓存合计
    ///
    /// 说明: 合计是派生读模型;空单清零,不走聚合引擎
    async fn refresh_order_cache(&self, order_id: &str) -> ApiResult<()> {
        let order = self
            .repos
            .order_repo
            .find_by_id(order_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Order(id={})不存在", order_id)))?;

        let stamps = self.repos.stamp_repo.find_by_order(order_id)?;
        if stamps.is_empty() {
            self.repos
                .order_repo
                .refresh_totals(order_id, 0.0, 0.0, 0.0, None)?;
            return Ok(());
        }

        let summary = OrderAggregator::aggregate(&order, &stamps)?;
        self.repos.order_repo.refresh_totals(
            order_id,
            summary.total_value,
            summary.total_deposit,
            summary.total_remaining,
            summary.sale_summary,
        )?;
        Ok(())
    }
}
