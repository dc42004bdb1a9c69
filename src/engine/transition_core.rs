// ==========================================
// 印章定制订单管理系统 - 状态流转守卫核心
// ==========================================
// 职责: 校验并应用单条目状态变更,输出原子补丁集
// 红线: 无状态、无副作用、无 I/O;守卫拒绝必须带原因
// 红线: 兄弟条目补丁与主变更是一个逻辑写集,不可部分落库
// ==========================================

use crate::domain::stamp::Stamp;
use crate::domain::types::{
    AspireSubstate, FabricationState, ProductionState, SaleState, ShippingState,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==========================================
// TransitionRequest - 状态变更请求
// ==========================================
// 按字段建模;Aspire 与制作状态的耦合由 ProductionState 结构消化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransitionRequest {
    /// 显式制作状态变更（结构性清除 Aspire 子状态）
    Fabrication(FabricationState),
    /// 销售状态变更（守卫: 制作完成后才可收尾款）
    Sale(SaleState),
    /// 发货状态变更（守卫: 全单已转账;整单扇出）
    Shipping(ShippingState),
    /// 优先标志（正交,任意时刻可设）
    Priority(bool),
    /// Aspire 子状态（Some → 强制 SCHEDULED;None → 回退 NOT_STARTED）
    Aspire(Option<AspireSubstate>),
    /// 机器指派（自由文本,不得推断/覆盖 program）
    Machine(Option<String>),
    /// 程序名（仅显式编辑）
    Program(Option<String>),
}

// ==========================================
// SiblingPatch - 兄弟条目补丁
// ==========================================
// 目前唯一的扇出来源是发货状态同步
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingPatch {
    pub stamp_id: String,
    pub shipping_state: ShippingState,
}

// ==========================================
// TransitionOutcome - 接受结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionOutcome {
    /// 更新后的目标条目
    pub stamp: Stamp,
    /// 兄弟条目补丁（与主变更同事务落库）
    pub sibling_patches: Vec<SiblingPatch>,
    /// 整单发货状态需要同步到订单头时为 Some
    pub order_shipping_state: Option<ShippingState>,
    /// 订单缓存合计/销售摘要是否失效
    pub order_cache_stale: bool,
    /// 决策原因（可解释性）
    pub reasons: Vec<String>,
}

// ==========================================
// GuardViolation - 守卫拒绝
// ==========================================
// 可恢复: 对调用方是带原因的 no-op,绝不悄悄应用
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GuardViolation {
    #[error("销售状态被拒: 条目 {stamp_id} 制作状态为 {fabrication},须为 DONE")]
    SaleBeforeFabricationDone {
        stamp_id: String,
        fabrication: FabricationState,
    },

    #[error("发货状态被拒: 条目 {blocking_stamp_id} 销售状态为 {sale_state},全单须为 TRANSFERRED")]
    ShippingBeforeTransfer {
        stamp_id: String,
        blocking_stamp_id: String,
        sale_state: SaleState,
    },
}

// ==========================================
// TransitionCore - 纯函数守卫引擎
// ==========================================
pub struct TransitionCore;

impl TransitionCore {
    /// 应用状态变更请求
    ///
    /// # 参数
    /// - stamp: 目标条目
    /// - siblings: 同单全部条目（可含目标自身,按 stamp_id 区分）
    /// - request: 变更请求
    ///
    /// # 返回
    /// - Ok(TransitionOutcome): 接受,含原子补丁集
    /// - Err(GuardViolation): 守卫拒绝,输入保持原状
    pub fn apply(
        stamp: &Stamp,
        siblings: &[Stamp],
        request: TransitionRequest,
    ) -> Result<TransitionOutcome, GuardViolation> {
        match request {
            TransitionRequest::Fabrication(fab) => Self::apply_fabrication(stamp, fab),
            TransitionRequest::Sale(sale) => Self::apply_sale(stamp, sale),
            TransitionRequest::Shipping(shipping) => {
                Self::apply_shipping(stamp, siblings, shipping)
            }
            TransitionRequest::Priority(flag) => Self::apply_priority(stamp, flag),
            TransitionRequest::Aspire(substate) => Self::apply_aspire(stamp, substate),
            TransitionRequest::Machine(machine) => Self::apply_machine(stamp, machine),
            TransitionRequest::Program(program) => Self::apply_program(stamp, program),
        }
    }

    // ==========================================
    // 分字段规则
    // ==========================================

    /// 显式制作状态变更
    ///
    /// 规则: 任意制作状态间可切换;若此前有 Aspire 子状态,
    /// 同一赋值内结构性清除（不存在中间可观察状态）
    fn apply_fabrication(
        stamp: &Stamp,
        fab: FabricationState,
    ) -> Result<TransitionOutcome, GuardViolation> {
        let mut reasons = Vec::new();
        if let Some(sub) = stamp.aspire_substate() {
            reasons.push(format!("ASPIRE_CLEARED: {} (同补丁清除)", sub));
        }
        reasons.push(format!(
            "FABRICATION: {} -> {}",
            stamp.fabrication_state(),
            fab
        ));

        let mut updated = stamp.clone();
        updated.production = ProductionState::from_fabrication(fab);

        Ok(TransitionOutcome {
            stamp: updated,
            sibling_patches: Vec::new(),
            order_shipping_state: None,
            order_cache_stale: false,
            reasons,
        })
    }

    /// 销售状态变更
    ///
    /// 规则: 制作状态必须为 DONE（UI 置灰只是提示,引擎才是事实源）
    fn apply_sale(stamp: &Stamp, sale: SaleState) -> Result<TransitionOutcome, GuardViolation> {
        if stamp.fabrication_state() != FabricationState::Done {
            return Err(GuardViolation::SaleBeforeFabricationDone {
                stamp_id: stamp.stamp_id.clone(),
                fabrication: stamp.fabrication_state(),
            });
        }

        let mut updated = stamp.clone();
        updated.sale_state = sale;

        Ok(TransitionOutcome {
            stamp: updated,
            sibling_patches: Vec::new(),
            order_shipping_state: None,
            // 销售摘要缓存在订单头上
            order_cache_stale: true,
            reasons: vec![format!("SALE: {} -> {}", stamp.sale_state, sale)],
        })
    }

    /// 发货状态变更（整单语义）
    ///
    /// 规则:
    /// 1. 全单条目（含目标）销售状态均为 TRANSFERRED,否则整单拒绝
    /// 2. 接受时同一逻辑写集内扇出到每个兄弟条目
    fn apply_shipping(
        stamp: &Stamp,
        siblings: &[Stamp],
        shipping: ShippingState,
    ) -> Result<TransitionOutcome, GuardViolation> {
        // 规则 1: 目标自身
        if stamp.sale_state != SaleState::Transferred {
            return Err(GuardViolation::ShippingBeforeTransfer {
                stamp_id: stamp.stamp_id.clone(),
                blocking_stamp_id: stamp.stamp_id.clone(),
                sale_state: stamp.sale_state,
            });
        }

        // 规则 1: 兄弟条目逐一校验
        for sibling in siblings {
            if sibling.stamp_id == stamp.stamp_id {
                continue;
            }
            if sibling.sale_state != SaleState::Transferred {
                return Err(GuardViolation::ShippingBeforeTransfer {
                    stamp_id: stamp.stamp_id.clone(),
                    blocking_stamp_id: sibling.stamp_id.clone(),
                    sale_state: sibling.sale_state,
                });
            }
        }

        // 规则 2: 扇出补丁
        let sibling_patches: Vec<SiblingPatch> = siblings
            .iter()
            .filter(|s| s.stamp_id != stamp.stamp_id)
            .map(|s| SiblingPatch {
                stamp_id: s.stamp_id.clone(),
                shipping_state: shipping,
            })
            .collect();

        let mut updated = stamp.clone();
        updated.shipping_state = shipping;

        Ok(TransitionOutcome {
            stamp: updated,
            reasons: vec![format!(
                "SHIPPING: {} -> {} (整单 {} 条)",
                stamp.shipping_state,
                shipping,
                sibling_patches.len() + 1
            )],
            sibling_patches,
            order_shipping_state: Some(shipping),
            order_cache_stale: false,
        })
    }

    /// 优先标志（正交）
    ///
    /// 规则: 任意时刻可设,绝不改动任何生命周期状态
    fn apply_priority(stamp: &Stamp, flag: bool) -> Result<TransitionOutcome, GuardViolation> {
        let mut updated = stamp.clone();
        updated.is_priority = flag;

        Ok(TransitionOutcome {
            stamp: updated,
            sibling_patches: Vec::new(),
            order_shipping_state: None,
            order_cache_stale: false,
            reasons: vec![format!("PRIORITY: {} -> {}", stamp.is_priority, flag)],
        })
    }

    /// Aspire 子状态变更
    ///
    /// 规则:
    /// - Some(sub): 生产状态强制为 SCHEDULED(sub),与先前值无关
    /// - None: 无显式制作状态伴随时,回退 NOT_STARTED
    fn apply_aspire(
        stamp: &Stamp,
        substate: Option<AspireSubstate>,
    ) -> Result<TransitionOutcome, GuardViolation> {
        let (production, reason) = match substate {
            Some(sub) => (
                ProductionState::Scheduled(Some(sub)),
                format!("ASPIRE_SET: {} => SCHEDULED", sub),
            ),
            None => (
                ProductionState::NotStarted,
                "ASPIRE_CLEARED: => NOT_STARTED".to_string(),
            ),
        };

        let mut updated = stamp.clone();
        updated.production = production;

        Ok(TransitionOutcome {
            stamp: updated,
            sibling_patches: Vec::new(),
            order_shipping_state: None,
            order_cache_stale: false,
            reasons: vec![reason],
        })
    }

    /// 机器指派
    ///
    /// 规则: 自由文本;program 字段不受任何隐式推断影响
    fn apply_machine(
        stamp: &Stamp,
        machine: Option<String>,
    ) -> Result<TransitionOutcome, GuardViolation> {
        let mut updated = stamp.clone();
        updated.machine = machine;

        Ok(TransitionOutcome {
            reasons: vec![format!(
                "MACHINE: {:?} -> {:?}",
                stamp.machine, updated.machine
            )],
            stamp: updated,
            sibling_patches: Vec::new(),
            order_shipping_state: None,
            order_cache_stale: false,
        })
    }

    /// 程序名编辑
    fn apply_program(
        stamp: &Stamp,
        program: Option<String>,
    ) -> Result<TransitionOutcome, GuardViolation> {
        let mut updated = stamp.clone();
        updated.program = program;

        Ok(TransitionOutcome {
            reasons: vec![format!(
                "PROGRAM: {:?} -> {:?}",
                stamp.program, updated.program
            )],
            stamp: updated,
            sibling_patches: Vec::new(),
            order_shipping_state: None,
            order_cache_stale: false,
        })
    }
}
