// ==========================================
// 印章定制订单管理系统 - 状态类型定义
// ==========================================
// 职责: 定义制作/销售/发货生命周期与 Aspire 排产子状态
// 红线: 优先标志独立存储,不得编码进制作状态枚举
// 存储同义词: 托管数据库沿用历史西语词汇,仅在存储边界转换
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 制作状态 (Fabrication State)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与内部 JSON 一致)
// 数据库同义词: from_db_str / to_db_str
// 注意: 历史值 "Prioridad" 不属于引擎词汇表,由存储边界翻译
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FabricationState {
    NotStarted, // 未开始 ("Sin Hacer")
    InProgress, // 制作中 ("Haciendo")
    Redo,       // 重做 ("Rehacer")
    Retouch,    // 修整 ("Retocar")
    Verify,     // 待验证 ("Verificar")
    Done,       // 完成 ("Hecho")
    Scheduled,  // 已排产 ("Programado")
}

impl fmt::Display for FabricationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FabricationState::NotStarted => write!(f, "NOT_STARTED"),
            FabricationState::InProgress => write!(f, "IN_PROGRESS"),
            FabricationState::Redo => write!(f, "REDO"),
            FabricationState::Retouch => write!(f, "RETOUCH"),
            FabricationState::Verify => write!(f, "VERIFY"),
            FabricationState::Done => write!(f, "DONE"),
            FabricationState::Scheduled => write!(f, "SCHEDULED"),
        }
    }
}

impl FabricationState {
    /// 从数据库存储值解析（历史西语词汇）
    ///
    /// # 返回
    /// - Some(Self): 合法存储值
    /// - None: 未知值（含历史 "Prioridad",由边界单独处理）
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "Sin Hacer" => Some(FabricationState::NotStarted),
            "Haciendo" => Some(FabricationState::InProgress),
            "Rehacer" => Some(FabricationState::Redo),
            "Retocar" => Some(FabricationState::Retouch),
            "Verificar" => Some(FabricationState::Verify),
            "Hecho" => Some(FabricationState::Done),
            "Programado" => Some(FabricationState::Scheduled),
            _ => None,
        }
    }

    /// 转换为数据库存储值
    pub fn to_db_str(&self) -> &'static str {
        match self {
            FabricationState::NotStarted => "Sin Hacer",
            FabricationState::InProgress => "Haciendo",
            FabricationState::Redo => "Rehacer",
            FabricationState::Retouch => "Retocar",
            FabricationState::Verify => "Verificar",
            FabricationState::Done => "Hecho",
            FabricationState::Scheduled => "Programado",
        }
    }
}

// ==========================================
// 销售状态 (Sale State)
// ==========================================
// 收款生命周期: 已收定金 → 照片已发 → 已转账 → 欠款
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleState {
    Deposited,   // 已收定金 ("Señado")
    PhotoSent,   // 成品照片已发 ("Foto Enviada")
    Transferred, // 已转账 ("Transferido")
    Debtor,      // 欠款 ("Debe")
}

impl fmt::Display for SaleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleState::Deposited => write!(f, "DEPOSITED"),
            SaleState::PhotoSent => write!(f, "PHOTO_SENT"),
            SaleState::Transferred => write!(f, "TRANSFERRED"),
            SaleState::Debtor => write!(f, "DEBTOR"),
        }
    }
}

impl SaleState {
    /// 从数据库存储值解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "Señado" => Some(SaleState::Deposited),
            "Foto Enviada" => Some(SaleState::PhotoSent),
            "Transferido" => Some(SaleState::Transferred),
            "Debe" => Some(SaleState::Debtor),
            _ => None,
        }
    }

    /// 转换为数据库存储值
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SaleState::Deposited => "Señado",
            SaleState::PhotoSent => "Foto Enviada",
            SaleState::Transferred => "Transferido",
            SaleState::Debtor => "Debe",
        }
    }
}

// ==========================================
// 发货状态 (Shipping State)
// ==========================================
// 红线: 逻辑上整单一个值,物理上按条目冗余存储,写入时全单同步
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingState {
    NoShipment, // 未发货 ("Sin Envío")
    ToDispatch, // 待寄出 ("Para Despachar")
    Dispatched, // 已寄出 ("Despachado")
    Delivered,  // 已送达 ("Entregado")
}

impl fmt::Display for ShippingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShippingState::NoShipment => write!(f, "NO_SHIPMENT"),
            ShippingState::ToDispatch => write!(f, "TO_DISPATCH"),
            ShippingState::Dispatched => write!(f, "DISPATCHED"),
            ShippingState::Delivered => write!(f, "DELIVERED"),
        }
    }
}

impl ShippingState {
    /// 从数据库存储值解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "Sin Envío" => Some(ShippingState::NoShipment),
            "Para Despachar" => Some(ShippingState::ToDispatch),
            "Despachado" => Some(ShippingState::Dispatched),
            "Entregado" => Some(ShippingState::Delivered),
            _ => None,
        }
    }

    /// 转换为数据库存储值
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ShippingState::NoShipment => "Sin Envío",
            ShippingState::ToDispatch => "Para Despachar",
            ShippingState::Dispatched => "Despachado",
            ShippingState::Delivered => "Entregado",
        }
    }
}

// ==========================================
// Aspire 排产子状态 (Aspire Substate)
// ==========================================
// 设置任一子状态 → 制作状态强制为 SCHEDULED
// 清除子状态(无显式制作状态变更) → 制作状态回退 NOT_STARTED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AspireSubstate {
    ToNest,    // 待排版 ("Para Aspire")
    Nested,    // 排版完成 ("Aspire Hecho")
    OnMachine, // 上机加工 ("En Máquina")
}

impl fmt::Display for AspireSubstate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AspireSubstate::ToNest => write!(f, "TO_NEST"),
            AspireSubstate::Nested => write!(f, "NESTED"),
            AspireSubstate::OnMachine => write!(f, "ON_MACHINE"),
        }
    }
}

impl AspireSubstate {
    /// 从数据库存储值解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "Para Aspire" => Some(AspireSubstate::ToNest),
            "Aspire Hecho" => Some(AspireSubstate::Nested),
            "En Máquina" => Some(AspireSubstate::OnMachine),
            _ => None,
        }
    }

    /// 转换为数据库存储值
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AspireSubstate::ToNest => "Para Aspire",
            AspireSubstate::Nested => "Aspire Hecho",
            AspireSubstate::OnMachine => "En Máquina",
        }
    }
}

// ==========================================
// 生产状态 (Production State)
// ==========================================
// 制作状态与 Aspire 子状态的合并变体:
// "Aspire 隐含 SCHEDULED" 与 "清除 Aspire 回退 NOT_STARTED"
// 由结构保证(单字段赋值),两列不可能观察到不一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "aspire", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductionState {
    NotStarted,
    InProgress,
    Redo,
    Retouch,
    Verify,
    Done,
    Scheduled(Option<AspireSubstate>),
}

impl ProductionState {
    /// 制作状态投影（存储列 1）
    pub fn fabrication(&self) -> FabricationState {
        match self {
            ProductionState::NotStarted => FabricationState::NotStarted,
            ProductionState::InProgress => FabricationState::InProgress,
            ProductionState::Redo => FabricationState::Redo,
            ProductionState::Retouch => FabricationState::Retouch,
            ProductionState::Verify => FabricationState::Verify,
            ProductionState::Done => FabricationState::Done,
            ProductionState::Scheduled(_) => FabricationState::Scheduled,
        }
    }

    /// Aspire 子状态投影（存储列 2）
    pub fn aspire(&self) -> Option<AspireSubstate> {
        match self {
            ProductionState::Scheduled(sub) => *sub,
            _ => None,
        }
    }

    /// 由显式制作状态构造（Aspire 子状态结构性清除）
    ///
    /// FabricationState::Scheduled → Scheduled(None)（无 Aspire 的已排产）
    pub fn from_fabrication(fab: FabricationState) -> Self {
        match fab {
            FabricationState::NotStarted => ProductionState::NotStarted,
            FabricationState::InProgress => ProductionState::InProgress,
            FabricationState::Redo => ProductionState::Redo,
            FabricationState::Retouch => ProductionState::Retouch,
            FabricationState::Verify => ProductionState::Verify,
            FabricationState::Done => ProductionState::Done,
            FabricationState::Scheduled => ProductionState::Scheduled(None),
        }
    }

    /// 由两个存储列融合（读边界）
    ///
    /// 子状态非空时以子状态为准（制作状态列即使不一致也被归一为 SCHEDULED）
    pub fn from_parts(fab: FabricationState, aspire: Option<AspireSubstate>) -> Self {
        match aspire {
            Some(sub) => ProductionState::Scheduled(Some(sub)),
            None => ProductionState::from_fabrication(fab),
        }
    }
}

impl fmt::Display for ProductionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.aspire() {
            Some(sub) => write!(f, "{}({})", self.fabrication(), sub),
            None => write!(f, "{}", self.fabrication()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fabrication_db_round_trip() {
        for state in [
            FabricationState::NotStarted,
            FabricationState::InProgress,
            FabricationState::Redo,
            FabricationState::Retouch,
            FabricationState::Verify,
            FabricationState::Done,
            FabricationState::Scheduled,
        ] {
            assert_eq!(FabricationState::from_db_str(state.to_db_str()), Some(state));
        }
    }

    #[test]
    fn test_legacy_priority_value_not_in_vocabulary() {
        // 历史 "Prioridad" 由存储边界翻译,引擎词汇表不认识它
        assert_eq!(FabricationState::from_db_str("Prioridad"), None);
    }

    #[test]
    fn test_production_state_projections() {
        let state = ProductionState::Scheduled(Some(AspireSubstate::ToNest));
        assert_eq!(state.fabrication(), FabricationState::Scheduled);
        assert_eq!(state.aspire(), Some(AspireSubstate::ToNest));

        let state = ProductionState::Verify;
        assert_eq!(state.fabrication(), FabricationState::Verify);
        assert_eq!(state.aspire(), None);
    }

    #[test]
    fn test_from_parts_aspire_wins() {
        // 存储列不一致时,子状态非空 → 归一为 SCHEDULED
        let state = ProductionState::from_parts(
            FabricationState::InProgress,
            Some(AspireSubstate::Nested),
        );
        assert_eq!(state, ProductionState::Scheduled(Some(AspireSubstate::Nested)));
    }

    #[test]
    fn test_from_fabrication_scheduled_without_aspire() {
        let state = ProductionState::from_fabrication(FabricationState::Scheduled);
        assert_eq!(state, ProductionState::Scheduled(None));
        assert_eq!(state.aspire(), None);
    }
}
