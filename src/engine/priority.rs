// ==========================================
// 印章定制订单管理系统 - 生产队列排序引擎
// ==========================================
// 职责: 制作状态与 Aspire 子状态并入同一键空间,
//       生成多级比较器,为生产队列定序
// 输入: 条目列表 + 键序配置 + 次级判据
// 输出: 排序后的条目列表（稳定排序）
// 红线: 纯函数、确定性;每次视图刷新重算,不跨数据变更缓存
// ==========================================

use crate::domain::stamp::Stamp;
use crate::domain::types::{
    AspireSubstate, FabricationState, SaleState, ShippingState,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

// ==========================================
// RankKey - 归一排序键
// ==========================================
// 条目有 Aspire 子状态时取子状态键,否则取制作状态键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RankKey {
    Fabrication(FabricationState),
    Aspire(AspireSubstate),
}

impl RankKey {
    /// 条目的归一排序键
    pub fn of(stamp: &Stamp) -> RankKey {
        match stamp.aspire_substate() {
            Some(sub) => RankKey::Aspire(sub),
            None => RankKey::Fabrication(stamp.fabrication_state()),
        }
    }

    /// 默认键序:
    /// 未开始 < Aspire 子轨(按工序) < 制作中 < 重做 < 修整 < 待验证
    /// < 完成 < 无 Aspire 的已排产
    pub fn default_order() -> Vec<RankKey> {
        vec![
            RankKey::Fabrication(FabricationState::NotStarted),
            RankKey::Aspire(AspireSubstate::ToNest),
            RankKey::Aspire(AspireSubstate::Nested),
            RankKey::Aspire(AspireSubstate::OnMachine),
            RankKey::Fabrication(FabricationState::InProgress),
            RankKey::Fabrication(FabricationState::Redo),
            RankKey::Fabrication(FabricationState::Retouch),
            RankKey::Fabrication(FabricationState::Verify),
            RankKey::Fabrication(FabricationState::Done),
            RankKey::Fabrication(FabricationState::Scheduled),
        ]
    }

    /// 从配置存储值解析（两套词汇不重叠,先试 Aspire）
    pub fn from_db_str(s: &str) -> Option<Self> {
        if let Some(sub) = AspireSubstate::from_db_str(s) {
            return Some(RankKey::Aspire(sub));
        }
        FabricationState::from_db_str(s).map(RankKey::Fabrication)
    }

    /// 转换为配置存储值
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RankKey::Fabrication(fab) => fab.to_db_str(),
            RankKey::Aspire(sub) => sub.to_db_str(),
        }
    }
}

// ==========================================
// SortCriterion - 次级判据
// ==========================================

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// 判据字段
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "target", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortKey {
    CreatedAt,                      // 创建顺序
    StampType,                      // 印章类型（文本）
    Machine,                        // 机器指派（文本）
    Program,                        // 程序名（文本）
    Notes,                          // 备注（文本）
    Area,                           // 面积 = 宽 × 高
    SaleStateIs(SaleState),         // 销售状态等值（命中在前）
    ShippingStateIs(ShippingState), // 发货状态等值（命中在前）
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SortCriterion {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortCriterion {
    pub fn asc(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Descending,
        }
    }
}

// ==========================================
// QueueComparator - 队列比较器
// ==========================================
// 主键: 键序配置中的下标(未列出 → 无穷大,排最后)
// 次键: 判据列表依次比较,首个非相等者胜出
pub struct QueueComparator {
    rank_index: HashMap<RankKey, usize>,
    criteria: Vec<SortCriterion>,
}

impl QueueComparator {
    /// 构造比较器
    ///
    /// # 参数
    /// - priority_order: 键序配置（下标即优先级）
    /// - criteria: 次级判据（按声明顺序生效）
    pub fn new(priority_order: &[RankKey], criteria: Vec<SortCriterion>) -> Self {
        let rank_index = priority_order
            .iter()
            .enumerate()
            .map(|(idx, key)| (*key, idx))
            .collect();

        Self {
            rank_index,
            criteria,
        }
    }

    /// 条目的键序下标（未列出 → usize::MAX）
    pub fn rank_of(&self, stamp: &Stamp) -> usize {
        self.rank_index
            .get(&RankKey::of(stamp))
            .copied()
            .unwrap_or(usize::MAX)
    }

    /// 订单级键序下标: 取最紧迫条目（状态混合的订单按此定序）
    pub fn order_rank(&self, stamps: &[Stamp]) -> usize {
        stamps
            .iter()
            .map(|s| self.rank_of(s))
            .min()
            .unwrap_or(usize::MAX)
    }

    /// 比较两个条目
    ///
    /// # 返回
    /// Ordering::Less 表示 a 应排在 b 之前
    pub fn compare(&self, a: &Stamp, b: &Stamp) -> Ordering {
        // 1. 键序下标
        match self.rank_of(a).cmp(&self.rank_of(b)) {
            Ordering::Equal => {}
            other => return other,
        }

        // 2. 次级判据依次比较
        for criterion in &self.criteria {
            let ord = Self::compare_by(criterion.key, a, b);
            let ord = match criterion.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }

        // 3. 全部相等: 交给稳定排序保持原序
        Ordering::Equal
    }

    /// 排序条目列表（稳定）
    pub fn sort(&self, mut stamps: Vec<Stamp>) -> Vec<Stamp> {
        stamps.sort_by(|a, b| self.compare(a, b));
        stamps
    }

    /// 按机器分组排序
    ///
    /// # 返回
    /// HashMap<机器, 排序后的条目列表>（未指派归入 "UNASSIGNED"）
    pub fn sort_by_machine(&self, stamps: Vec<Stamp>) -> HashMap<String, Vec<Stamp>> {
        let mut grouped: HashMap<String, Vec<Stamp>> = HashMap::new();

        for stamp in stamps {
            let machine = stamp
                .machine
                .clone()
                .unwrap_or_else(|| "UNASSIGNED".to_string());
            grouped.entry(machine).or_insert_with(Vec::new).push(stamp);
        }

        for stamps in grouped.values_mut() {
            stamps.sort_by(|a, b| self.compare(a, b));
        }

        grouped
    }

    // ==========================================
    // 判据比较（升序口径,方向在外层取反）
    // ==========================================

    fn compare_by(key: SortKey, a: &Stamp, b: &Stamp) -> Ordering {
        match key {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::StampType => Self::compare_text(&a.stamp_type, &b.stamp_type),
            SortKey::Machine => Self::compare_text(&a.machine, &b.machine),
            SortKey::Program => Self::compare_text(&a.program, &b.program),
            SortKey::Notes => Self::compare_text(&a.notes, &b.notes),
            SortKey::Area => Self::compare_area(a.area_cm2(), b.area_cm2()),
            SortKey::SaleStateIs(target) => {
                // 命中在前: true < false 的语义,用反向布尔比较
                let a_hit = a.sale_state == target;
                let b_hit = b.sale_state == target;
                b_hit.cmp(&a_hit)
            }
            SortKey::ShippingStateIs(target) => {
                let a_hit = a.shipping_state == target;
                let b_hit = b.shipping_state == target;
                b_hit.cmp(&a_hit)
            }
        }
    }

    /// 文本比较（缺失排最后）
    fn compare_text(a: &Option<String>, b: &Option<String>) -> Ordering {
        match (a, b) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// 面积比较（缺失尺寸排最后）
    fn compare_area(a: Option<f64>, b: Option<f64>) -> Ordering {
        match (a, b) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ProductionState;
    use chrono::{Duration, Utc};

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn stamp_with(id_hint: &str, production: ProductionState) -> Stamp {
        let mut stamp = Stamp::new("O001");
        stamp.stamp_id = id_hint.to_string();
        stamp.production = production;
        stamp
    }

    fn comparator(criteria: Vec<SortCriterion>) -> QueueComparator {
        QueueComparator::new(&RankKey::default_order(), criteria)
    }

    // ==========================================
    // 场景 1: 键序主导
    // ==========================================

    #[test]
    fn test_scenario_01_rank_key_order() {
        let cmp = comparator(vec![]);

        let a = stamp_with("A", ProductionState::Done);
        let b = stamp_with("B", ProductionState::NotStarted);
        let c = stamp_with("C", ProductionState::Scheduled(Some(AspireSubstate::ToNest)));
        let d = stamp_with("D", ProductionState::InProgress);

        let sorted = cmp.sort(vec![a, b, c, d]);

        assert_eq!(sorted[0].stamp_id, "B"); // NOT_STARTED
        assert_eq!(sorted[1].stamp_id, "C"); // Aspire: TO_NEST
        assert_eq!(sorted[2].stamp_id, "D"); // IN_PROGRESS
        assert_eq!(sorted[3].stamp_id, "A"); // DONE
    }

    #[test]
    fn test_scenario_02_aspire_key_overrides_fabrication() {
        let cmp = comparator(vec![]);

        // 同为 SCHEDULED,带子状态的按子状态键,不带的按制作状态键
        let with_sub = stamp_with("A", ProductionState::Scheduled(Some(AspireSubstate::OnMachine)));
        let without_sub = stamp_with("B", ProductionState::Scheduled(None));

        assert!(cmp.rank_of(&with_sub) < cmp.rank_of(&without_sub));
    }

    #[test]
    fn test_scenario_03_unlisted_key_ranks_last() {
        // 键序配置只列出两个键
        let order = vec![
            RankKey::Fabrication(FabricationState::NotStarted),
            RankKey::Fabrication(FabricationState::InProgress),
        ];
        let cmp = QueueComparator::new(&order, vec![]);

        let listed = stamp_with("A", ProductionState::InProgress);
        let unlisted = stamp_with("B", ProductionState::Done);

        assert_eq!(cmp.rank_of(&unlisted), usize::MAX);
        assert_eq!(cmp.compare(&listed, &unlisted), Ordering::Less);
    }

    // ==========================================
    // 场景 2: 次级判据
    // ==========================================

    #[test]
    fn test_scenario_04_created_at_tiebreak() {
        let cmp = comparator(vec![SortCriterion::asc(SortKey::CreatedAt)]);

        let mut earlier = stamp_with("A", ProductionState::NotStarted);
        earlier.created_at = Utc::now() - Duration::days(2);
        let later = stamp_with("B", ProductionState::NotStarted);

        assert_eq!(cmp.compare(&earlier, &later), Ordering::Less);
        assert_eq!(cmp.compare(&later, &earlier), Ordering::Greater);
    }

    #[test]
    fn test_scenario_05_area_descending() {
        let cmp = comparator(vec![SortCriterion::desc(SortKey::Area)]);

        let mut big = stamp_with("A", ProductionState::NotStarted);
        big.width_cm = Some(10.0);
        big.height_cm = Some(5.0);
        let mut small = stamp_with("B", ProductionState::NotStarted);
        small.width_cm = Some(2.0);
        small.height_cm = Some(2.0);

        assert_eq!(cmp.compare(&big, &small), Ordering::Less); // 大面积在前
    }

    #[test]
    fn test_scenario_06_missing_area_ranks_last_ascending() {
        let cmp = comparator(vec![SortCriterion::asc(SortKey::Area)]);

        let mut sized = stamp_with("A", ProductionState::NotStarted);
        sized.width_cm = Some(4.0);
        sized.height_cm = Some(4.0);
        let missing = stamp_with("B", ProductionState::NotStarted);

        assert_eq!(cmp.compare(&sized, &missing), Ordering::Less);
    }

    #[test]
    fn test_scenario_07_state_equality_criterion() {
        let cmp = comparator(vec![SortCriterion::asc(SortKey::SaleStateIs(
            SaleState::Debtor,
        ))]);

        let mut debtor = stamp_with("A", ProductionState::NotStarted);
        debtor.sale_state = SaleState::Debtor;
        let deposited = stamp_with("B", ProductionState::NotStarted);

        // 命中判据者在前
        assert_eq!(cmp.compare(&debtor, &deposited), Ordering::Less);
    }

    #[test]
    fn test_scenario_08_criteria_fall_through() {
        // 第一判据相等时落入第二判据
        let cmp = comparator(vec![
            SortCriterion::asc(SortKey::StampType),
            SortCriterion::desc(SortKey::Area),
        ]);

        let mut a = stamp_with("A", ProductionState::NotStarted);
        a.stamp_type = Some("Madera".to_string());
        a.width_cm = Some(3.0);
        a.height_cm = Some(3.0);

        let mut b = stamp_with("B", ProductionState::NotStarted);
        b.stamp_type = Some("Madera".to_string());
        b.width_cm = Some(6.0);
        b.height_cm = Some(6.0);

        assert_eq!(cmp.compare(&b, &a), Ordering::Less); // 面积降序胜出
    }

    // ==========================================
    // 场景 3: 严格弱序
    // ==========================================

    #[test]
    fn test_scenario_09_reflexive_equal() {
        let cmp = comparator(vec![
            SortCriterion::asc(SortKey::CreatedAt),
            SortCriterion::desc(SortKey::Area),
        ]);
        let a = stamp_with("A", ProductionState::Verify);
        assert_eq!(cmp.compare(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_scenario_10_transitive() {
        let cmp = comparator(vec![SortCriterion::asc(SortKey::CreatedAt)]);

        let mut a = stamp_with("A", ProductionState::NotStarted);
        a.created_at = Utc::now() - Duration::days(3);
        let mut b = stamp_with("B", ProductionState::InProgress);
        b.created_at = Utc::now() - Duration::days(2);
        let c = stamp_with("C", ProductionState::Done);

        assert_eq!(cmp.compare(&a, &b), Ordering::Less);
        assert_eq!(cmp.compare(&b, &c), Ordering::Less);
        assert_eq!(cmp.compare(&a, &c), Ordering::Less);
    }

    #[test]
    fn test_scenario_11_total_tie_keeps_input_order() {
        let cmp = comparator(vec![]);

        let a = stamp_with("A", ProductionState::Redo);
        let b = stamp_with("B", ProductionState::Redo);
        let c = stamp_with("C", ProductionState::Redo);

        let sorted = cmp.sort(vec![a, b, c]);
        assert_eq!(sorted[0].stamp_id, "A");
        assert_eq!(sorted[1].stamp_id, "B");
        assert_eq!(sorted[2].stamp_id, "C");
    }

    // ==========================================
    // 场景 4: 分组与订单级键
    // ==========================================

    #[test]
    fn test_scenario_12_sort_by_machine() {
        let cmp = comparator(vec![]);

        let mut a = stamp_with("A", ProductionState::Done);
        a.machine = Some("CNC-1".to_string());
        let mut b = stamp_with("B", ProductionState::NotStarted);
        b.machine = Some("CNC-1".to_string());
        let mut c = stamp_with("C", ProductionState::InProgress);
        c.machine = Some("Laser".to_string());
        let d = stamp_with("D", ProductionState::NotStarted); // 未指派

        let grouped = cmp.sort_by_machine(vec![a, b, c, d]);

        assert_eq!(grouped.len(), 3);
        let cnc = &grouped["CNC-1"];
        assert_eq!(cnc[0].stamp_id, "B"); // NOT_STARTED 在前
        assert_eq!(cnc[1].stamp_id, "A");
        assert_eq!(grouped["Laser"].len(), 1);
        assert_eq!(grouped["UNASSIGNED"][0].stamp_id, "D");
    }

    #[test]
    fn test_scenario_13_order_rank_uses_most_urgent_item() {
        let cmp = comparator(vec![]);

        // 混合订单: 一条 DONE 一条 NOT_STARTED → 按 NOT_STARTED 定序
        let done = stamp_with("A", ProductionState::Done);
        let pending = stamp_with("B", ProductionState::NotStarted);
        let mixed = vec![done.clone(), pending.clone()];

        let uniform_done = vec![done];
        assert!(cmp.order_rank(&mixed) < cmp.order_rank(&uniform_done));
    }

    #[test]
    fn test_scenario_14_rank_key_db_round_trip() {
        for key in RankKey::default_order() {
            assert_eq!(RankKey::from_db_str(key.to_db_str()), Some(key));
        }
        assert_eq!(RankKey::from_db_str("???"), None);
    }
}
