// ==========================================
// 印章定制订单管理系统 - 引擎配置读取 Trait
// ==========================================
// 职责: 定义规则引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::engine::balance::StaleRemainingPolicy;
use crate::engine::priority::{RankKey, SortCriterion};
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// EngineConfigReader Trait
// ==========================================
// 用途: 规则引擎所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait EngineConfigReader: Send + Sync {
    // ===== 队列排序配置 =====

    /// 获取队列键序
    ///
    /// # 返回
    /// - Vec<RankKey>: 键序配置（下标即优先级）
    ///
    /// # 默认值
    /// - RankKey::default_order()
    async fn get_priority_order(&self) -> Result<Vec<RankKey>, Box<dyn Error>>;

    /// 获取默认次级判据
    ///
    /// # 返回
    /// - Vec<SortCriterion>: 判据列表（按声明顺序生效）
    ///
    /// # 默认值
    /// - [CreatedAt 升序]
    async fn get_default_criteria(&self) -> Result<Vec<SortCriterion>, Box<dyn Error>>;

    // ===== 结算配置 =====

    /// 获取运费价目变动口径
    ///
    /// # 返回
    /// - StaleRemainingPolicy
    ///
    /// # 默认值
    /// - RECOMPUTE_ON_MISMATCH
    async fn get_stale_remaining_policy(
        &self,
    ) -> Result<StaleRemainingPolicy, Box<dyn Error>>;
}
