// ==========================================
// 印章定制订单管理系统 - 生产队列 API
// ==========================================
// 职责: 生产队列视图（整队/按机器分组）
// 说明: 每次调用重建比较器并重排,不跨数据变更缓存
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::EngineConfigReader;
use crate::domain::stamp::Stamp;
use crate::engine::priority::{QueueComparator, SortCriterion};
use crate::engine::repositories::OrderRepositories;

// ==========================================
// QueueApi - 生产队列 API
// ==========================================
pub struct QueueApi {
    repos: OrderRepositories,
    config: Arc<dyn EngineConfigReader>,
}

impl QueueApi {
    /// 创建新的 QueueApi 实例
    pub fn new(repos: OrderRepositories, config: Arc<dyn EngineConfigReader>) -> Self {
        Self { repos, config }
    }

    /// 构建比较器（键序与默认判据来自配置）
    async fn comparator(
        &self,
        criteria: Option<Vec<SortCriterion>>,
    ) -> ApiResult<QueueComparator> {
        let priority_order = self
            .config
            .get_priority_order()
            .await
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        let criteria = match criteria {
            Some(c) => c,
            None => self
                .config
                .get_default_criteria()
                .await
                .map_err(|e| ApiError::InternalError(e.to_string()))?,
        };

        Ok(QueueComparator::new(&priority_order, criteria))
    }

    /// 生产队列（全部条目,按键序 + 判据定序）
    ///
    /// # 参数
    /// - criteria: 次级判据;None 时使用配置默认值
    pub async fn production_queue(
        &self,
        criteria: Option<Vec<SortCriterion>>,
    ) -> ApiResult<Vec<Stamp>> {
        let comparator = self.comparator(criteria).await?;
        let stamps = self.repos.stamp_repo.list_all()?;
        Ok(comparator.sort(stamps))
    }

    /// 按机器分组的生产队列
    pub async fn queue_by_machine(
        &self,
        criteria: Option<Vec<SortCriterion>>,
    ) -> ApiResult<HashMap<String, Vec<Stamp>>> {
        let comparator = self.comparator(criteria).await?;
        let stamps = self.repos.stamp_repo.list_all()?;
        Ok(comparator.sort_by_machine(stamps))
    }
}
