// ==========================================
// 印章定制订单管理系统 - 运费价目仓储
// ==========================================
// 职责: shipping_rate 表读写,(承运商, 服务) → 金额
// 说明: 未命中不是错误,由结算引擎按待定处理
// ==========================================

use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ShippingRateRepository - 运费价目仓储
// ==========================================
pub struct ShippingRateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ShippingRateRepository {
    /// 创建新的 ShippingRateRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入/覆盖价目（upsert）
    pub fn upsert(&self, carrier: &str, service: &str, cost: f64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO shipping_rate (carrier, service, cost) VALUES (?1, ?2, ?3)",
            params![carrier, service, cost],
        )?;
        Ok(())
    }

    /// 查询运费
    ///
    /// # 返回
    /// - Ok(Some(f64)): 命中价目
    /// - Ok(None): 线路未定价（非错误）
    pub fn find_cost(
        &self,
        carrier: Option<&str>,
        service: Option<&str>,
    ) -> RepositoryResult<Option<f64>> {
        let (Some(carrier), Some(service)) = (carrier, service) else {
            return Ok(None);
        };

        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT cost FROM shipping_rate WHERE carrier = ?1 AND service = ?2",
            params![carrier, service],
            |row| row.get::<_, f64>(0),
        );

        match result {
            Ok(cost) => Ok(Some(cost)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
