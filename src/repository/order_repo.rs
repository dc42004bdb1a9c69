// ==========================================
// 印章定制订单管理系统 - 订单仓储
// ==========================================
// 职责: customer_order 表 CRUD + 缓存合计刷新
// 红线: Repository 不含聚合逻辑;合计由聚合引擎算好后写入
// 级联: 删除订单删除其全部条目(外键 ON DELETE CASCADE)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::order::Order;
use crate::domain::types::{SaleState, ShippingState};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const ORDER_COLUMNS: &str = "order_id, customer_id, carrier, service, origin, \
     shipping_state, total_value, total_deposit, total_remaining, sale_summary, \
     deadline, tasks_json, created_at, updated_at";

// ==========================================
// OrderRepository - 订单仓储
// ==========================================
pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
    /// 创建新的 OrderRepository 实例
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

    // ==========================================
    // 写入
    // ==========================================

    /// 插入订单头
    pub fn insert(&self, order: &Order) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            &format!(
                "INSERT INTO customer_order ({ORDER_COLUMNS}) VALUES (\
                 ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ),
            params![
                order.order_id,
                order.customer_id,
                order.carrier,
                order.service,
                order.origin,
                order.shipping_state.to_db_str(),
                order.total_value,
                order.total_deposit,
                order.total_remaining,
                order.sale_summary.map(|s| s.to_db_str()),
                order.deadline.map(|d| d.to_string()),
                serde_json::to_string(&order.tasks)
                    .map_err(|e| RepositoryError::InternalError(e.to_string()))?,
                order.created_at.to_rfc3339(),
                order.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 订单头编辑（客户/发货选择/交期/任务）
    pub fn update_header(&self, order: &Order) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE customer_order SET \
             customer_id = ?2, carrier = ?3, service = ?4, origin = ?5, \
             deadline = ?6, tasks_json = ?7, updated_at = ?8 \
             WHERE order_id = ?1",
            params![
                order.order_id,
                order.customer_id,
                order.carrier,
                order.service,
                order.origin,
                order.deadline.map(|d| d.to_string()),
                serde_json::to_string(&order.tasks)
                    .map_err(|e| RepositoryError::InternalError(e.to_string()))?,
                Utc::now().to_rfc3339(),
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Order".to_string(),
                id: order.order_id.clone(),
            });
        }
        Ok(())
    }

    /// 刷新缓存合计（由聚合引擎算好后写入）
    pub fn refresh_totals(
        &self,
        order_id: &str,
        total_value: f64,
        total_deposit: f64,
        total_remaining: f64,
        sale_summary: Option<SaleState>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE customer_order SET \
             total_value = ?2, total_deposit = ?3, total_remaining = ?4, \
             sale_summary = ?5, updated_at = ?6 \
             WHERE order_id = ?1",
            params![
                order_id,
                total_value,
                total_deposit,
                total_remaining,
                sale_summary.map(|s| s.to_db_str()),
                Utc::now().to_rfc3339(),
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Order".to_string(),
                id: order_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除订单（级联删除条目）
    pub fn delete(&self, order_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM customer_order WHERE order_id = ?1",
            params![order_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Order".to_string(),
                id: order_id.to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 按 order_id 查询
    pub fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<Order>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ORDER_COLUMNS} FROM customer_order WHERE order_id = ?1"
        ))?;

        let result = stmt.query_row(params![order_id], Self::map_order);
        match result {
            Ok(order) => Ok(Some(order?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部订单
    pub fn list_all(&self) -> RepositoryResult<Vec<Order>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ORDER_COLUMNS} FROM customer_order ORDER BY created_at, order_id"
        ))?;

        let rows = stmt.query_map([], Self::map_order)?;
        let mut orders = Vec::new();
        for row in rows {
            orders.push(row??);
        }
        Ok(orders)
    }

    // ==========================================
    // 行映射
    // ==========================================

    fn map_order(row: &Row<'_>) -> rusqlite::Result<RepositoryResult<Order>> {
        let shipping_src: String = row.get(5)?;
        let sale_summary_src: Option<String> = row.get(9)?;
        let deadline_src: Option<String> = row.get(10)?;
        let tasks_json: String = row.get(11)?;

        Ok(Self::decode_order(
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            shipping_src,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
            sale_summary_src,
            deadline_src,
            tasks_json,
            row.get::<_, DateTime<Utc>>(12)?,
            row.get::<_, DateTime<Utc>>(13)?,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn decode_order(
        order_id: String,
        customer_id: String,
        carrier: Option<String>,
        service: Option<String>,
        origin: Option<String>,
        shipping_src: String,
        total_value: f64,
        total_deposit: f64,
        total_remaining: f64,
        sale_summary_src: Option<String>,
        deadline_src: Option<String>,
        tasks_json: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> RepositoryResult<Order> {
        let shipping_state = ShippingState::from_db_str(&shipping_src).ok_or_else(|| {
            RepositoryError::FieldValueError {
                field: "shipping_state".to_string(),
                message: format!("未知存储值: {}", shipping_src),
            }
        })?;

        let sale_summary = match sale_summary_src {
            None => None,
            Some(raw) => Some(SaleState::from_db_str(&raw).ok_or_else(|| {
                RepositoryError::FieldValueError {
                    field: "sale_summary".to_string(),
                    message: format!("未知存储值: {}", raw),
                }
            })?),
        };

        let deadline = match deadline_src {
            None => None,
            Some(raw) => Some(raw.parse::<NaiveDate>().map_err(|e| {
                RepositoryError::FieldValueError {
                    field: "deadline".to_string(),
                    message: e.to_string(),
                }
            })?),
        };

        let tasks: Vec<String> = serde_json::from_str(&tasks_json).map_err(|e| {
            RepositoryError::FieldValueError {
                field: "tasks_json".to_string(),
                message: e.to_string(),
            }
        })?;

        Ok(Order {
            order_id,
            customer_id,
            carrier,
            service,
            origin,
            shipping_state,
            total_value,
            total_deposit,
            total_remaining,
            sale_summary,
            deadline,
            tasks,
            created_at,
            updated_at,
        })
    }
}
