// ==========================================
// 印章定制订单管理系统 - 印章条目仓储
// ==========================================
// 职责: stamp 表 CRUD + 存储边界翻译
// 红线: Repository 不含守卫逻辑;补丁集必须整体落库
// 边界翻译:
// - 历史 "Prioridad" → NOT_STARTED + is_priority（读方向,normalize 内消化）
// - ProductionState ↔ (fabrication_state, aspire_substate) 两列
// - 发货状态按条目冗余,写入时与订单头同事务同步
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::stamp::{RawStampRecord, Stamp};
use crate::domain::types::ShippingState;
use crate::engine::transition_core::SiblingPatch;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};
use tracing::debug;

const STAMP_COLUMNS: &str = "stamp_id, order_id, stamp_type, width_cm, height_cm, \
     fabrication_state, sale_state, shipping_state, aspire_substate, is_priority, \
     machine, program, value, deposit, stored_remaining, \
     base_file, vector_file, photo_file, notes, created_at, updated_at";

// ==========================================
// StampRepository - 印章条目仓储
// ==========================================
pub struct StampRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StampRepository {
    /// 创建新的 StampRepository 实例
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

    /// 插入条目（ProductionState 拆解为两列落库）
    pub fn insert(&self, stamp: &Stamp) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            &format!(
                "INSERT INTO stamp ({STAMP_COLUMNS}) VALUES (\
                 ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, \
                 ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)"
            ),
            params![
                stamp.stamp_id,
                stamp.order_id,
                stamp.stamp_type,
                stamp.width_cm,
                stamp.height_cm,
                stamp.fabrication_state().to_db_str(),
                stamp.sale_state.to_db_str(),
                stamp.shipping_state.to_db_str(),
                stamp.aspire_substate().map(|s| s.to_db_str()),
                stamp.is_priority,
                stamp.machine,
                stamp.program,
                stamp.value,
                stamp.deposit,
                stamp.stored_remaining,
                stamp.base_file,
                stamp.vector_file,
                stamp.photo_file,
                stamp.notes,
                stamp.created_at.to_rfc3339(),
                stamp.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 整行更新
    pub fn update(&self, stamp: &Stamp) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE stamp SET \
             order_id = ?2, stamp_type = ?3, width_cm = ?4, height_cm = ?5, \
             fabrication_state = ?6, sale_state = ?7, shipping_state = ?8, \
             aspire_substate = ?9, is_priority = ?10, machine = ?11, program = ?12, \
             value = ?13, deposit = ?14, stored_remaining = ?15, \
             base_file = ?16, vector_file = ?17, photo_file = ?18, notes = ?19, \
             updated_at = ?20 \
             WHERE stamp_id = ?1",
            params![
                stamp.stamp_id,
                stamp.order_id,
                stamp.stamp_type,
                stamp.width_cm,
                stamp.height_cm,
                stamp.fabrication_state().to_db_str(),
                stamp.sale_state.to_db_str(),
                stamp.shipping_state.to_db_str(),
                stamp.aspire_substate().map(|s| s.to_db_str()),
                stamp.is_priority,
                stamp.machine,
                stamp.program,
                stamp.value,
                stamp.deposit,
                stamp.stored_remaining,
                stamp.base_file,
                stamp.vector_file,
                stamp.photo_file,
                stamp.notes,
                Utc::now().to_rfc3339(),
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Stamp".to_string(),
                id: stamp.stamp_id.clone(),
            });
        }
        Ok(())
    }

    /// 删除条目（不影响订单头）
    pub fn delete(&self, stamp_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM stamp WHERE stamp_id = ?1", params![stamp_id])?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Stamp".to_string(),
                id: stamp_id.to_string(),
            });
        }
        Ok(())
    }

    /// 应用状态流转补丁集（单事务）
    ///
    /// # 落库顺序（固定）
    /// 1. 目标条目整行（主状态字段）
    /// 2. 兄弟条目发货状态扇出
    /// 3. 订单头发货状态同步
    ///
    /// # 红线
    /// 任何一步影响行数不符 → 回滚并返回 PartialPatchSet
    pub fn apply_patch_set(
        &self,
        stamp: &Stamp,
        sibling_patches: &[SiblingPatch],
        order_shipping_state: Option<ShippingState>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let now = Utc::now().to_rfc3339();

        // 步骤 1: 目标条目
        let affected = tx.execute(
            "UPDATE stamp SET \
             fabrication_state = ?2, sale_state = ?3, shipping_state = ?4, \
             aspire_substate = ?5, is_priority = ?6, machine = ?7, program = ?8, \
             updated_at = ?9 \
             WHERE stamp_id = ?1",
            params![
                stamp.stamp_id,
                stamp.fabrication_state().to_db_str(),
                stamp.sale_state.to_db_str(),
                stamp.shipping_state.to_db_str(),
                stamp.aspire_substate().map(|s| s.to_db_str()),
                stamp.is_priority,
                stamp.machine,
                stamp.program,
                now,
            ],
        )?;
        if affected != 1 {
            return Err(RepositoryError::PartialPatchSet {
                expected: 1,
                applied: affected,
            });
        }

        // 步骤 2: 兄弟条目扇出
        for patch in sibling_patches {
            let affected = tx.execute(
                "UPDATE stamp SET shipping_state = ?2, updated_at = ?3 WHERE stamp_id = ?1",
                params![patch.stamp_id, patch.shipping_state.to_db_str(), now],
            )?;
            if affected != 1 {
                return Err(RepositoryError::PartialPatchSet {
                    expected: sibling_patches.len() + 1,
                    applied: affected,
                });
            }
        }

        // 步骤 3: 订单头同步
        if let Some(shipping) = order_shipping_state {
            let affected = tx.execute(
                "UPDATE customer_order SET shipping_state = ?2, updated_at = ?3 \
                 WHERE order_id = ?1",
                params![stamp.order_id, shipping.to_db_str(), now],
            )?;
            if affected != 1 {
                return Err(RepositoryError::PartialPatchSet {
                    expected: 1,
                    applied: affected,
                });
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        debug!(
            stamp_id = %stamp.stamp_id,
            fan_out = sibling_patches.len(),
            "补丁集已落库"
        );
        Ok(())
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 按 stamp_id 查询
    pub fn find_by_id(&self, stamp_id: &str) -> RepositoryResult<Option<Stamp>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {STAMP_COLUMNS} FROM stamp WHERE stamp_id = ?1"
        ))?;

        let result = stmt.query_row(params![stamp_id], Self::map_raw_record);
        match result {
            Ok(raw) => Ok(Some(Self::normalize(raw)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询订单全部条目（按创建时间）
    pub fn find_by_order(&self, order_id: &str) -> RepositoryResult<Vec<Stamp>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {STAMP_COLUMNS} FROM stamp WHERE order_id = ?1 ORDER BY created_at, stamp_id"
        ))?;

        let rows = stmt.query_map(params![order_id], Self::map_raw_record)?;
        let mut stamps = Vec::new();
        for row in rows {
            stamps.push(Self::normalize(row?)?);
        }
        Ok(stamps)
    }

    /// 查询全部条目（生产队列视图输入）
    pub fn list_all(&self) -> RepositoryResult<Vec<Stamp>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {STAMP_COLUMNS} FROM stamp ORDER BY created_at, stamp_id"
        ))?;

        let rows = stmt.query_map([], Self::map_raw_record)?;
        let mut stamps = Vec::new();
        for row in rows {
            stamps.push(Self::normalize(row?)?);
        }
        Ok(stamps)
    }

    // ==========================================
    // 行映射
    // ==========================================

    fn map_raw_record(row: &Row<'_>) -> rusqlite::Result<RawStampRecord> {
        Ok(RawStampRecord {
            stamp_id: row.get(0)?,
            order_id: row.get(1)?,
            stamp_type: row.get(2)?,
            width_cm: row.get(3)?,
            height_cm: row.get(4)?,
            fabrication_src: row.get(5)?,
            sale_src: row.get(6)?,
            shipping_src: row.get(7)?,
            aspire_src: row.get(8)?,
            priority_flag: row.get(9)?,
            machine: row.get(10)?,
            program: row.get(11)?,
            value: row.get(12)?,
            deposit: row.get(13)?,
            stored_remaining: row.get(14)?,
            base_file: row.get(15)?,
            vector_file: row.get(16)?,
            photo_file: row.get(17)?,
            notes: row.get(18)?,
            created_at: row.get::<_, DateTime<Utc>>(19)?,
            updated_at: row.get::<_, DateTime<Utc>>(20)?,
        })
    }

    fn normalize(raw: RawStampRecord) -> RepositoryResult<Stamp> {
        raw.normalize().map_err(|e| RepositoryError::FieldValueError {
            field: e.field.to_string(),
            message: format!("未知存储值: {}", e.value),
        })
    }
}
