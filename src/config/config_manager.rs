// ==========================================
// 印章定制订单管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::engine_config_trait::EngineConfigReader;
use crate::db::open_sqlite_connection;
use crate::engine::balance::StaleRemainingPolicy;
use crate::engine::priority::{RankKey, SortCriterion, SortKey};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    /// 队列键序（JSON 数组,元素为状态的存储词汇）
    pub const PRIORITY_ORDER: &str = "queue/priority_order";
    /// 默认次级判据（JSON 数组）
    pub const DEFAULT_CRITERIA: &str = "queue/default_criteria";
    /// 运费价目变动口径
    pub const STALE_REMAINING_POLICY: &str = "balance/stale_remaining_policy";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明: 为保证连接行为一致,会对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }
        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值,带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入配置值（UPSERT,scope='global'）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }
}

// ==========================================
// EngineConfigReader Trait 实现
// ==========================================
#[async_trait]
impl EngineConfigReader for ConfigManager {
    async fn get_priority_order(&self) -> Result<Vec<RankKey>, Box<dyn Error>> {
        let raw = match self.get_config_value(config_keys::PRIORITY_ORDER)? {
            Some(v) => v,
            None => return Ok(RankKey::default_order()),
        };

        // 存储格式: 状态存储词汇的 JSON 数组,如 ["Sin Hacer","Para Aspire",...]
        let tokens: Vec<String> = match serde_json::from_str(&raw) {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(
                    config_key = config_keys::PRIORITY_ORDER,
                    error = %e,
                    "键序配置格式错误,使用默认键序"
                );
                return Ok(RankKey::default_order());
            }
        };

        let keys: Vec<RankKey> = tokens
            .iter()
            .filter_map(|t| RankKey::from_db_str(t))
            .collect();

        if keys.is_empty() {
            Ok(RankKey::default_order())
        } else {
            Ok(keys)
        }
    }

    async fn get_default_criteria(&self) -> Result<Vec<SortCriterion>, Box<dyn Error>> {
        let raw = match self.get_config_value(config_keys::DEFAULT_CRITERIA)? {
            Some(v) => v,
            None => return Ok(vec![SortCriterion::asc(SortKey::CreatedAt)]),
        };

        match serde_json::from_str::<Vec<SortCriterion>>(&raw) {
            Ok(criteria) if !criteria.is_empty() => Ok(criteria),
            Ok(_) => Ok(vec![SortCriterion::asc(SortKey::CreatedAt)]),
            Err(e) => {
                tracing::warn!(
                    config_key = config_keys::DEFAULT_CRITERIA,
                    error = %e,
                    "判据配置格式错误,使用默认判据"
                );
                Ok(vec![SortCriterion::asc(SortKey::CreatedAt)])
            }
        }
    }

    async fn get_stale_remaining_policy(
        &self,
    ) -> Result<StaleRemainingPolicy, Box<dyn Error>> {
        let value = self.get_config_or_default(
            config_keys::STALE_REMAINING_POLICY,
            StaleRemainingPolicy::default().to_db_str(),
        )?;
        Ok(StaleRemainingPolicy::from_db_str(&value))
    }
}
