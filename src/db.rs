// ==========================================
// 印章定制订单管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为,外键必须逐连接开启
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// - 本地镜像库的建表脚本集中于此
// ==========================================

use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
/// - foreign_keys 需要"每个连接"单独开启（订单删除级联依赖它）
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 默认数据库路径（用户数据目录下）
pub fn default_db_path() -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("stamp-oms");
    path.push("stamp_oms.db");
    path
}

/// 初始化本地镜像库表结构（幂等）
///
/// 说明:
/// - 状态列存储托管库的历史西语词汇,引擎侧经边界翻译
/// - 发货状态按条目冗余存储,订单头另存单一事实值
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS customer_order (
            order_id        TEXT PRIMARY KEY,
            customer_id     TEXT NOT NULL,
            carrier         TEXT,
            service         TEXT,
            origin          TEXT,
            shipping_state  TEXT NOT NULL DEFAULT 'Sin Envío',
            total_value     REAL NOT NULL DEFAULT 0,
            total_deposit   REAL NOT NULL DEFAULT 0,
            total_remaining REAL NOT NULL DEFAULT 0,
            sale_summary    TEXT,
            deadline        TEXT,
            tasks_json      TEXT NOT NULL DEFAULT '[]',
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS stamp (
            stamp_id          TEXT PRIMARY KEY,
            order_id          TEXT NOT NULL
                              REFERENCES customer_order(order_id) ON DELETE CASCADE,
            stamp_type        TEXT,
            width_cm          REAL,
            height_cm         REAL,
            fabrication_state TEXT NOT NULL DEFAULT 'Sin Hacer',
            sale_state        TEXT NOT NULL DEFAULT 'Señado',
            shipping_state    TEXT NOT NULL DEFAULT 'Sin Envío',
            aspire_substate   TEXT,
            is_priority       INTEGER NOT NULL DEFAULT 0,
            machine           TEXT,
            program           TEXT,
            value             REAL NOT NULL DEFAULT 0,
            deposit           REAL NOT NULL DEFAULT 0,
            stored_remaining  REAL,
            base_file         TEXT,
            vector_file       TEXT,
            photo_file        TEXT,
            notes             TEXT,
            created_at        TEXT NOT NULL,
            updated_at        TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_stamp_order_id ON stamp(order_id);

        CREATE TABLE IF NOT EXISTS shipping_rate (
            carrier TEXT NOT NULL,
            service TEXT NOT NULL,
            cost    REAL NOT NULL,
            PRIMARY KEY (carrier, service)
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key      TEXT NOT NULL,
            value    TEXT NOT NULL,
            PRIMARY KEY (scope_id, key)
        );
        "#,
    )
}
