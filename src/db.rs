// ==========================================
// 锦鲤繁育管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表语句集中在此,仓储层不建表
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
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

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库表结构（幂等）
///
/// # 约束要点
/// - egg_batch / fry_fish / classification_stage 与流程一对一 (process_id UNIQUE)
/// - classification_record 带 UNIQUE(stage_id, round_index),并发重复提交由此兜底
/// - 记录表的 seq 带 UNIQUE(父ID, seq),保证插入顺序可重建
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS breeding_process (
            process_id    TEXT PRIMARY KEY,
            process_name  TEXT NOT NULL,
            father_koi    TEXT,
            mother_koi    TEXT,
            spawning_date TEXT,
            created_by    TEXT NOT NULL,
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS egg_batch (
            batch_id   TEXT PRIMARY KEY,
            process_id TEXT NOT NULL UNIQUE REFERENCES breeding_process(process_id),
            quantity   INTEGER NOT NULL,
            laid_date  TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS incubation_daily_record (
            record_id     TEXT PRIMARY KEY,
            batch_id      TEXT NOT NULL REFERENCES egg_batch(batch_id),
            seq           INTEGER NOT NULL,
            record_date   TEXT NOT NULL,
            hatched_count INTEGER NOT NULL,
            rotten_count  INTEGER NOT NULL,
            note          TEXT,
            created_at    TEXT NOT NULL,
            UNIQUE (batch_id, seq)
        );

        CREATE TABLE IF NOT EXISTS fry_fish (
            fry_id        TEXT PRIMARY KEY,
            process_id    TEXT NOT NULL UNIQUE REFERENCES breeding_process(process_id),
            initial_count INTEGER NOT NULL,
            hatched_date  TEXT,
            created_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS fry_survival_record (
            record_id   TEXT PRIMARY KEY,
            fry_id      TEXT NOT NULL REFERENCES fry_fish(fry_id),
            seq         INTEGER NOT NULL,
            day_number  INTEGER NOT NULL,
            count_alive INTEGER NOT NULL,
            note        TEXT,
            created_at  TEXT NOT NULL,
            UNIQUE (fry_id, seq)
        );

        CREATE TABLE IF NOT EXISTS classification_stage (
            stage_id     TEXT PRIMARY KEY,
            process_id   TEXT NOT NULL UNIQUE REFERENCES breeding_process(process_id),
            total_count  INTEGER NOT NULL,
            started_date TEXT,
            created_at   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS classification_record (
            record_id            TEXT PRIMARY KEY,
            stage_id             TEXT NOT NULL REFERENCES classification_stage(stage_id),
            round_index          INTEGER NOT NULL,
            cull_qualified_count INTEGER,
            high_qualified_count INTEGER,
            show_qualified_count INTEGER,
            pond_qualified_count INTEGER,
            notes                TEXT,
            created_by           TEXT NOT NULL,
            created_at           TEXT NOT NULL,
            UNIQUE (stage_id, round_index)
        );

        CREATE TABLE IF NOT EXISTS action_log (
            action_id    TEXT PRIMARY KEY,
            process_id   TEXT REFERENCES breeding_process(process_id),
            action_type  TEXT NOT NULL,
            action_ts    TEXT NOT NULL,
            actor        TEXT NOT NULL,
            payload_json TEXT,
            detail       TEXT
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key      TEXT NOT NULL,
            value    TEXT NOT NULL,
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_action_ts ON action_log(action_ts);
        CREATE INDEX IF NOT EXISTS idx_action_process_ts ON action_log(process_id, action_ts);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_round_uniqueness_enforced() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO breeding_process (process_id, process_name, created_by, created_at, updated_at)
             VALUES ('P1', '测试流程', 'tester', '2024-04-01 08:00:00', '2024-04-01 08:00:00')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO classification_stage (stage_id, process_id, total_count, created_at)
             VALUES ('S1', 'P1', 500, '2024-04-01 08:00:00')",
            [],
        )
        .unwrap();

        conn.execute(
            "INSERT INTO classification_record (record_id, stage_id, round_index, cull_qualified_count, created_by, created_at)
             VALUES ('R1', 'S1', 0, 50, 'tester', '2024-04-01 08:00:00')",
            [],
        )
        .unwrap();

        // 同一阶段同一轮次的第二条插入必须失败
        let dup = conn.execute(
            "INSERT INTO classification_record (record_id, stage_id, round_index, cull_qualified_count, created_by, created_at)
             VALUES ('R2', 'S1', 0, 60, 'tester', '2024-04-01 08:00:01')",
            [],
        );
        assert!(dup.is_err());
    }

    #[test]
    fn test_one_batch_per_process() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO breeding_process (process_id, process_name, created_by, created_at, updated_at)
             VALUES ('P1', '测试流程', 'tester', '2024-04-01 08:00:00', '2024-04-01 08:00:00')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO egg_batch (batch_id, process_id, quantity, created_at)
             VALUES ('B1', 'P1', 200, '2024-04-01 08:00:00')",
            [],
        )
        .unwrap();

        let dup = conn.execute(
            "INSERT INTO egg_batch (batch_id, process_id, quantity, created_at)
             VALUES ('B2', 'P1', 300, '2024-04-01 08:00:01')",
            [],
        );
        assert!(dup.is_err());
    }
}
