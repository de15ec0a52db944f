// ==========================================
// 锦鲤繁育管理系统 - 鱼卵批次仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 孵化日记录的seq在事务内分配,保证插入顺序可追溯
// ==========================================

use crate::domain::breeding::{EggBatch, IncubationDailyRecord};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// EggBatchRepository - 鱼卵批次仓储
// ==========================================

/// 鱼卵批次仓储
/// 职责: 管理egg_batch表的CRUD操作
pub struct EggBatchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EggBatchRepository {
    /// 创建新的EggBatchRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建鱼卵批次
    pub fn create(&self, batch: &EggBatch) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO egg_batch (
                batch_id, process_id, quantity, laid_date, created_at
            ) VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                batch.batch_id,
                batch.process_id,
                batch.quantity,
                batch.laid_date.map(|d| d.format("%Y-%m-%d").to_string()),
                batch.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(batch.batch_id.clone())
    }

    /// 按ID查询鱼卵批次
    pub fn find_by_id(&self, batch_id: &str) -> RepositoryResult<Option<EggBatch>> {
        let conn = self.get_conn()?;

        let batch = conn
            .query_row(
                r#"
                SELECT batch_id, process_id, quantity, laid_date, created_at
                FROM egg_batch
                WHERE batch_id = ?
                "#,
                params![batch_id],
                |row| Self::map_row(row),
            )
            .optional()?;

        Ok(batch)
    }

    /// 查询流程下的鱼卵批次 (每个流程至多一个,由唯一约束保证)
    pub fn find_by_process(&self, process_id: &str) -> RepositoryResult<Option<EggBatch>> {
        let conn = self.get_conn()?;

        let batch = conn
            .query_row(
                r#"
                SELECT batch_id, process_id, quantity, laid_date, created_at
                FROM egg_batch
                WHERE process_id = ?
                "#,
                params![process_id],
                |row| Self::map_row(row),
            )
            .optional()?;

        Ok(batch)
    }

    /// 映射数据库行到EggBatch对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<EggBatch> {
        Ok(EggBatch {
            batch_id: row.get(0)?,
            process_id: row.get(1)?,
            quantity: row.get(2)?,
            laid_date: row
                .get::<_, Option<String>>(3)?
                .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            created_at: NaiveDateTime::parse_from_str(&row.get::<_, String>(4)?, "%Y-%m-%d %H:%M:%S")
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e)))?,
        })
    }
}

// ==========================================
// IncubationRecordRepository - 孵化日记录仓储
// ==========================================
// 记录为累计值快照: hatched_count/rotten_count 均为截至当日的累计数
pub struct IncubationRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl IncubationRecordRepository {
    /// 创建新的IncubationRecordRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入孵化日记录
    ///
    /// seq在事务内分配 (同批次内单调递增),调用方不提供
    ///
    /// # 返回
    /// - `Ok(seq)`: 分配到的序号
    /// - `Err`: 数据库错误
    pub fn insert(&self, record: &IncubationDailyRecord) -> RepositoryResult<i64> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let seq: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM incubation_daily_record WHERE batch_id = ?",
            params![record.batch_id],
            |row| row.get(0),
        )?;

        tx.execute(
            r#"
            INSERT INTO incubation_daily_record (
                record_id, batch_id, seq, record_date,
                hatched_count, rotten_count, note, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                record.record_id,
                record.batch_id,
                seq,
                record.record_date.format("%Y-%m-%d").to_string(),
                record.hatched_count,
                record.rotten_count,
                record.note,
                record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        tx.commit()?;
        Ok(seq)
    }

    /// 按ID查询孵化日记录
    pub fn find_by_id(&self, record_id: &str) -> RepositoryResult<Option<IncubationDailyRecord>> {
        let conn = self.get_conn()?;

        let record = conn
            .query_row(
                r#"
                SELECT record_id, batch_id, seq, record_date,
                       hatched_count, rotten_count, note, created_at
                FROM incubation_daily_record
                WHERE record_id = ?
                "#,
                params![record_id],
                |row| Self::map_row(row),
            )
            .optional()?;

        Ok(record)
    }

    /// 查询批次下的所有孵化日记录 (按插入顺序)
    pub fn find_by_batch(&self, batch_id: &str) -> RepositoryResult<Vec<IncubationDailyRecord>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT record_id, batch_id, seq, record_date,
                   hatched_count, rotten_count, note, created_at
            FROM incubation_daily_record
            WHERE batch_id = ?
            ORDER BY seq
            "#,
        )?;

        let records = stmt
            .query_map(params![batch_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<IncubationDailyRecord>, _>>()?;

        Ok(records)
    }

    /// 查询批次下最后插入的孵化日记录
    pub fn find_latest(&self, batch_id: &str) -> RepositoryResult<Option<IncubationDailyRecord>> {
        let conn = self.get_conn()?;

        let record = conn
            .query_row(
                r#"
                SELECT record_id, batch_id, seq, record_date,
                       hatched_count, rotten_count, note, created_at
                FROM incubation_daily_record
                WHERE batch_id = ?
                ORDER BY seq DESC
                LIMIT 1
                "#,
                params![batch_id],
                |row| Self::map_row(row),
            )
            .optional()?;

        Ok(record)
    }

    /// 更正孵化日记录的累计计数 (管理性操作)
    pub fn update_counts(
        &self,
        record_id: &str,
        hatched_count: i64,
        rotten_count: i64,
        note: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            r#"
            UPDATE incubation_daily_record
            SET hatched_count = ?1, rotten_count = ?2, note = ?3
            WHERE record_id = ?4
            "#,
            params![hatched_count, rotten_count, note, record_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "IncubationDailyRecord".to_string(),
                id: record_id.to_string(),
            });
        }

        Ok(())
    }

    /// 删除孵化日记录 (管理性操作)
    pub fn delete(&self, record_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            "DELETE FROM incubation_daily_record WHERE record_id = ?",
            params![record_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "IncubationDailyRecord".to_string(),
                id: record_id.to_string(),
            });
        }

        Ok(())
    }

    /// 映射数据库行到IncubationDailyRecord对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<IncubationDailyRecord> {
        Ok(IncubationDailyRecord {
            record_id: row.get(0)?,
            batch_id: row.get(1)?,
            seq: row.get(2)?,
            record_date: NaiveDate::parse_from_str(&row.get::<_, String>(3)?, "%Y-%m-%d")
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e)))?,
            hatched_count: row.get(4)?,
            rotten_count: row.get(5)?,
            note: row.get(6)?,
            created_at: NaiveDateTime::parse_from_str(&row.get::<_, String>(7)?, "%Y-%m-%d %H:%M:%S")
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e)))?,
        })
    }
}
