// ==========================================
// 锦鲤繁育管理系统 - 鱼苗仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 存活记录的seq在事务内分配,同日多条记录以最后插入为准
// ==========================================

use crate::domain::fry::{FryFish, FrySurvivalRecord};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// FryFishRepository - 鱼苗批次仓储
// ==========================================

/// 鱼苗批次仓储
/// 职责: 管理fry_fish表的CRUD操作
pub struct FryFishRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FryFishRepository {
    /// 创建新的FryFishRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建鱼苗批次
    pub fn create(&self, fry: &FryFish) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO fry_fish (
                fry_id, process_id, initial_count, hatched_date, created_at
            ) VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                fry.fry_id,
                fry.process_id,
                fry.initial_count,
                fry.hatched_date.map(|d| d.format("%Y-%m-%d").to_string()),
                fry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(fry.fry_id.clone())
    }

    /// 按ID查询鱼苗批次
    pub fn find_by_id(&self, fry_id: &str) -> RepositoryResult<Option<FryFish>> {
        let conn = self.get_conn()?;

        let fry = conn
            .query_row(
                r#"
                SELECT fry_id, process_id, initial_count, hatched_date, created_at
                FROM fry_fish
                WHERE fry_id = ?
                "#,
                params![fry_id],
                |row| Self::map_row(row),
            )
            .optional()?;

        Ok(fry)
    }

    /// 查询流程下的鱼苗批次 (每个流程至多一个,由唯一约束保证)
    pub fn find_by_process(&self, process_id: &str) -> RepositoryResult<Option<FryFish>> {
        let conn = self.get_conn()?;

        let fry = conn
            .query_row(
                r#"
                SELECT fry_id, process_id, initial_count, hatched_date, created_at
                FROM fry_fish
                WHERE process_id = ?
                "#,
                params![process_id],
                |row| Self::map_row(row),
            )
            .optional()?;

        Ok(fry)
    }

    /// 映射数据库行到FryFish对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<FryFish> {
        Ok(FryFish {
            fry_id: row.get(0)?,
            process_id: row.get(1)?,
            initial_count: row.get(2)?,
            hatched_date: row
                .get::<_, Option<String>>(3)?
                .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            created_at: NaiveDateTime::parse_from_str(&row.get::<_, String>(4)?, "%Y-%m-%d %H:%M:%S")
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e)))?,
        })
    }
}

// ==========================================
// FrySurvivalRepository - 鱼苗存活记录仓储
// ==========================================
pub struct FrySurvivalRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FrySurvivalRepository {
    /// 创建新的FrySurvivalRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入存活记录
    ///
    /// seq在事务内分配 (同鱼苗批次内单调递增),调用方不提供
    ///
    /// # 返回
    /// - `Ok(seq)`: 分配到的序号
    /// - `Err`: 数据库错误
    pub fn insert(&self, record: &FrySurvivalRecord) -> RepositoryResult<i64> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let seq: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM fry_survival_record WHERE fry_id = ?",
            params![record.fry_id],
            |row| row.get(0),
        )?;

        tx.execute(
            r#"
            INSERT INTO fry_survival_record (
                record_id, fry_id, seq, day_number, count_alive, note, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                record.record_id,
                record.fry_id,
                seq,
                record.day_number,
                record.count_alive,
                record.note,
                record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        tx.commit()?;
        Ok(seq)
    }

    /// 按ID查询存活记录
    pub fn find_by_id(&self, record_id: &str) -> RepositoryResult<Option<FrySurvivalRecord>> {
        let conn = self.get_conn()?;

        let record = conn
            .query_row(
                r#"
                SELECT record_id, fry_id, seq, day_number, count_alive, note, created_at
                FROM fry_survival_record
                WHERE record_id = ?
                "#,
                params![record_id],
                |row| Self::map_row(row),
            )
            .optional()?;

        Ok(record)
    }

    /// 查询鱼苗批次下的所有存活记录 (按插入顺序)
    pub fn find_by_fry(&self, fry_id: &str) -> RepositoryResult<Vec<FrySurvivalRecord>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT record_id, fry_id, seq, day_number, count_alive, note, created_at
            FROM fry_survival_record
            WHERE fry_id = ?
            ORDER BY seq
            "#,
        )?;

        let records = stmt
            .query_map(params![fry_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<FrySurvivalRecord>, _>>()?;

        Ok(records)
    }

    /// 查询鱼苗批次下最后插入的存活记录
    pub fn find_latest(&self, fry_id: &str) -> RepositoryResult<Option<FrySurvivalRecord>> {
        let conn = self.get_conn()?;

        let record = conn
            .query_row(
                r#"
                SELECT record_id, fry_id, seq, day_number, count_alive, note, created_at
                FROM fry_survival_record
                WHERE fry_id = ?
                ORDER BY seq DESC
                LIMIT 1
                "#,
                params![fry_id],
                |row| Self::map_row(row),
            )
            .optional()?;

        Ok(record)
    }

    /// 更正存活记录的存活数 (管理性操作)
    pub fn update_count(
        &self,
        record_id: &str,
        count_alive: i64,
        note: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            r#"
            UPDATE fry_survival_record
            SET count_alive = ?1, note = ?2
            WHERE record_id = ?3
            "#,
            params![count_alive, note, record_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "FrySurvivalRecord".to_string(),
                id: record_id.to_string(),
            });
        }

        Ok(())
    }

    /// 删除存活记录 (管理性操作)
    pub fn delete(&self, record_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            "DELETE FROM fry_survival_record WHERE record_id = ?",
            params![record_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "FrySurvivalRecord".to_string(),
                id: record_id.to_string(),
            });
        }

        Ok(())
    }

    /// 映射数据库行到FrySurvivalRecord对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<FrySurvivalRecord> {
        Ok(FrySurvivalRecord {
            record_id: row.get(0)?,
            fry_id: row.get(1)?,
            seq: row.get(2)?,
            day_number: row.get(3)?,
            count_alive: row.get(4)?,
            note: row.get(5)?,
            created_at: NaiveDateTime::parse_from_str(&row.get::<_, String>(6)?, "%Y-%m-%d %H:%M:%S")
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e)))?,
        })
    }
}
