// ==========================================
// 锦鲤繁育管理系统 - 分级阶段仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: classification_record 表带 UNIQUE(stage_id, round_index),
//       并发重复提交由存储层约束兜底
// ==========================================

use crate::domain::classification::{ClassificationRecord, ClassificationStage};
use crate::domain::types::CountField;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// ClassificationStageRepository - 分级阶段仓储
// ==========================================

/// 分级阶段仓储
/// 职责: 管理classification_stage表的CRUD操作
pub struct ClassificationStageRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ClassificationStageRepository {
    /// 创建新的ClassificationStageRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建分级阶段
    pub fn create(&self, stage: &ClassificationStage) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO classification_stage (
                stage_id, process_id, total_count, started_date, created_at
            ) VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                stage.stage_id,
                stage.process_id,
                stage.total_count,
                stage.started_date.map(|d| d.format("%Y-%m-%d").to_string()),
                stage.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(stage.stage_id.clone())
    }

    /// 按ID查询分级阶段
    pub fn find_by_id(&self, stage_id: &str) -> RepositoryResult<Option<ClassificationStage>> {
        let conn = self.get_conn()?;

        let stage = conn
            .query_row(
                r#"
                SELECT stage_id, process_id, total_count, started_date, created_at
                FROM classification_stage
                WHERE stage_id = ?
                "#,
                params![stage_id],
                |row| Self::map_row(row),
            )
            .optional()?;

        Ok(stage)
    }

    /// 查询流程下的分级阶段 (每个流程至多一个,由唯一约束保证)
    pub fn find_by_process(
        &self,
        process_id: &str,
    ) -> RepositoryResult<Option<ClassificationStage>> {
        let conn = self.get_conn()?;

        let stage = conn
            .query_row(
                r#"
                SELECT stage_id, process_id, total_count, started_date, created_at
                FROM classification_stage
                WHERE process_id = ?
                "#,
                params![process_id],
                |row| Self::map_row(row),
            )
            .optional()?;

        Ok(stage)
    }

    /// 映射数据库行到ClassificationStage对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ClassificationStage> {
        Ok(ClassificationStage {
            stage_id: row.get(0)?,
            process_id: row.get(1)?,
            total_count: row.get(2)?,
            started_date: row
                .get::<_, Option<String>>(3)?
                .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            created_at: NaiveDateTime::parse_from_str(&row.get::<_, String>(4)?, "%Y-%m-%d %H:%M:%S")
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e)))?,
        })
    }
}

// ==========================================
// ClassificationRecordRepository - 筛选轮次记录仓储
// ==========================================
// 每条记录对应一个轮次,round_index随记录持久化
pub struct ClassificationRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ClassificationRecordRepository {
    /// 创建新的ClassificationRecordRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 统计阶段下已有的轮次记录数
    pub fn count_by_stage(&self, stage_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM classification_record WHERE stage_id = ?",
            params![stage_id],
            |row| row.get(0),
        )?;

        Ok(count as usize)
    }

    /// 插入轮次记录
    ///
    /// 并发提交同一轮次时,UNIQUE(stage_id, round_index)约束
    /// 使后到者得到 UniqueConstraintViolation
    pub fn create(&self, record: &ClassificationRecord) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO classification_record (
                record_id, stage_id, round_index,
                cull_qualified_count, high_qualified_count,
                show_qualified_count, pond_qualified_count,
                notes, created_by, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                record.record_id,
                record.stage_id,
                record.round_index,
                record.cull_qualified_count,
                record.high_qualified_count,
                record.show_qualified_count,
                record.pond_qualified_count,
                record.notes,
                record.created_by,
                record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(record.record_id.clone())
    }

    /// 按ID查询轮次记录
    pub fn find_by_id(&self, record_id: &str) -> RepositoryResult<Option<ClassificationRecord>> {
        let conn = self.get_conn()?;

        let record = conn
            .query_row(
                r#"
                SELECT record_id, stage_id, round_index,
                       cull_qualified_count, high_qualified_count,
                       show_qualified_count, pond_qualified_count,
                       notes, created_by, created_at
                FROM classification_record
                WHERE record_id = ?
                "#,
                params![record_id],
                |row| Self::map_row(row),
            )
            .optional()?;

        Ok(record)
    }

    /// 查询阶段下的所有轮次记录 (按轮次排序)
    pub fn find_by_stage(&self, stage_id: &str) -> RepositoryResult<Vec<ClassificationRecord>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT record_id, stage_id, round_index,
                   cull_qualified_count, high_qualified_count,
                   show_qualified_count, pond_qualified_count,
                   notes, created_by, created_at
            FROM classification_record
            WHERE stage_id = ?
            ORDER BY round_index
            "#,
        )?;

        let records = stmt
            .query_map(params![stage_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<ClassificationRecord>, _>>()?;

        Ok(records)
    }

    /// 按阶段和轮次查询单条记录
    pub fn find_by_round(
        &self,
        stage_id: &str,
        round_index: i32,
    ) -> RepositoryResult<Option<ClassificationRecord>> {
        let conn = self.get_conn()?;

        let record = conn
            .query_row(
                r#"
                SELECT record_id, stage_id, round_index,
                       cull_qualified_count, high_qualified_count,
                       show_qualified_count, pond_qualified_count,
                       notes, created_by, created_at
                FROM classification_record
                WHERE stage_id = ?1 AND round_index = ?2
                "#,
                params![stage_id, round_index],
                |row| Self::map_row(row),
            )
            .optional()?;

        Ok(record)
    }

    /// 查询阶段下已提交的最大轮次
    pub fn max_round_index(&self, stage_id: &str) -> RepositoryResult<Option<i32>> {
        let conn = self.get_conn()?;

        let max: Option<i32> = conn.query_row(
            "SELECT MAX(round_index) FROM classification_record WHERE stage_id = ?",
            params![stage_id],
            |row| row.get(0),
        )?;

        Ok(max)
    }

    /// 更正轮次记录的计数字段 (管理性操作)
    ///
    /// 列名来自封闭的CountField枚举,非外部输入
    pub fn update_count(
        &self,
        record_id: &str,
        field: CountField,
        value: i64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let sql = format!(
            "UPDATE classification_record SET {} = ?1 WHERE record_id = ?2",
            field.column()
        );
        let affected = conn.execute(&sql, params![value, record_id])?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ClassificationRecord".to_string(),
                id: record_id.to_string(),
            });
        }

        Ok(())
    }

    /// 删除轮次记录 (管理性操作,只允许删除最后一轮)
    pub fn delete(&self, record_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            "DELETE FROM classification_record WHERE record_id = ?",
            params![record_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ClassificationRecord".to_string(),
                id: record_id.to_string(),
            });
        }

        Ok(())
    }

    /// 映射数据库行到ClassificationRecord对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ClassificationRecord> {
        Ok(ClassificationRecord {
            record_id: row.get(0)?,
            stage_id: row.get(1)?,
            round_index: row.get(2)?,
            cull_qualified_count: row.get(3)?,
            high_qualified_count: row.get(4)?,
            show_qualified_count: row.get(5)?,
            pond_qualified_count: row.get(6)?,
            notes: row.get(7)?,
            created_by: row.get(8)?,
            created_at: NaiveDateTime::parse_from_str(&row.get::<_, String>(9)?, "%Y-%m-%d %H:%M:%S")
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e)))?,
        })
    }
}
