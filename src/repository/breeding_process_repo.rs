// ==========================================
// 锦鲤繁育管理系统 - 繁育流程仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::breeding::BreedingProcess;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// BreedingProcessRepository - 繁育流程仓储
// ==========================================

/// 繁育流程仓储
/// 职责: 管理breeding_process表的CRUD操作
pub struct BreedingProcessRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BreedingProcessRepository {
    /// 创建新的BreedingProcessRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建繁育流程
    ///
    /// # 参数
    /// - `process`: 繁育流程实体
    ///
    /// # 返回
    /// - `Ok(process_id)`: 创建成功
    /// - `Err`: 数据库错误
    pub fn create(&self, process: &BreedingProcess) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO breeding_process (
                process_id, process_name, father_koi, mother_koi,
                spawning_date, created_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                process.process_id,
                process.process_name,
                process.father_koi,
                process.mother_koi,
                process.spawning_date.map(|d| d.format("%Y-%m-%d").to_string()),
                process.created_by,
                process.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                process.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(process.process_id.clone())
    }

    /// 按ID查询繁育流程
    ///
    /// # 返回
    /// - `Ok(Some(BreedingProcess))`: 找到流程
    /// - `Ok(None)`: 未找到
    pub fn find_by_id(&self, process_id: &str) -> RepositoryResult<Option<BreedingProcess>> {
        let conn = self.get_conn()?;

        let process = conn
            .query_row(
                r#"
                SELECT process_id, process_name, father_koi, mother_koi,
                       spawning_date, created_by, created_at, updated_at
                FROM breeding_process
                WHERE process_id = ?
                "#,
                params![process_id],
                |row| Self::map_row(row),
            )
            .optional()?;

        Ok(process)
    }

    /// 查询所有繁育流程 (最近创建的在前)
    pub fn find_all(&self) -> RepositoryResult<Vec<BreedingProcess>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT process_id, process_name, father_koi, mother_koi,
                   spawning_date, created_by, created_at, updated_at
            FROM breeding_process
            ORDER BY created_at DESC, process_id
            "#,
        )?;

        let processes = stmt
            .query_map([], |row| Self::map_row(row))?
            .collect::<Result<Vec<BreedingProcess>, _>>()?;

        Ok(processes)
    }

    /// 刷新流程的更新时间 (子记录写入后调用)
    pub fn touch(&self, process_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string();

        conn.execute(
            "UPDATE breeding_process SET updated_at = ?1 WHERE process_id = ?2",
            params![now, process_id],
        )?;

        Ok(())
    }

    /// 映射数据库行到BreedingProcess对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<BreedingProcess> {
        Ok(BreedingProcess {
            process_id: row.get(0)?,
            process_name: row.get(1)?,
            father_koi: row.get(2)?,
            mother_koi: row.get(3)?,
            spawning_date: row
                .get::<_, Option<String>>(4)?
                .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            created_by: row.get(5)?,
            created_at: NaiveDateTime::parse_from_str(&row.get::<_, String>(6)?, "%Y-%m-%d %H:%M:%S")
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e)))?,
            updated_at: NaiveDateTime::parse_from_str(&row.get::<_, String>(7)?, "%Y-%m-%d %H:%M:%S")
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e)))?,
        })
    }
}
