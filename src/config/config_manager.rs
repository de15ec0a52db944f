// ==========================================
// 锦鲤繁育管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

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
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
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

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;

        Ok(())
    }

    // ===== 界面配置 =====

    /// 获取界面语言（默认 zh-CN）
    pub fn get_ui_language(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::UI_LANGUAGE, "zh-CN")
    }

    // ===== 繁育记录配置 =====

    /// 获取备注长度上限（默认 500 字）
    pub fn get_notes_max_len(&self) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::NOTES_MAX_LEN, "500")?;
        Ok(value.trim().parse::<usize>().unwrap_or(500))
    }

    /// 获取默认操作人（调用方未提供操作人时使用）
    pub fn get_default_actor(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::DEFAULT_ACTOR, "farm-op")
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 界面
    pub const UI_LANGUAGE: &str = "ui.language";

    // 繁育记录
    pub const NOTES_MAX_LEN: &str = "breeding.notes_max_len";
    pub const DEFAULT_ACTOR: &str = "breeding.default_actor";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn create_test_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_unset() {
        let manager = create_test_manager();

        assert_eq!(manager.get_ui_language().unwrap(), "zh-CN");
        assert_eq!(manager.get_notes_max_len().unwrap(), 500);
        assert_eq!(manager.get_default_actor().unwrap(), "farm-op");
    }

    #[test]
    fn test_set_and_get_config_value() {
        let manager = create_test_manager();

        manager
            .set_config_value(config_keys::NOTES_MAX_LEN, "200")
            .unwrap();
        assert_eq!(manager.get_notes_max_len().unwrap(), 200);

        // UPSERT 覆盖
        manager
            .set_config_value(config_keys::NOTES_MAX_LEN, "300")
            .unwrap();
        assert_eq!(manager.get_notes_max_len().unwrap(), 300);
    }

    #[test]
    fn test_invalid_number_falls_back_to_default() {
        let manager = create_test_manager();

        manager
            .set_config_value(config_keys::NOTES_MAX_LEN, "abc")
            .unwrap();
        assert_eq!(manager.get_notes_max_len().unwrap(), 500);
    }
}
