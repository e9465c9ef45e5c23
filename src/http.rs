use once_cell::sync::Lazy;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::AppError;

/// 按 timeout 维度复用的字体下载 Client（共享连接池/Keep-Alive）。
static FONT_CLIENTS: Lazy<Mutex<HashMap<Duration, Client>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

const USER_AGENT: &str = concat!("og-backend/", env!("CARGO_PKG_VERSION"));

/// 获取指定超时的 Client；`Client` 内部为 Arc，克隆开销很小。
pub fn client_with_timeout(timeout: Duration) -> Result<Client, AppError> {
    let mut clients = FONT_CLIENTS
        .lock()
        .map_err(|_| AppError::Internal("HTTP client 池锁已中毒".to_string()))?;
    if let Some(client) = clients.get(&timeout) {
        return Ok(client.clone());
    }
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| AppError::Internal(format!("构建 HTTP client 失败: {e}")))?;
    clients.insert(timeout, client.clone());
    Ok(client)
}
