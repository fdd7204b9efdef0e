//! 浏览器会话接入
//!
//! 只接入已经在运行、已经登录好的浏览器（远程调试端口），
//! 不负责启动浏览器、不负责认证、不负责建新标签页

use crate::error::SessionError;
use anyhow::Result;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// 连接到调试端口上的浏览器
pub async fn connect_to_browser(port: u16) -> Result<Browser> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        SessionError::ConnectionFailed {
            port,
            source: Box::new(e),
        }
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    Ok(browser)
}

/// 按 URL 片段查找已打开的标签页
///
/// 找不到视为致命错误（启动前检查，什么都还没动）
pub async fn find_page_by_url(browser: &Browser, url_fragment: &str) -> Result<Page> {
    let pages = browser.pages().await?;
    debug!("获取到 {} 个页面，查找 URL 包含 '{}'", pages.len(), url_fragment);

    for p in pages.iter() {
        if let Ok(Some(url)) = p.url().await {
            debug!("检查页面 URL: {}", url);
            if url.contains(url_fragment) {
                info!("✓ 找到目标页面: {}", url);
                return Ok(p.clone());
            }
        }
    }

    Err(SessionError::ViewNotFound {
        url_fragment: url_fragment.to_string(),
    }
    .into())
}

/// 把标签页置于前台
///
/// 表格和门户共用一个浏览器窗口，每次读写前必须先置前，
/// 否则按键会落到错误的标签页上
pub async fn bring_to_front(page: &Page) -> Result<()> {
    page.bring_to_front()
        .await
        .map_err(|e| SessionError::BringToFrontFailed {
            source: Box::new(e),
        })?;
    Ok(())
}
