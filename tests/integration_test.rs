//! 真实浏览器集成测试
//!
//! 需要本机以调试端口启动 Chrome，并且已手动打开表格和门户标签页、
//! 完成登录。默认全部忽略，手动运行：cargo test -- --ignored

use contractor_onboard_submit::browser::{connect_to_browser, find_page_by_url};
use contractor_onboard_submit::config::Config;
use contractor_onboard_submit::infrastructure::{JsExecutor, TokioClock};
use contractor_onboard_submit::services::{CellIo, SheetSurface};
use contractor_onboard_submit::utils;
use std::sync::Arc;

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_read_single_cell() {
    utils::logging::init();

    let config = Config::from_env();
    let settings = config.profile.builtin_settings();

    let browser = connect_to_browser(config.browser_debug_port)
        .await
        .expect("连接浏览器失败");
    let page = find_page_by_url(&browser, &settings.sheet_url_fragment)
        .await
        .expect("未找到表格标签页");

    let clock = Arc::new(TokioClock::new());
    let surface = SheetSurface::new(JsExecutor::new(page), clock.clone(), config.type_delay_ms);
    let cells = CellIo::new(Arc::new(surface), clock);

    let name = cells
        .read(&settings.name_col, settings.first_data_row)
        .await
        .expect("读取单元格失败");

    println!("首个数据行的姓名: {:?}", name);
}

#[tokio::test]
#[ignore] // 默认忽略：会真的写表格，只在沙箱档案上手动运行
async fn test_write_and_verify_cell() {
    utils::logging::init();

    let config = Config::from_env();
    let settings = config.profile.builtin_settings();

    let browser = connect_to_browser(config.browser_debug_port)
        .await
        .expect("连接浏览器失败");
    let page = find_page_by_url(&browser, &settings.sheet_url_fragment)
        .await
        .expect("未找到表格标签页");

    let clock = Arc::new(TokioClock::new());
    let surface = SheetSurface::new(JsExecutor::new(page), clock.clone(), config.type_delay_ms);
    let cells = CellIo::new(Arc::new(surface), clock);

    // 写到核验列一个不影响数据的临时值，再读回确认
    let outcome = cells
        .write(&settings.verify_col, settings.first_data_row, "test")
        .await
        .expect("写入单元格失败");
    println!("写入结果: {:?}", outcome);

    let back = cells
        .read(&settings.verify_col, settings.first_data_row)
        .await
        .expect("回读失败");
    assert_eq!(back.trim().to_lowercase(), "test");
}

#[tokio::test]
#[ignore] // 默认忽略：需要门户已登录
async fn test_portal_view_search() {
    use contractor_onboard_submit::services::{PortalStatusView, StatusView, ViewKind};

    utils::logging::init();

    let config = Config::from_env();
    let settings = config.profile.builtin_settings();

    let browser = connect_to_browser(config.browser_debug_port)
        .await
        .expect("连接浏览器失败");
    let page = find_page_by_url(&browser, &settings.portal_url_fragment)
        .await
        .expect("未找到门户标签页");

    let clock = Arc::new(TokioClock::new());
    let view = PortalStatusView::new(
        JsExecutor::new(page),
        clock,
        ViewKind::Roster,
        settings.roster_view_url.clone(),
        config.settle_ms,
        config.dom_idle_cap_secs,
    );

    // 注意：请根据实际情况修改搜索的姓名
    let hit = view.search("Caden Lepple").await.expect("视图搜索失败");
    println!("花名册搜索结果: {:?}", hit);
}
