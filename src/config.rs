//! 程序配置
//!
//! Config 提供默认值 + 环境变量覆盖，CLI 参数在 main 中再做一层覆盖；
//! Profile 是一组固定命名的表格/门户配置，可被 profiles.toml 覆盖

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// 激活的配置档案（固定集合，互不共享缓存命名空间）
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Profile {
    /// 当年主表
    Main,
    /// 历史补录表
    Backfill,
    /// 演练用沙箱表
    Sandbox,
}

impl Profile {
    /// 缓存命名空间键（也是 profiles.toml 中的段名）
    pub fn key(&self) -> &'static str {
        match self {
            Profile::Main => "main",
            Profile::Backfill => "backfill",
            Profile::Sandbox => "sandbox",
        }
    }

    /// 内置默认档案设置
    pub fn builtin_settings(&self) -> ProfileSettings {
        let base = ProfileSettings {
            sheet_url_fragment: "docs.google.com/spreadsheets".to_string(),
            portal_url_fragment: "app.payroll-portal.com".to_string(),
            form_url: "https://app.payroll-portal.com/contractors/new".to_string(),
            onboarding_view_url: "https://app.payroll-portal.com/people/onboarding".to_string(),
            roster_view_url: "https://app.payroll-portal.com/people/roster".to_string(),
            name_col: "A".to_string(),
            email_col: "B".to_string(),
            status_col: "C".to_string(),
            verify_col: "D".to_string(),
            done_marker: "sent".to_string(),
            first_data_row: 2,
        };
        match self {
            Profile::Main => base,
            Profile::Backfill => ProfileSettings {
                status_col: "E".to_string(),
                verify_col: "F".to_string(),
                ..base
            },
            Profile::Sandbox => ProfileSettings {
                done_marker: "test-sent".to_string(),
                ..base
            },
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// 单个档案的表格列位 / 门户地址设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSettings {
    /// 表格标签页的 URL 片段（用于在浏览器中定位）
    pub sheet_url_fragment: String,
    /// 门户标签页的 URL 片段
    pub portal_url_fragment: String,
    /// 入职表单入口地址
    pub form_url: String,
    /// "入职进行中"视图地址
    pub onboarding_view_url: String,
    /// "花名册"视图地址
    pub roster_view_url: String,
    /// 姓名列
    pub name_col: String,
    /// 邮箱列
    pub email_col: String,
    /// 提交状态列
    pub status_col: String,
    /// 核验结果列
    pub verify_col: String,
    /// 状态列中表示"已完成"的标记（大小写不敏感比较）
    pub done_marker: String,
    /// 数据起始行（跳过表头）
    pub first_data_row: u32,
}

/// 加载档案设置：profiles.toml 存在且含对应段则覆盖内置默认
pub fn load_profile_settings(profile: Profile, path: &str) -> Result<ProfileSettings> {
    if !Path::new(path).exists() {
        return Ok(profile.builtin_settings());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取档案配置文件: {}", path))?;
    let mut all: HashMap<String, ProfileSettings> =
        toml::from_str(&content).with_context(|| format!("无法解析档案配置文件: {}", path))?;
    Ok(all
        .remove(profile.key())
        .unwrap_or_else(|| profile.builtin_settings()))
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 激活的档案
    pub profile: Profile,
    /// 档案配置文件路径
    pub profiles_file: String,
    /// 起始行（None 时用档案的 first_data_row）
    pub start_row: Option<u32>,
    /// 结束行（None 时依赖连续空行停止条件）
    pub end_row: Option<u32>,
    /// 演练模式：跳过所有变更性步骤
    pub dry_run: bool,
    /// 是否启用行缓存
    pub cache_enabled: bool,
    /// 缓存文件路径
    pub cache_file: String,
    /// 启动时清空当前档案的缓存
    pub reset_cache: bool,
    /// 只做核验，不做提交
    pub verify_only: bool,
    /// 对已完成的行是否补做核验
    pub verify_completed: bool,
    /// 连续空行达到此数即停止
    pub empty_row_stop: usize,
    /// 两次成功提交之间的间隔（秒）
    pub submit_delay_secs: u64,
    /// 每 N 次提交后插入长暂停
    pub long_pause_every: usize,
    /// 长暂停时长（秒）
    pub long_pause_secs: u64,
    /// 每步页面就绪等待超时（秒）
    pub ready_timeout_secs: u64,
    /// DOM 静默窗口（毫秒）
    pub settle_ms: u64,
    /// DOM 静默等待总上限（秒）
    pub dom_idle_cap_secs: u64,
    /// 逐字符输入间隔（毫秒）
    pub type_delay_ms: u64,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            profile: Profile::Main,
            profiles_file: "profiles.toml".to_string(),
            start_row: None,
            end_row: None,
            dry_run: false,
            cache_enabled: true,
            cache_file: "onboard_cache.json".to_string(),
            reset_cache: false,
            verify_only: false,
            verify_completed: true,
            empty_row_stop: 3,
            submit_delay_secs: 20,
            long_pause_every: 10,
            long_pause_secs: 120,
            ready_timeout_secs: 20,
            settle_ms: 300,
            dom_idle_cap_secs: 8,
            type_delay_ms: 30,
            output_log_file: "output.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.browser_debug_port),
            profiles_file: std::env::var("PROFILES_FILE").unwrap_or(default.profiles_file),
            cache_file: std::env::var("CACHE_FILE").unwrap_or(default.cache_file),
            empty_row_stop: std::env::var("EMPTY_ROW_STOP").ok().and_then(|v| v.parse().ok()).unwrap_or(default.empty_row_stop),
            submit_delay_secs: std::env::var("SUBMIT_DELAY_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.submit_delay_secs),
            long_pause_every: std::env::var("LONG_PAUSE_EVERY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.long_pause_every),
            long_pause_secs: std::env::var("LONG_PAUSE_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.long_pause_secs),
            ready_timeout_secs: std::env::var("READY_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.ready_timeout_secs),
            settle_ms: std::env::var("SETTLE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.settle_ms),
            dom_idle_cap_secs: std::env::var("DOM_IDLE_CAP_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.dom_idle_cap_secs),
            type_delay_ms: std::env::var("TYPE_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.type_delay_ms),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            ..Self::default()
        }
    }
}
