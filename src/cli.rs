//! 命令行参数
//!
//! 只负责解析与覆盖 Config，不含任何业务逻辑

use crate::config::{Config, Profile};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "contractor_onboard_submit",
    version,
    about = "按表格行批量提交承包商入职表单，并核验完成状态"
)]
pub struct Cli {
    /// 起始行（默认从档案的数据起始行开始）
    #[arg(long)]
    pub start_row: Option<u32>,

    /// 结束行（默认依赖连续空行停止条件）
    #[arg(long)]
    pub end_row: Option<u32>,

    /// 只处理这一行
    #[arg(long, conflicts_with_all = ["start_row", "end_row"])]
    pub row: Option<u32>,

    /// 演练模式：读取和解析照常，跳过所有变更性步骤
    #[arg(long)]
    pub dry_run: bool,

    /// 禁用行缓存（每行都回读表格，更慢但结果一致）
    #[arg(long)]
    pub no_cache: bool,

    /// 启动时清空当前档案的缓存（用于破坏性重跑）
    #[arg(long)]
    pub reset_cache: bool,

    /// 只核验已完成的行，不做任何提交
    #[arg(long)]
    pub verify_only: bool,

    /// 激活的配置档案
    #[arg(long, value_enum, default_value_t = Profile::Main)]
    pub profile: Profile,
}

impl Cli {
    /// 把命令行参数覆盖到配置上
    pub fn apply(self, config: &mut Config) {
        if let Some(row) = self.row {
            config.start_row = Some(row);
            config.end_row = Some(row);
        } else {
            if self.start_row.is_some() {
                config.start_row = self.start_row;
            }
            if self.end_row.is_some() {
                config.end_row = self.end_row;
            }
        }
        config.dry_run = self.dry_run;
        config.cache_enabled = !self.no_cache;
        config.reset_cache = self.reset_cache;
        config.verify_only = self.verify_only;
        config.profile = self.profile;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_row_sets_both_bounds() {
        let cli = Cli::parse_from(["app", "--row", "7"]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.start_row, Some(7));
        assert_eq!(config.end_row, Some(7));
    }

    #[test]
    fn no_cache_disables_cache() {
        let cli = Cli::parse_from(["app", "--no-cache", "--profile", "sandbox"]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert!(!config.cache_enabled);
        assert_eq!(config.profile, Profile::Sandbox);
    }

    #[test]
    fn row_conflicts_with_range() {
        assert!(Cli::try_parse_from(["app", "--row", "3", "--start-row", "2"]).is_err());
    }
}
