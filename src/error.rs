use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 会话/浏览器相关错误（启动前致命）
    Session(SessionError),
    /// 单元格寻址与读写错误
    Cell(CellError),
    /// 提交流程步骤错误
    Step(StepError),
    /// 缓存存取错误
    Cache(CacheError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Session(e) => write!(f, "会话错误: {}", e),
            AppError::Cell(e) => write!(f, "单元格错误: {}", e),
            AppError::Step(e) => write!(f, "步骤错误: {}", e),
            AppError::Cache(e) => write!(f, "缓存错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Session(e) => Some(e),
            AppError::Cell(e) => Some(e),
            AppError::Step(e) => Some(e),
            AppError::Cache(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 会话/浏览器相关错误
///
/// 这一类错误发生在行循环开始之前，直接终止整个运行
#[derive(Debug)]
pub enum SessionError {
    /// 连接浏览器失败
    ConnectionFailed {
        port: u16,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 按 URL 片段找不到目标标签页
    ViewNotFound { url_fragment: String },
    /// 标签页置前失败
    BringToFrontFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::ConnectionFailed { port, source } => {
                write!(f, "无法连接到浏览器 (端口: {}): {}", port, source)
            }
            SessionError::ViewNotFound { url_fragment } => {
                write!(f, "找不到 URL 包含 '{}' 的标签页", url_fragment)
            }
            SessionError::BringToFrontFailed { source } => {
                write!(f, "标签页置前失败: {}", source)
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::ConnectionFailed { source, .. }
            | SessionError::BringToFrontFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            SessionError::ViewNotFound { .. } => None,
        }
    }
}

/// 单元格寻址与读写错误
#[derive(Debug)]
pub enum CellError {
    /// 导航后焦点地址与请求地址不符（重试一次后仍不符）
    AddressMismatch { requested: String, actual: String },
    /// 编辑表面缺少必需元素（名称框 / 公式栏）
    SurfaceElementMissing { what: String },
    /// 单元格导航失败
    NavigationFailed {
        address: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellError::AddressMismatch { requested, actual } => {
                write!(f, "单元格寻址不符: 请求 {}，实际 {}", requested, actual)
            }
            CellError::SurfaceElementMissing { what } => {
                write!(f, "编辑表面缺少元素: {}", what)
            }
            CellError::NavigationFailed { address, source } => {
                write!(f, "导航到单元格 {} 失败: {}", address, source)
            }
        }
    }
}

impl std::error::Error for CellError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CellError::NavigationFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 提交流程步骤错误
///
/// 任一步骤出错即中止该行剩余步骤，由编排层捕获上报，不在本次运行内重试
#[derive(Debug)]
pub enum StepError {
    /// 页面在超时内未达到就绪状态
    NotReady { step: &'static str, waited_secs: u64 },
    /// 找不到提交控件（按文本与兜底角色都未命中）
    ControlNotFound {
        step: &'static str,
        wanted: String,
    },
    /// 找不到必需的输入字段
    FieldMissing {
        step: &'static str,
        field: String,
    },
    /// 表单既没有分离式日期输入，也没有合并式日期输入
    DateInputsMissing { step: &'static str },
    /// 与页面交互失败
    Interaction {
        step: &'static str,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StepError {
    pub fn step(&self) -> &'static str {
        match self {
            StepError::NotReady { step, .. }
            | StepError::ControlNotFound { step, .. }
            | StepError::FieldMissing { step, .. }
            | StepError::DateInputsMissing { step }
            | StepError::Interaction { step, .. } => step,
        }
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepError::NotReady { step, waited_secs } => {
                write!(f, "步骤 {} 页面 {} 秒内未就绪", step, waited_secs)
            }
            StepError::ControlNotFound { step, wanted } => {
                write!(f, "步骤 {} 找不到提交控件 (期望文本: {})", step, wanted)
            }
            StepError::FieldMissing { step, field } => {
                write!(f, "步骤 {} 找不到输入字段: {}", step, field)
            }
            StepError::DateInputsMissing { step } => {
                write!(f, "步骤 {} 找不到任何日期输入", step)
            }
            StepError::Interaction { step, source } => {
                write!(f, "步骤 {} 页面交互失败: {}", step, source)
            }
        }
    }
}

impl std::error::Error for StepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StepError::Interaction { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 缓存存取错误
///
/// 注意：缓存文件缺失或损坏不会产生此错误（按空缓存处理），
/// 只有持久化写入失败才会上报
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("缓存持久化失败 ({path}): {source}")]
    PersistFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("缓存序列化失败: {source}")]
    SerializeFailed {
        #[source]
        source: serde_json::Error,
    },
}

// ========== 从常见错误类型转换 ==========
// anyhow 已为所有实现 std::error::Error 的类型提供自动转换，
// 这里只保留跨层包装需要的 From

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Other(format!("CDP 错误: {}", err))
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session(err)
    }
}

impl From<CellError> for AppError {
    fn from(err: CellError) -> Self {
        AppError::Cell(err)
    }
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        AppError::Cache(err)
    }
}

impl From<StepError> for AppError {
    fn from(err: StepError) -> Self {
        AppError::Step(err)
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
