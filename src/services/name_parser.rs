//! 姓名拆分 - 业务能力层
//!
//! 确定性启发式：纯函数，无 I/O，不做大小写或变音符号归一化

/// 后缀集合：出现在末尾且至少有 3 个词时，并入前一个词作为姓
const SUFFIXES: [&str; 11] = [
    "jr", "jr.", "sr", "sr.", "ii", "iii", "iv", "v", "vi", "vii", "viii",
];

/// 姓氏前置小词集合（de la Rosa / van der 之类）
const PARTICLES: [&str; 15] = [
    "de", "la", "del", "di", "da", "el", "al", "van", "von", "bin", "ben", "le", "du", "dos",
    "das",
];

/// 拆分结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitName {
    pub first_name: String,
    pub last_name: String,
}

/// 把自由文本的全名拆成名 / 姓
///
/// 规则：
/// - 按空白切词；零词 → 两者皆空；一词 → 只有名
/// - 第一个词永远是名（中间名/缩写直接丢弃）
/// - 词数 ≥ 3 且末词命中后缀集合 → 后缀并入前一个词作为姓
/// - 否则从末词向前吸收连续的姓氏小词，最多吸收到下标 1，
///   保证 ≥ 2 词时名字永不为空
/// - 连字符词视为整体，不再拆分
pub fn parse(full_name: &str) -> SplitName {
    let tokens: Vec<&str> = full_name.split_whitespace().collect();

    match tokens.len() {
        0 => SplitName {
            first_name: String::new(),
            last_name: String::new(),
        },
        1 => SplitName {
            first_name: tokens[0].to_string(),
            last_name: String::new(),
        },
        n => {
            let first_name = tokens[0].to_string();

            let last_start = if n >= 3 && is_suffix(tokens[n - 1]) {
                // 后缀并入紧邻的前一个词
                n - 2
            } else {
                // 向前吸收姓氏小词，绝不越过下标 1
                let mut start = n - 1;
                while start > 1 && is_particle(tokens[start - 1]) {
                    start -= 1;
                }
                start
            };

            SplitName {
                first_name,
                last_name: tokens[last_start..].join(" "),
            }
        }
    }
}

fn is_suffix(token: &str) -> bool {
    SUFFIXES.contains(&token.to_lowercase().as_str())
}

fn is_particle(token: &str) -> bool {
    PARTICLES.contains(&token.to_lowercase().as_str())
}
