use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 时钟字符串的分量个数（时、分、秒）
const CLOCK_PARTS: usize = 3;

/// 将 `HH:MM:SS` 格式的时间转换为秒数
///
/// 只接受恰好三个数字分量的规范格式；任何分量无法解析时返回 `None`。
pub fn parse_time_to_seconds(time: &str) -> Option<u32> {
    let parts = split_numeric_parts(time)?;
    if parts.len() != CLOCK_PARTS {
        return None;
    }

    parts[0]
        .checked_mul(3600)?
        .checked_add(parts[1].checked_mul(60)?)?
        .checked_add(parts[2])
}

/// 将不完整的时间字符串补齐为 `HH:MM:SS`
///
/// 分量从右往左填充：`"05"` 变为 `00:00:05`，`"3:45"` 变为 `00:03:45`。
/// 多于三个分量或包含非数字内容时返回 `None`。
pub fn normalize_time(partial: &str) -> Option<String> {
    let parts = split_numeric_parts(partial)?;
    if parts.is_empty() || parts.len() > CLOCK_PARTS {
        return None;
    }

    let mut padded = vec![0u32; CLOCK_PARTS - parts.len()];
    padded.extend(parts);
    Some(format!("{:02}:{:02}:{:02}", padded[0], padded[1], padded[2]))
}

/// 读取设置中的时长上下限
///
/// 分量从左往右依次是时、分、秒，缺少的尾部分量按 0 处理：
/// `"01:30"` 表示一个半小时。与条目标签的补齐方向相反。
pub fn parse_clock_bound(text: &str) -> Option<u32> {
    let mut parts = split_numeric_parts(text)?;
    if parts.is_empty() || parts.len() > CLOCK_PARTS {
        return None;
    }

    parts.resize(CLOCK_PARTS, 0);
    parts[0]
        .checked_mul(3600)?
        .checked_add(parts[1].checked_mul(60)?)?
        .checked_add(parts[2])
}

/// 把秒数格式化为 `HH:MM:SS`
pub fn format_seconds(total: u32) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

// 拆分冒号分隔的数字分量，空分量视为无效
fn split_numeric_parts(text: &str) -> Option<Vec<u32>> {
    text.trim()
        .split(':')
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                None
            } else {
                part.parse::<u32>().ok()
            }
        })
        .collect()
}

/// 时钟时长 - 以秒存储，序列化时总是输出规范的 `HH:MM:SS`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u32);

impl ClockTime {
    /// 从秒数创建
    pub const fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    /// 总秒数
    pub const fn seconds(self) -> u32 {
        self.0
    }
}

impl FromStr for ClockTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_clock_bound(s)
            .map(ClockTime)
            .ok_or_else(|| format!("无效的时间格式: '{}'", s))
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_seconds(self.0))
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
