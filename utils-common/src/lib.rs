pub mod models;
pub mod time;

// 重新导出常用类型和函数，方便直接使用
pub use models::{Difficulty, DifficultyFlags, FilterSettings, Item, MAX_RATING, MAX_SAFE_INTEGER};
pub use time::{format_seconds, normalize_time, parse_clock_bound, parse_time_to_seconds, ClockTime};
