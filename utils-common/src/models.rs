use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::time::ClockTime;

/// JS `Number.MAX_SAFE_INTEGER`，表单中“最大踩数”的默认上限
pub const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

/// 评分的合法上限（百分比）
pub const MAX_RATING: u64 = 100;

/// 难度分类 - 序列化名称即宿主页面上的标签类名
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Difficulty {
    #[serde(rename = "is-easy")]
    Easy,
    #[serde(rename = "is-dark")]
    Normal,
    #[serde(rename = "is-hard")]
    Hard,
    #[serde(rename = "is-expert")]
    Expert,
    #[serde(rename = "is-expert-plus")]
    ExpertPlus,
}

impl Difficulty {
    /// 所有难度，按页面显示顺序
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Expert,
        Difficulty::ExpertPlus,
    ];

    /// 宿主页面上标记该难度的类名
    pub fn class_name(self) -> &'static str {
        match self {
            Difficulty::Easy => "is-easy",
            Difficulty::Normal => "is-dark",
            Difficulty::Hard => "is-hard",
            Difficulty::Expert => "is-expert",
            Difficulty::ExpertPlus => "is-expert-plus",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
            Difficulty::Expert => "Expert",
            Difficulty::ExpertPlus => "Expert+",
        }
    }
}

/// 难度开关 - 每个难度一个布尔值，与表单复选框一一对应
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct DifficultyFlags {
    #[serde(rename = "is-easy")]
    pub easy: bool,
    #[serde(rename = "is-dark")]
    pub normal: bool,
    #[serde(rename = "is-hard")]
    pub hard: bool,
    #[serde(rename = "is-expert")]
    pub expert: bool,
    #[serde(rename = "is-expert-plus")]
    pub expert_plus: bool,
}

impl DifficultyFlags {
    /// 全部关闭
    pub fn none() -> Self {
        Self {
            easy: false,
            normal: false,
            hard: false,
            expert: false,
            expert_plus: false,
        }
    }

    pub fn is_enabled(&self, difficulty: Difficulty) -> bool {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Normal => self.normal,
            Difficulty::Hard => self.hard,
            Difficulty::Expert => self.expert,
            Difficulty::ExpertPlus => self.expert_plus,
        }
    }

    pub fn set(&mut self, difficulty: Difficulty, enabled: bool) {
        let flag = match difficulty {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Normal => &mut self.normal,
            Difficulty::Hard => &mut self.hard,
            Difficulty::Expert => &mut self.expert,
            Difficulty::ExpertPlus => &mut self.expert_plus,
        };
        *flag = enabled;
    }

    /// 已启用的难度列表
    pub fn enabled(&self) -> Vec<Difficulty> {
        Difficulty::ALL
            .into_iter()
            .filter(|d| self.is_enabled(*d))
            .collect()
    }
}

impl Default for DifficultyFlags {
    fn default() -> Self {
        Self {
            easy: true,
            normal: true,
            hard: true,
            expert: true,
            expert_plus: true,
        }
    }
}

/// 筛选设置 - 每次提交表单时生成，提交后不可变
///
/// JSON 字段名与表单保持一致，缺失的字段取默认值，
/// 因此旧版本保存的设置也能直接读取。
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSettings {
    /// 最少点赞数
    pub min_upvotes: u64,
    /// 最多踩数
    pub max_downvotes: u64,
    /// 最少下载数
    pub min_downloads: u64,
    /// 最低评分 (0-100)
    pub min_rating: u64,
    /// 最短时长
    pub min_duration: ClockTime,
    /// 最长时长
    pub max_duration: ClockTime,
    /// 难度开关
    #[serde(flatten)]
    pub difficulties: DifficultyFlags,
    /// 排除的谱师，逗号分隔，不区分大小写
    pub excluded_mappers: String,
    /// 是否生成歌单
    pub make_playlist: bool,
    /// 歌单名称
    pub playlist_name: String,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            min_upvotes: 0,
            max_downvotes: MAX_SAFE_INTEGER,
            min_downloads: 0,
            min_rating: 0,
            min_duration: ClockTime::from_seconds(0),
            max_duration: ClockTime::from_seconds(86_399),
            difficulties: DifficultyFlags::default(),
            excluded_mappers: String::new(),
            make_playlist: false,
            playlist_name: String::new(),
        }
    }
}

impl FilterSettings {
    /// 校验表单约束，目前只有评分范围
    pub fn validate(&self) -> Result<(), String> {
        if self.min_rating > MAX_RATING {
            return Err(format!(
                "最低评分必须在 0 到 {} 之间，当前为 {}",
                MAX_RATING, self.min_rating
            ));
        }
        Ok(())
    }

    /// 排除的谱师集合（小写、去空白、忽略空项）
    pub fn excluded_mapper_set(&self) -> HashSet<String> {
        self.excluded_mappers
            .split(',')
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// 歌单名称，为空时返回 `None`
    pub fn playlist_title(&self) -> Option<&str> {
        let name = self.playlist_name.trim();
        (!name.is_empty()).then_some(name)
    }
}

/// 谱面条目 - 每次从页面元素提取时生成的只读快照
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// 元素上的稳定标识；缺失时退回到内容哈希
    pub id: Option<String>,
    /// 封面图片中编码的内容哈希，加载中时为 `None`
    pub hash: Option<String>,
    pub upvotes: u64,
    pub downvotes: u64,
    pub downloads: u64,
    pub rating: u64,
    /// 时长（秒）
    pub duration: u32,
    /// 谱师名（小写）
    pub author: String,
    /// 元素上出现的难度标签
    pub difficulties: BTreeSet<Difficulty>,
}
