use serde::{Deserialize, Serialize};

/// 歌单作者字段的固定值
pub const PLAYLIST_AUTHOR: &str = "Beatsaver Tools";

/// 未命名歌单的默认标题
pub const DEFAULT_PLAYLIST_TITLE: &str = "Beatsaver Tools playlist";

/// 歌单中的一首歌
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Song {
    pub hash: String,
}

/// 导出的歌单文件内容
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDocument {
    /// 歌单标题
    pub playlist_title: String,
    /// 歌单作者，固定为 [`PLAYLIST_AUTHOR`]
    pub playlist_author: String,
    /// 歌单描述，包含生成时间
    pub playlist_description: String,
    /// 歌单封面引用
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image: Option<String>,
    /// 歌曲列表，顺序即加入顺序
    pub songs: Vec<Song>,
}

/// 会话统计
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// 全量筛选次数
    pub sweeps: usize,
    /// 单条目重新筛选次数
    pub item_runs: usize,
    /// 因无法定位条目而跳过的变更记录数
    pub skipped_records: usize,
    /// 观察器停止后丢弃的批次数
    pub dropped_batches: usize,
}
