use chrono::{DateTime, Utc};
use log::info;
use std::fs::File;
use std::io::Write;

use crate::error::{Result, ToolsError};
use crate::models::{PlaylistDocument, Song, DEFAULT_PLAYLIST_TITLE, PLAYLIST_AUTHOR};

/// 歌单文件扩展名
pub const PLAYLIST_EXTENSION: &str = "bplist";

/// 保存文件的外部协作者，浏览器中由 FileSaver 脚本实现
pub trait FileSaver {
    fn save(&mut self, bytes: &[u8], file_name: &str) -> Result<()>;
}

/// 歌单构建器
pub struct PlaylistBuilder {
    title: Option<String>,
    image: Option<String>,
    generated_at: DateTime<Utc>,
    songs: Vec<String>,
}

impl PlaylistBuilder {
    /// 创建新的歌单构建器，生成时间取当前时间
    pub fn new() -> Self {
        Self {
            title: None,
            image: None,
            generated_at: Utc::now(),
            songs: Vec::new(),
        }
    }

    pub fn title(mut self, title: Option<&str>) -> Self {
        self.title = title.map(str::to_string);
        self
    }

    pub fn image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    pub fn generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// 添加歌曲，调用方负责去重
    pub fn add_song(&mut self, hash: impl Into<String>) {
        self.songs.push(hash.into());
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// 构建歌单文档
    pub fn build_playlist(&self) -> Result<PlaylistDocument> {
        if self.songs.is_empty() {
            return Err(ToolsError::Export("歌单为空".to_string()));
        }

        Ok(PlaylistDocument {
            playlist_title: self
                .title
                .clone()
                .unwrap_or_else(|| DEFAULT_PLAYLIST_TITLE.to_string()),
            playlist_author: PLAYLIST_AUTHOR.to_string(),
            playlist_description: format!(
                "Generated by {} on {}",
                PLAYLIST_AUTHOR,
                self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            image: self.image.clone(),
            songs: self
                .songs
                .iter()
                .map(|hash| Song { hash: hash.clone() })
                .collect(),
        })
    }

    /// 序列化为 JSON 字节
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let playlist = self.build_playlist()?;
        Ok(serde_json::to_vec_pretty(&playlist)?)
    }

    /// 文件名：歌单名中的非法字符替换为 `_`
    pub fn file_name(&self) -> String {
        let stem: String = self
            .title
            .as_deref()
            .unwrap_or("beatsaver-tools")
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || matches!(c, '-' | '_' | ' ' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let stem = stem.trim().trim_matches('.');
        let stem = if stem.is_empty() { "beatsaver-tools" } else { stem };
        format!("{}.{}", stem, PLAYLIST_EXTENSION)
    }

    /// 交给外部协作者保存，返回文件名
    pub fn save_with(&self, saver: &mut dyn FileSaver) -> Result<String> {
        let bytes = self.to_bytes()?;
        let file_name = self.file_name();
        saver.save(&bytes, &file_name)?;
        info!("歌单已导出: {}，歌曲数量: {}", file_name, self.songs.len());
        Ok(file_name)
    }

    /// 保存歌单到文件
    pub fn save_playlist(&self, path: &str) -> Result<()> {
        let bytes = self.to_bytes()?;
        let mut file = File::create(path)?;
        file.write_all(&bytes)?;
        info!("歌单已写入文件: {}，大小: {} 字节", path, bytes.len());
        Ok(())
    }
}

impl Default for PlaylistBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemorySaver;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn builder() -> PlaylistBuilder {
        let mut builder = PlaylistBuilder::new()
            .title(Some("Hard maps"))
            .generated_at(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap());
        builder.add_song("a");
        builder.add_song("b");
        builder
    }

    #[test]
    fn test_build_playlist() {
        let playlist = builder().build_playlist().unwrap();
        assert_eq!(playlist.playlist_title, "Hard maps");
        assert_eq!(playlist.playlist_author, PLAYLIST_AUTHOR);
        assert!(playlist.playlist_description.contains("2024-03-01 12:30:00"));
        assert_eq!(playlist.songs.len(), 2);
        assert_eq!(playlist.songs[0].hash, "a");
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value = serde_json::from_slice(&builder().to_bytes().unwrap()).unwrap();
        assert_eq!(json["playlistTitle"], "Hard maps");
        assert_eq!(json["songs"][1]["hash"], "b");
        assert!(json.get("image").is_none());

        let with_image = builder().image(Some("data:image/png;base64,AAAA".to_string()));
        let json: serde_json::Value = serde_json::from_slice(&with_image.to_bytes().unwrap()).unwrap();
        assert_eq!(json["image"], "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_empty_playlist_is_an_error() {
        assert!(matches!(
            PlaylistBuilder::new().build_playlist(),
            Err(ToolsError::Export(_))
        ));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(builder().file_name(), "Hard maps.bplist");
        assert_eq!(PlaylistBuilder::new().file_name(), "beatsaver-tools.bplist");
        assert_eq!(
            PlaylistBuilder::new().title(Some("a/b:c")).file_name(),
            "a_b_c.bplist"
        );
    }

    #[test]
    fn test_save_with() {
        let mut saver = MemorySaver::default();
        let name = builder().save_with(&mut saver).unwrap();
        assert_eq!(name, "Hard maps.bplist");
        assert_eq!(saver.saved.len(), 1);
        assert_eq!(saver.saved[0].0, "Hard maps.bplist");
    }
}
