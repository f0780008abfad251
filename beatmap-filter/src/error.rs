//! 筛选引擎的错误类型
//!
//! 引擎内部的解析失败一律降级为默认值，不会出现在这里；
//! 这里只包含需要交给调用方处理的错误：设置校验、存储、导出和 DOM 写入。

use std::io;
use thiserror::Error;

/// 筛选引擎对外暴露的错误
#[derive(Debug, Error)]
pub enum ToolsError {
    /// 提交的设置不满足表单约束
    #[error("无效的筛选设置: {0}")]
    InvalidSettings(String),

    /// JSON 序列化或反序列化失败
    #[error("序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 设置存储读写失败
    #[error("存储失败: {0}")]
    Storage(String),

    /// 对页面元素的写入失败
    #[error("DOM 操作失败: {0}")]
    Dom(String),

    /// 歌单导出失败
    #[error("导出失败: {0}")]
    Export(String),

    /// 文件读写失败
    #[error("I/O 错误: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ToolsError>;
