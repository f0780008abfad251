//! Beatsaver 搜索结果的实时筛选引擎
//!
//! 从页面元素中提取谱面属性，按筛选设置决定条目是否可见，
//! 观察宿主页面的懒加载变化并只重新筛选受影响的条目，
//! 同时累积通过筛选的谱面用于导出歌单。

// 导出模块
pub mod builder;
pub mod config;
pub mod dom;
pub mod error;
pub mod extractor;
pub mod index;
pub mod models;
pub mod playlist;
pub mod predicate;
pub mod session;
pub mod storage;
pub mod visibility;
pub mod watcher;

#[cfg(target_arch = "wasm32")]
mod logger;
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(all(feature = "wee_alloc", target_arch = "wasm32"))]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

pub use builder::{FileSaver, PlaylistBuilder};
pub use config::HostMarkup;
pub use dom::{DomElement, MutationBatch, MutationRecord, Query};
pub use error::{Result, ToolsError};
pub use extractor::{extract, ExtractDefaults};
pub use index::ResultIndex;
pub use models::{PlaylistDocument, SessionStats, Song};
pub use playlist::PlaylistAccumulator;
pub use predicate::{failed_clause, passes, Clause, Predicate};
pub use session::{FilterSession, ItemOutcome};
pub use storage::{load_settings, save_settings, SettingsStore, FILTERS_KEY};
pub use visibility::apply_visibility;
pub use watcher::{MutationWatcher, ObservationBackend, WatchState};
