//! 筛选会话
//!
//! 会话持有筛选设置、结果索引、歌单累加器和变更观察器，所有操作都通过它进行。
//! 两类事件驱动会话：用户操作（提交、停止、重置、导出）和变更批次。
//! 提交时先停止观察，完成全量筛选后再同步地重新开始观察，
//! 因此全量筛选与下一批变更之间不会交错。

use log::{debug, info, warn};
use utils_common::{FilterSettings, Item};

use crate::builder::{FileSaver, PlaylistBuilder};
use crate::config::HostMarkup;
use crate::dom::{DomElement, MutationBatch, Query};
use crate::error::{Result, ToolsError};
use crate::extractor::{extract, ExtractDefaults};
use crate::index::ResultIndex;
use crate::models::SessionStats;
use crate::playlist::PlaylistAccumulator;
use crate::predicate::{Clause, Predicate};
use crate::storage::{load_settings, save_settings, SettingsStore};
use crate::visibility::apply_visibility;
use crate::watcher::{classify, resolve_item, MutationWatcher, ObservationBackend, WatchState};

/// 单个条目的筛选结果
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemOutcome {
    pub item: Item,
    /// 第一个不满足的条件，通过时为 `None`
    pub failed: Option<Clause>,
    /// 是否修改了元素的可见性
    pub changed: bool,
}

impl ItemOutcome {
    pub fn passed(&self) -> bool {
        self.failed.is_none()
    }
}

pub struct FilterSession<B: ObservationBackend> {
    root: B::Element,
    markup: HostMarkup,
    defaults: ExtractDefaults,
    settings: FilterSettings,
    predicate: Predicate,
    index: ResultIndex,
    playlist: PlaylistAccumulator,
    watcher: MutationWatcher<B>,
    store: Box<dyn SettingsStore>,
    stats: SessionStats,
}

impl<B: ObservationBackend> FilterSession<B> {
    /// 创建会话，设置从存储中读取
    pub fn new(root: B::Element, backend: B, store: Box<dyn SettingsStore>, markup: HostMarkup) -> Self {
        let settings = load_settings(store.as_ref());
        Self {
            root,
            markup,
            defaults: ExtractDefaults::default(),
            predicate: Predicate::new(&settings),
            settings,
            index: ResultIndex::new(),
            playlist: PlaylistAccumulator::new(),
            watcher: MutationWatcher::new(backend),
            store,
            stats: SessionStats::default(),
        }
    }

    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    pub fn markup(&self) -> &HostMarkup {
        &self.markup
    }

    pub fn index(&self) -> &ResultIndex {
        &self.index
    }

    pub fn playlist(&self) -> &PlaylistAccumulator {
        &self.playlist
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn watch_state(&self) -> WatchState {
        self.watcher.state()
    }

    pub fn is_armed(&self) -> bool {
        self.watcher.is_armed()
    }

    pub fn watcher(&self) -> &MutationWatcher<B> {
        &self.watcher
    }

    /// 提交新设置：全量筛选、保存设置、重新开始观察
    pub fn submit(&mut self, settings: FilterSettings) -> Result<Vec<ItemOutcome>> {
        settings.validate().map_err(ToolsError::InvalidSettings)?;

        self.watcher.disarm();
        self.predicate = Predicate::new(&settings);
        self.settings = settings;

        let outcomes = self.sweep();

        if let Err(e) = save_settings(self.store.as_mut(), &self.settings) {
            warn!("保存筛选设置失败: {}", e);
        }

        self.watcher.arm(&self.root)?;
        Ok(outcomes)
    }

    /// 停止观察，已排队的批次之后都会被丢弃
    pub fn stop(&mut self) {
        self.watcher.disarm();
    }

    /// 恢复默认设置并重新筛选
    pub fn reset(&mut self) -> Result<Vec<ItemOutcome>> {
        self.watcher.disarm();
        self.index.clear();
        self.playlist.clear();
        info!("筛选设置已重置");
        self.submit(FilterSettings::default())
    }

    /// 对当前已渲染的全部条目执行一次筛选，并按当前设置重建歌单
    pub fn sweep(&mut self) -> Vec<ItemOutcome> {
        self.stats.sweeps += 1;
        self.playlist.clear();

        let rendered = self.root.query_all(&Query::ClassExcept {
            class: &self.markup.item_class,
            except: &self.markup.pending_class,
        });
        let outcomes: Vec<ItemOutcome> = rendered.iter().map(|element| self.process_item(element)).collect();

        self.rebuild_playlist();

        let passed = outcomes.iter().filter(|o| o.passed()).count();
        info!(
            "全量筛选完成，条目数量: {}，通过: {}，索引大小: {}",
            outcomes.len(),
            passed,
            self.index.len()
        );
        outcomes
    }

    /// 处理一批变更记录，返回重新筛选的条目数
    pub fn handle_mutations(&mut self, batch: MutationBatch<B::Element>) -> usize {
        if !self.watcher.admits(batch.epoch) {
            self.stats.dropped_batches += 1;
            debug!("丢弃过期的变更批次，周期 {}", batch.epoch);
            return 0;
        }

        let mut runs = 0;
        for record in &batch.records {
            let Some(transition) = classify(record, &self.markup) else {
                continue;
            };
            let Some(element) = resolve_item(&record.target, &self.markup) else {
                self.stats.skipped_records += 1;
                debug!("无法定位变更记录所属的条目，跳过");
                continue;
            };

            let outcome = self.process_item(&element);
            self.stats.item_runs += 1;
            runs += 1;
            debug!("{:?}: 条目 {:?} 重新筛选，通过: {}", transition, outcome.item.id, outcome.passed());
        }
        runs
    }

    /// 导出歌单；歌单为空时不生成文件，返回 `None`
    pub fn export(
        &mut self,
        saver: &mut dyn FileSaver,
        image: Option<String>,
        clear: bool,
    ) -> Result<Option<String>> {
        if self.playlist.is_empty() {
            info!("歌单为空，没有可导出的内容");
            return Ok(None);
        }

        let mut builder = PlaylistBuilder::new()
            .title(self.settings.playlist_title())
            .image(image);
        for hash in self.playlist.snapshot() {
            builder.add_song(hash);
        }

        let file_name = builder.save_with(saver)?;
        if clear {
            self.playlist.clear();
        }
        Ok(Some(file_name))
    }

    // 单条目流程：提取、判断、设置可见性、更新索引和歌单
    fn process_item(&mut self, element: &B::Element) -> ItemOutcome {
        let item = extract(element, &self.markup, &self.defaults);
        let failed = self.predicate.failed_clause(&item);
        let passed = failed.is_none();

        let changed = apply_visibility(element, passed).unwrap_or_else(|e| {
            warn!("无法设置条目 {:?} 的可见性: {}", item.id, e);
            false
        });

        if let Some(hash) = &item.hash {
            if passed && self.settings.make_playlist {
                self.playlist.record(hash);
            } else {
                self.playlist.discard(hash);
            }
        }

        if let Some(id) = &item.id {
            self.index.upsert(id.clone(), item.clone());
        }

        debug!("条目 {:?} 通过: {}，未满足: {:?}", item.id, passed, failed);
        ItemOutcome { item, failed, changed }
    }

    // 用当前设置重新评估索引中的全部条目，包括已不在页面上的条目
    fn rebuild_playlist(&mut self) {
        if !self.settings.make_playlist {
            return;
        }
        for (_, item) in self.index.iter() {
            if let Some(hash) = &item.hash {
                if self.predicate.passes(item) {
                    self.playlist.record(hash);
                }
            }
        }
    }
}
