//! 变更观察器
//!
//! 观察器是一个显式持有的资源：`arm` 开始观察，`disarm` 停止，析构时自动停止。
//! 每次 `arm` 都会开启新的观察周期，平台实现把周期编号打在送达的批次上，
//! 只有与当前周期一致且处于观察状态的批次才会被处理。

use log::info;

use crate::config::HostMarkup;
use crate::dom::{DomElement, MutationRecord};
use crate::error::Result;

/// 需要观察的属性
pub const OBSERVED_ATTRIBUTES: [&str; 2] = ["class", "src"];

/// 平台的变更观察实现，浏览器中为 `MutationObserver`
pub trait ObservationBackend {
    type Element: DomElement;

    /// 观察 `root` 子树上指定属性的变化（需要旧值），送达的批次带上 `epoch`
    fn observe(&mut self, root: &Self::Element, attributes: &[&str], epoch: u64) -> Result<()>;

    /// 停止观察，丢弃尚未送达的记录
    fn disconnect(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchState {
    Disarmed,
    Armed { epoch: u64 },
}

/// 由 `class` 属性表达的渲染状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderState {
    NotRendered,
    Rendered,
}

impl RenderState {
    pub fn from_class(value: Option<&str>, pending_class: &str) -> Self {
        match value {
            Some(classes) if classes.split_whitespace().any(|c| c == pending_class) => {
                RenderState::NotRendered
            }
            _ => RenderState::Rendered,
        }
    }
}

/// 由封面 `src` 属性表达的加载状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageState {
    Loading,
    Loaded,
}

impl ImageState {
    pub fn from_src(value: Option<&str>, placeholder: &str) -> Self {
        match value {
            Some(src) if !src.is_empty() && (placeholder.is_empty() || !src.contains(placeholder)) => {
                ImageState::Loaded
            }
            _ => ImageState::Loading,
        }
    }
}

/// 值得重新筛选的状态转换
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// 条目从未渲染变为已渲染
    Rendered,
    /// 封面从占位图变为真实图片
    ImageLoaded,
}

/// 根据旧值和当前值判断记录是否代表一次有意义的转换
pub fn classify<E: DomElement>(record: &MutationRecord<E>, markup: &HostMarkup) -> Option<Transition> {
    let attribute = record.attribute_name.as_deref()?;
    let current = record.target.attribute(attribute);

    match attribute {
        "class" => {
            let before = RenderState::from_class(record.old_value.as_deref(), &markup.pending_class);
            let after = RenderState::from_class(current.as_deref(), &markup.pending_class);
            (before == RenderState::NotRendered && after == RenderState::Rendered)
                .then_some(Transition::Rendered)
        }
        "src" => {
            let before = ImageState::from_src(record.old_value.as_deref(), &markup.image_placeholder);
            let after = ImageState::from_src(current.as_deref(), &markup.image_placeholder);
            (before == ImageState::Loading && after == ImageState::Loaded)
                .then_some(Transition::ImageLoaded)
        }
        _ => None,
    }
}

/// 找到记录目标所属的搜索结果条目（图片需要向上查找）
pub fn resolve_item<E: DomElement>(target: &E, markup: &HostMarkup) -> Option<E> {
    target.closest_with_class(&markup.item_class)
}

/// 变更观察器
pub struct MutationWatcher<B: ObservationBackend> {
    backend: B,
    state: WatchState,
    epoch: u64,
}

impl<B: ObservationBackend> MutationWatcher<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: WatchState::Disarmed,
            epoch: 0,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, WatchState::Armed { .. })
    }

    /// 开始新的观察周期，返回周期编号
    pub fn arm(&mut self, root: &B::Element) -> Result<u64> {
        self.disarm();
        self.epoch += 1;
        self.backend.observe(root, &OBSERVED_ATTRIBUTES, self.epoch)?;
        self.state = WatchState::Armed { epoch: self.epoch };
        info!("开始观察页面变更，周期 {}", self.epoch);
        Ok(self.epoch)
    }

    pub fn disarm(&mut self) {
        if let WatchState::Armed { epoch } = self.state {
            self.backend.disconnect();
            self.state = WatchState::Disarmed;
            info!("停止观察页面变更，周期 {}", epoch);
        }
    }

    /// 批次是否属于当前观察周期
    pub fn admits(&self, epoch: u64) -> bool {
        self.state == WatchState::Armed { epoch }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: ObservationBackend> Drop for MutationWatcher<B> {
    fn drop(&mut self) {
        self.disarm();
    }
}
