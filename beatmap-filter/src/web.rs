//! 浏览器绑定
//!
//! `web_sys::Element` 实现 [`DomElement`]，`MutationObserver` 实现观察器，
//! `localStorage` 保存设置，用户脚本提供的 `saveAs` 保存歌单。
//! 对外暴露 [`BeatsaverToolsJS`] 给表单脚本调用。

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use log::warn;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Blob, BlobPropertyBag, Element, HtmlElement, MutationObserver, MutationObserverInit, Node, Storage};

use crate::builder::FileSaver;
use crate::config::HostMarkup;
use crate::dom::{DomElement, MutationBatch, MutationRecord, Query};
use crate::error::{Result, ToolsError};
use crate::session::FilterSession;
use crate::storage::SettingsStore;
use crate::watcher::ObservationBackend;

#[wasm_bindgen]
extern "C" {
    /// 用户脚本环境中的 FileSaver
    #[wasm_bindgen(js_namespace = window, js_name = saveAs, catch)]
    fn save_as(blob: &Blob, file_name: &str) -> std::result::Result<(), JsValue>;
}

fn js_message(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

fn dom_error(value: JsValue) -> ToolsError {
    ToolsError::Dom(js_message(&value))
}

fn to_js(error: ToolsError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

impl DomElement for Element {
    fn tag_name(&self) -> String {
        Element::tag_name(self).to_ascii_lowercase()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.get_attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) -> Result<()> {
        Element::set_attribute(self, name, value).map_err(dom_error)
    }

    fn remove_attribute(&self, name: &str) -> Result<()> {
        Element::remove_attribute(self, name).map_err(dom_error)
    }

    fn text_content(&self) -> String {
        Node::text_content(self).unwrap_or_default()
    }

    fn parent(&self) -> Option<Self> {
        Node::parent_element(self)
    }

    fn children(&self) -> Vec<Self> {
        let collection = Element::children(self);
        (0..collection.length())
            .filter_map(|i| collection.item(i))
            .collect()
    }

    fn query(&self, query: &Query<'_>) -> Option<Self> {
        self.query_selector(&query.to_css()).ok().flatten()
    }

    fn query_all(&self, query: &Query<'_>) -> Vec<Self> {
        let Ok(nodes) = self.query_selector_all(&query.to_css()) else {
            return Vec::new();
        };
        (0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn style_property(&self, name: &str) -> Option<String> {
        let element = self.dyn_ref::<HtmlElement>()?;
        let value = element.style().get_property_value(name).ok()?;
        (!value.is_empty()).then_some(value)
    }

    fn style_priority(&self, name: &str) -> Option<String> {
        let element = self.dyn_ref::<HtmlElement>()?;
        let priority = element.style().get_property_priority(name);
        (!priority.is_empty()).then_some(priority)
    }

    fn set_style_property(&self, name: &str, value: &str) -> Result<()> {
        self.set_style_property_with_priority(name, value, "")
    }

    fn set_style_property_with_priority(&self, name: &str, value: &str, priority: &str) -> Result<()> {
        let element = self
            .dyn_ref::<HtmlElement>()
            .ok_or_else(|| ToolsError::Dom("不是 HTML 元素".to_string()))?;
        element
            .style()
            .set_property_with_priority(name, value, priority)
            .map_err(dom_error)
    }

    fn remove_style_property(&self, name: &str) -> Result<()> {
        let element = self
            .dyn_ref::<HtmlElement>()
            .ok_or_else(|| ToolsError::Dom("不是 HTML 元素".to_string()))?;
        element.style().remove_property(name).map(|_| ()).map_err(dom_error)
    }
}

type WebSession = FilterSession<WebObserver>;
type SessionSlot = Rc<RefCell<Weak<RefCell<WebSession>>>>;

/// 基于 `MutationObserver` 的观察器
///
/// 每次开始观察都会新建一个原生观察器，回调在创建时捕获当期的周期编号，
/// 送达的批次因此总是带着产生它的周期。
/// 回调只持有会话的弱引用；会话释放后回调直接返回。
pub struct WebObserver {
    slot: SessionSlot,
    active: Option<ActiveObserver>,
}

struct ActiveObserver {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
}

impl WebObserver {
    fn new(slot: SessionSlot) -> Self {
        Self { slot, active: None }
    }

    fn connect(&self, epoch: u64) -> Result<ActiveObserver> {
        let slot = self.slot.clone();
        let callback = Closure::wrap(Box::new(move |records: js_sys::Array, _observer: MutationObserver| {
            let Some(session) = slot.borrow().upgrade() else {
                return;
            };
            let batch = to_batch(&records, epoch);
            match session.try_borrow_mut() {
                Ok(mut session) => {
                    session.handle_mutations(batch);
                }
                Err(_) => warn!("会话正忙，丢弃 {} 条变更记录", records.length()),
            }
        }) as Box<dyn FnMut(js_sys::Array, MutationObserver)>);

        let observer = MutationObserver::new(callback.as_ref().unchecked_ref()).map_err(dom_error)?;
        Ok(ActiveObserver {
            observer,
            _callback: callback,
        })
    }
}

fn to_batch(records: &js_sys::Array, epoch: u64) -> MutationBatch<Element> {
    let records = records
        .iter()
        .filter_map(|value| value.dyn_into::<web_sys::MutationRecord>().ok())
        .filter_map(|record| {
            let target = record.target()?.dyn_into::<Element>().ok()?;
            Some(MutationRecord {
                target,
                attribute_name: record.attribute_name(),
                old_value: record.old_value(),
            })
        })
        .collect();
    MutationBatch { epoch, records }
}

impl ObservationBackend for WebObserver {
    type Element = Element;

    fn observe(&mut self, root: &Element, attributes: &[&str], epoch: u64) -> Result<()> {
        self.disconnect();
        let active = self.connect(epoch)?;

        let filter: js_sys::Array = attributes.iter().map(|name| JsValue::from_str(name)).collect();
        let options = MutationObserverInit::new();
        options.set_subtree(true);
        options.set_attributes(true);
        options.set_attribute_old_value(true);
        options.set_attribute_filter(&filter);

        active
            .observer
            .observe_with_options(root, &options)
            .map_err(dom_error)?;
        self.active = Some(active);
        Ok(())
    }

    fn disconnect(&mut self) {
        // disconnect 会清空尚未送达的记录队列
        if let Some(active) = self.active.take() {
            active.observer.disconnect();
        }
    }
}

/// `localStorage` 存储
struct LocalStore {
    storage: Option<Storage>,
}

impl SettingsStore for LocalStore {
    fn load(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| ToolsError::Storage("localStorage 不可用".to_string()))?;
        storage
            .set_item(key, value)
            .map_err(|e| ToolsError::Storage(js_message(&e)))
    }
}

/// 调用 `window.saveAs` 下载文件
struct BrowserSaver;

impl FileSaver for BrowserSaver {
    fn save(&mut self, bytes: &[u8], file_name: &str) -> Result<()> {
        let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
        let options = BlobPropertyBag::new();
        options.set_type("application/json");
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
            .map_err(|e| ToolsError::Export(js_message(&e)))?;
        save_as(&blob, file_name).map_err(|e| ToolsError::Export(js_message(&e)))
    }
}

/// 初始化函数 - 设置错误处理和日志
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    crate::logger::init(level);
}

/// 版本信息
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// 筛选器 JS 接口 - 提供给表单脚本使用
#[wasm_bindgen]
pub struct BeatsaverToolsJS {
    session: Rc<RefCell<WebSession>>,
}

#[wasm_bindgen]
impl BeatsaverToolsJS {
    /// 创建筛选会话，可以传入 JSON 覆盖页面结构配置
    #[wasm_bindgen(constructor)]
    pub fn new(markup_json: Option<String>) -> std::result::Result<BeatsaverToolsJS, JsValue> {
        let markup = match markup_json {
            Some(json) => HostMarkup::from_json(&json)
                .map_err(|e| JsValue::from_str(&format!("解析页面配置失败: {}", e)))?,
            None => HostMarkup::default(),
        };

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("没有 window 对象"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("没有 document 对象"))?;
        let root = document
            .query_selector(&markup.content_root)
            .ok()
            .flatten()
            .or_else(|| document.document_element())
            .ok_or_else(|| JsValue::from_str("找不到页面主内容"))?;

        let store = LocalStore {
            storage: window.local_storage().ok().flatten(),
        };

        let slot: SessionSlot = Rc::new(RefCell::new(Weak::new()));
        let observer = WebObserver::new(slot.clone());
        let session = Rc::new(RefCell::new(FilterSession::new(
            root,
            observer,
            Box::new(store),
            markup,
        )));
        *slot.borrow_mut() = Rc::downgrade(&session);

        Ok(BeatsaverToolsJS { session })
    }

    /// 当前设置（表单初始值）
    pub fn settings(&self) -> std::result::Result<JsValue, JsValue> {
        self.session
            .borrow()
            .settings()
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| JsValue::from_str(&format!("序列化设置失败: {}", e)))
    }

    /// 提交表单：全量筛选并开始观察
    pub fn submit(&self, settings_json: &str) -> std::result::Result<(), JsValue> {
        let settings = serde_json::from_str(settings_json)
            .map_err(|e| JsValue::from_str(&format!("解析设置失败: {}", e)))?;
        self.session
            .borrow_mut()
            .submit(settings)
            .map(|_| ())
            .map_err(to_js)
    }

    /// 停止观察
    pub fn stop(&self) {
        self.session.borrow_mut().stop();
    }

    /// 恢复默认设置
    pub fn reset(&self) -> std::result::Result<(), JsValue> {
        self.session.borrow_mut().reset().map(|_| ()).map_err(to_js)
    }

    /// 导出歌单，返回是否生成了文件
    pub fn export(&self, image: Option<String>, clear: bool) -> std::result::Result<bool, JsValue> {
        self.session
            .borrow_mut()
            .export(&mut BrowserSaver, image, clear)
            .map(|file| file.is_some())
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = isArmed)]
    pub fn is_armed(&self) -> bool {
        self.session.borrow().is_armed()
    }

    /// 会话统计
    pub fn stats(&self) -> std::result::Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.session.borrow().stats())
            .map_err(|e| JsValue::from_str(&format!("序列化统计失败: {}", e)))
    }

    #[wasm_bindgen(js_name = playlistSize)]
    pub fn playlist_size(&self) -> usize {
        self.session.borrow().playlist().len()
    }
}
