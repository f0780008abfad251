//! 测试工具：内存中的假 DOM、观察器、存储和文件保存
//!
//! 只在 `cfg(test)` 下编译。

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use utils_common::Difficulty;

use crate::builder::FileSaver;
use crate::dom::DomElement;
use crate::error::Result;
use crate::storage::SettingsStore;
use crate::watcher::ObservationBackend;

struct FakeNode {
    tag: String,
    attrs: RefCell<Vec<(String, String)>>,
    text: RefCell<String>,
    children: RefCell<Vec<FakeElement>>,
    parent: RefCell<Weak<FakeNode>>,
    writes: Cell<usize>,
}

/// 假 DOM 元素，记录通过 `DomElement` 发生的写入次数
#[derive(Clone)]
pub struct FakeElement(Rc<FakeNode>);

impl FakeElement {
    pub fn new(tag: &str) -> Self {
        Self(Rc::new(FakeNode {
            tag: tag.to_string(),
            attrs: RefCell::new(Vec::new()),
            text: RefCell::new(String::new()),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
            writes: Cell::new(0),
        }))
    }

    /// 构建时设置属性，不计入写入次数
    pub fn with_attr(self, name: &str, value: &str) -> Self {
        self.put_attr(name, value);
        self
    }

    pub fn with_class(self, class: &str) -> Self {
        let classes = match self.attribute("class") {
            Some(existing) => format!("{} {}", existing, class),
            None => class.to_string(),
        };
        self.with_attr("class", &classes)
    }

    pub fn with_text(self, text: &str) -> Self {
        *self.0.text.borrow_mut() = text.to_string();
        self
    }

    pub fn with_child(self, child: FakeElement) -> Self {
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        self.0.children.borrow_mut().push(child);
        self
    }

    pub fn write_count(&self) -> usize {
        self.0.writes.get()
    }

    pub fn same_node(&self, other: &FakeElement) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn put_attr(&self, name: &str, value: &str) {
        let mut attrs = self.0.attrs.borrow_mut();
        match attrs.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => attrs.push((name.to_string(), value.to_string())),
        }
    }
}

impl std::fmt::Debug for FakeElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeElement")
            .field("tag", &self.0.tag)
            .field("attrs", &self.0.attrs.borrow())
            .finish()
    }
}

impl DomElement for FakeElement {
    fn tag_name(&self) -> String {
        self.0.tag.to_ascii_lowercase()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.0
            .attrs
            .borrow()
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    fn set_attribute(&self, name: &str, value: &str) -> Result<()> {
        self.0.writes.set(self.0.writes.get() + 1);
        self.put_attr(name, value);
        Ok(())
    }

    fn remove_attribute(&self, name: &str) -> Result<()> {
        self.0.writes.set(self.0.writes.get() + 1);
        self.0.attrs.borrow_mut().retain(|(key, _)| key != name);
        Ok(())
    }

    fn text_content(&self) -> String {
        let mut text = self.0.text.borrow().clone();
        for child in self.0.children.borrow().iter() {
            text.push_str(&child.text_content());
        }
        text
    }

    fn parent(&self) -> Option<Self> {
        self.0.parent.borrow().upgrade().map(FakeElement)
    }

    fn children(&self) -> Vec<Self> {
        self.0.children.borrow().clone()
    }
}

/// 一个搜索结果条目的测试数据，默认值能通过常用的测试设置
#[derive(Clone, Debug)]
pub struct ResultFixture {
    pub id: String,
    pub upvotes: String,
    pub downvotes: String,
    pub downloads: String,
    pub rating: String,
    pub duration: String,
    pub author: String,
    pub tags: Vec<Difficulty>,
    pub cover: String,
    pub pending: bool,
}

impl ResultFixture {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            upvotes: "10".to_string(),
            downvotes: "2".to_string(),
            downloads: "100".to_string(),
            rating: "90%".to_string(),
            duration: "2:00".to_string(),
            author: "Eric".to_string(),
            tags: vec![Difficulty::Hard],
            cover: format!("https://cdn.beatsaver.com/hash{}.jpg", id),
            pending: false,
        }
    }

    pub fn build(&self) -> FakeElement {
        let metric = |title: &str, text: &str| {
            FakeElement::new("li").with_attr("title", title).with_text(text)
        };

        let mut tags = FakeElement::new("div").with_class("tags");
        for tag in &self.tags {
            tags = tags.with_child(
                FakeElement::new("span")
                    .with_class("tag")
                    .with_class(tag.class_name())
                    .with_text(tag.label()),
            );
        }

        let details = FakeElement::new("div")
            .with_class("details")
            .with_child(
                FakeElement::new("a")
                    .with_attr("href", &format!("/uploader/{}", self.author.to_lowercase()))
                    .with_text(&self.author),
            )
            .with_child(tags);

        let stats = FakeElement::new("ul")
            .with_class("stats")
            .with_child(metric("Upvotes", &format!("{} ", self.upvotes)))
            .with_child(metric("Downvotes", &self.downvotes))
            .with_child(metric("Downloads", &self.downloads))
            .with_child(metric("Beatmap Rating", &self.rating))
            .with_child(metric("Beatmap Duration", &self.duration));

        let class = if self.pending {
            "beatmap-result beatmap-result-hidden"
        } else {
            "beatmap-result"
        };

        FakeElement::new("div")
            .with_class(class)
            .with_attr("data-key", &self.id)
            .with_child(FakeElement::new("img").with_attr("src", &self.cover))
            .with_child(details)
            .with_child(stats)
    }
}

#[derive(Debug, Default)]
pub struct BackendLog {
    pub observes: usize,
    pub disconnects: usize,
    pub observed_attributes: Vec<String>,
    pub last_epoch: Option<u64>,
}

/// 假观察器，只记录调用
#[derive(Default)]
pub struct FakeBackend {
    log: Rc<RefCell<BackendLog>>,
}

impl FakeBackend {
    pub fn log(&self) -> Rc<RefCell<BackendLog>> {
        self.log.clone()
    }
}

impl ObservationBackend for FakeBackend {
    type Element = FakeElement;

    fn observe(&mut self, _root: &FakeElement, attributes: &[&str], epoch: u64) -> Result<()> {
        let mut log = self.log.borrow_mut();
        log.observes += 1;
        log.observed_attributes = attributes.iter().map(|a| a.to_string()).collect();
        log.last_epoch = Some(epoch);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.log.borrow_mut().disconnects += 1;
    }
}

/// 内存存储，克隆之间共享数据
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn with(key: &str, value: &str) -> Self {
        let store = Self::default();
        store.values.borrow_mut().insert(key.to_string(), value.to_string());
        store
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.get(key)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// 记录保存请求的文件保存器
#[derive(Default)]
pub struct MemorySaver {
    pub saved: Vec<(String, Vec<u8>)>,
}

impl FileSaver for MemorySaver {
    fn save(&mut self, bytes: &[u8], file_name: &str) -> Result<()> {
        self.saved.push((file_name.to_string(), bytes.to_vec()));
        Ok(())
    }
}
