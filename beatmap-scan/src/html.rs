use std::fs;
use std::path::Path;
use html5ever::parse_document;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{Attribute, LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use beatmap_filter::{DomElement, ObservationBackend, Result as ToolsResult};

/// html5ever 节点上的元素句柄
#[derive(Clone)]
pub struct HtmlNode(Handle);

impl HtmlNode {
    /// 文档的根元素（`<html>`）
    pub fn document_element(dom: &RcDom) -> Option<Self> {
        dom.document
            .children
            .borrow()
            .iter()
            .find(|child| matches!(child.data, NodeData::Element { .. }))
            .cloned()
            .map(HtmlNode)
    }
}

/// 读取并解析HTML文件
pub fn parse_file(path: &Path) -> Result<RcDom, String> {
    let html = fs::read_to_string(path)
        .map_err(|e| format!("无法读取文件 {}: {}", path.display(), e))?;
    parse_html(&html)
}

pub fn parse_html(html: &str) -> Result<RcDom, String> {
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| format!("解析HTML时出错: {}", e))
}

// 递归收集文本节点
fn collect_text(handle: &Handle, text: &mut String) {
    if let NodeData::Text { ref contents } = handle.data {
        text.push_str(&contents.borrow());
    }
    for child in handle.children.borrow().iter() {
        collect_text(child, text);
    }
}

impl DomElement for HtmlNode {
    fn tag_name(&self) -> String {
        match self.0.data {
            NodeData::Element { ref name, .. } => name.local.to_ascii_lowercase().to_string(),
            _ => String::new(),
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        match self.0.data {
            NodeData::Element { ref attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|attr| &*attr.name.local == name)
                .map(|attr| attr.value.to_string()),
            _ => None,
        }
    }

    fn set_attribute(&self, name: &str, value: &str) -> ToolsResult<()> {
        if let NodeData::Element { ref attrs, .. } = self.0.data {
            let mut attrs = attrs.borrow_mut();
            match attrs.iter_mut().find(|attr| &*attr.name.local == name) {
                Some(attr) => attr.value = StrTendril::from(value),
                None => attrs.push(Attribute {
                    name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
                    value: StrTendril::from(value),
                }),
            }
        }
        Ok(())
    }

    fn remove_attribute(&self, name: &str) -> ToolsResult<()> {
        if let NodeData::Element { ref attrs, .. } = self.0.data {
            attrs.borrow_mut().retain(|attr| &*attr.name.local != name);
        }
        Ok(())
    }

    fn text_content(&self) -> String {
        let mut text = String::new();
        collect_text(&self.0, &mut text);
        text
    }

    fn parent(&self) -> Option<Self> {
        // parent 是 Cell<Option<Weak>>，取出后放回
        let weak = self.0.parent.take();
        self.0.parent.set(weak.clone());
        let parent = weak?.upgrade()?;
        matches!(parent.data, NodeData::Element { .. }).then_some(HtmlNode(parent))
    }

    fn children(&self) -> Vec<Self> {
        self.0
            .children
            .borrow()
            .iter()
            .filter(|child| matches!(child.data, NodeData::Element { .. }))
            .cloned()
            .map(HtmlNode)
            .collect()
    }
}

/// 离线扫描不会有页面变更，观察器只是占位
pub struct Offline;

impl ObservationBackend for Offline {
    type Element = HtmlNode;

    fn observe(&mut self, _root: &HtmlNode, _attributes: &[&str], _epoch: u64) -> ToolsResult<()> {
        Ok(())
    }

    fn disconnect(&mut self) {}
}
