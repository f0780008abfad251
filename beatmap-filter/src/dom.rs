//! 页面元素抽象
//!
//! 引擎只通过 [`DomElement`] 读取和修改页面。浏览器中由 `web_sys::Element` 实现，
//! 离线扫描工具由 html5ever 的节点实现，测试中由内存中的假 DOM 实现。

use crate::error::Result;

/// 引擎使用的元素查询，可以转换为 CSS 选择器，也可以直接匹配元素
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Query<'a> {
    /// `tag[title="..."]`
    Titled { tag: &'a str, title: &'a str },
    /// `.a.b`
    Classes(&'a [&'a str]),
    /// `.class:not(.except)`
    ClassExcept { class: &'a str, except: &'a str },
    /// `tag[attr^="prefix"]`
    AttrPrefix {
        tag: &'a str,
        attr: &'a str,
        prefix: &'a str,
    },
    /// `tag`
    Tag(&'a str),
}

impl Query<'_> {
    /// 转换为 CSS 选择器
    pub fn to_css(&self) -> String {
        match self {
            Query::Titled { tag, title } => format!("{}[title=\"{}\"]", tag, title),
            Query::Classes(classes) => classes.iter().map(|c| format!(".{}", c)).collect(),
            Query::ClassExcept { class, except } => format!(".{}:not(.{})", class, except),
            Query::AttrPrefix { tag, attr, prefix } => format!("{}[{}^=\"{}\"]", tag, attr, prefix),
            Query::Tag(tag) => (*tag).to_string(),
        }
    }

    /// 判断元素是否匹配
    pub fn matches<E: DomElement>(&self, element: &E) -> bool {
        match self {
            Query::Titled { tag, title } => {
                element.tag_name().eq_ignore_ascii_case(tag)
                    && element.attribute("title").as_deref() == Some(*title)
            }
            Query::Classes(classes) => classes.iter().all(|c| element.has_class(c)),
            Query::ClassExcept { class, except } => {
                element.has_class(class) && !element.has_class(except)
            }
            Query::AttrPrefix { tag, attr, prefix } => {
                element.tag_name().eq_ignore_ascii_case(tag)
                    && element
                        .attribute(attr)
                        .is_some_and(|value| value.starts_with(prefix))
            }
            Query::Tag(tag) => element.tag_name().eq_ignore_ascii_case(tag),
        }
    }
}

/// 页面元素 - 句柄语义，克隆得到的是同一个节点
///
/// 必须实现的方法只覆盖最基本的读写；查询和内联样式有基于它们的默认实现，
/// 浏览器实现会改用原生 API。
pub trait DomElement: Clone + Sized {
    /// 小写的标签名
    fn tag_name(&self) -> String;
    fn attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&self, name: &str, value: &str) -> Result<()>;
    fn remove_attribute(&self, name: &str) -> Result<()>;
    /// 所有后代文本拼接
    fn text_content(&self) -> String;
    /// 父元素（不含文档节点）
    fn parent(&self) -> Option<Self>;
    /// 子元素，按文档顺序
    fn children(&self) -> Vec<Self>;

    fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// 第一个匹配的后代元素（不含自身）
    fn query(&self, query: &Query<'_>) -> Option<Self> {
        let mut stack: Vec<Self> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if query.matches(&node) {
                return Some(node);
            }
            stack.extend(node.children().into_iter().rev());
        }
        None
    }

    /// 所有匹配的后代元素，按文档顺序
    fn query_all(&self, query: &Query<'_>) -> Vec<Self> {
        let mut found = Vec::new();
        let mut stack: Vec<Self> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if query.matches(&node) {
                found.push(node.clone());
            }
            stack.extend(node.children().into_iter().rev());
        }
        found
    }

    /// 自身或最近的带有指定类名的祖先
    fn closest_with_class(&self, class: &str) -> Option<Self> {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if node.has_class(class) {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }

    /// 内联样式的值，不含优先级标记
    fn style_property(&self, name: &str) -> Option<String> {
        inline_declaration(self, name)
            .map(|value| split_priority(&value).0.to_string())
    }

    /// 内联样式的优先级（`important`），没有标记时返回 `None`
    fn style_priority(&self, name: &str) -> Option<String> {
        inline_declaration(self, name)
            .and_then(|value| split_priority(&value).1.map(str::to_string))
    }

    fn set_style_property(&self, name: &str, value: &str) -> Result<()> {
        self.set_style_property_with_priority(name, value, "")
    }

    fn set_style_property_with_priority(&self, name: &str, value: &str, priority: &str) -> Result<()> {
        let value = if priority.is_empty() {
            value.to_string()
        } else {
            format!("{} !{}", value, priority)
        };
        let mut declarations = parse_inline_style(&self.attribute("style").unwrap_or_default());
        match declarations.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value,
            None => declarations.push((name.to_string(), value)),
        }
        self.set_attribute("style", &render_inline_style(&declarations))
    }

    fn remove_style_property(&self, name: &str) -> Result<()> {
        let Some(style) = self.attribute("style") else {
            return Ok(());
        };
        let declarations: Vec<_> = parse_inline_style(&style)
            .into_iter()
            .filter(|(key, _)| key != name)
            .collect();
        if declarations.is_empty() {
            self.remove_attribute("style")
        } else {
            self.set_attribute("style", &render_inline_style(&declarations))
        }
    }
}

// 原样取出某个内联声明的值，包括优先级标记
fn inline_declaration<E: DomElement>(element: &E, name: &str) -> Option<String> {
    let style = element.attribute("style")?;
    parse_inline_style(&style)
        .into_iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

/// 解析 `style` 属性为 (属性名, 值) 列表，属性名转为小写
pub fn parse_inline_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let (key, value) = declaration.split_once(':')?;
            let key = key.trim().to_ascii_lowercase();
            if key.is_empty() {
                return None;
            }
            Some((key, value.trim().to_string()))
        })
        .collect()
}

/// 拆出声明值末尾的 `!important`
pub fn split_priority(value: &str) -> (&str, Option<&str>) {
    match value.rsplit_once('!') {
        Some((rest, priority)) if priority.trim().eq_ignore_ascii_case("important") => {
            (rest.trim_end(), Some("important"))
        }
        _ => (value, None),
    }
}

pub fn render_inline_style(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(key, value)| format!("{}: {};", key, value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// 属性变更记录，只保留引擎关心的字段
#[derive(Clone, Debug)]
pub struct MutationRecord<E> {
    pub target: E,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

/// 一次回调送达的记录批次，带有产生它的观察周期编号
#[derive(Clone, Debug)]
pub struct MutationBatch<E> {
    pub epoch: u64,
    pub records: Vec<MutationRecord<E>>,
}
