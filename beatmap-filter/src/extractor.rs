use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use utils_common::{normalize_time, parse_time_to_seconds, Difficulty, FilterSettings, Item};

use crate::config::HostMarkup;
use crate::dom::{DomElement, Query};

// 封面文件名中第一个 `.` 之前的部分即内容哈希
static IMAGE_HASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)\.").unwrap());

/// 解析失败时使用的默认值
///
/// 取自默认设置中对应的边界，保证在默认设置下无法解析的字段不会单独排除条目。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtractDefaults {
    pub upvotes: u64,
    pub downvotes: u64,
    pub downloads: u64,
    pub rating: u64,
    pub duration: u32,
}

impl ExtractDefaults {
    pub fn from_settings(settings: &FilterSettings) -> Self {
        Self {
            upvotes: settings.min_upvotes,
            downvotes: settings.max_downvotes,
            downloads: settings.min_downloads,
            rating: settings.min_rating,
            duration: settings.min_duration.seconds(),
        }
    }
}

impl Default for ExtractDefaults {
    fn default() -> Self {
        Self::from_settings(&FilterSettings::default())
    }
}

/// 文本中第一个以空白分隔的词
pub fn leading_token(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or("")
}

/// 解析首个词开头的十进制数字，例如 `"95%"` 得到 95
pub fn parse_leading_int(text: &str) -> Option<u64> {
    let token = leading_token(text);
    let digits_end = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    token[..digits_end].parse().ok()
}

/// 解析时长标签，例如 `"3:45"` 得到 225 秒
pub fn parse_duration(text: &str) -> Option<u32> {
    normalize_time(leading_token(text))
        .as_deref()
        .and_then(parse_time_to_seconds)
}

/// 从封面地址中取出内容哈希
///
/// 取 URL 路径最后一段中第一个 `.` 之前的部分；占位图或无法解析时返回 `None`。
pub fn hash_from_image_src(src: &str, placeholder: &str) -> Option<String> {
    if !placeholder.is_empty() && src.contains(placeholder) {
        return None;
    }

    let without_query = src.split(['?', '#']).next().unwrap_or("");
    let path = match without_query.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |idx| &rest[idx..]),
        None => without_query,
    };
    let segment = path.rsplit('/').next().unwrap_or("");

    IMAGE_HASH
        .captures(segment)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// 读取一个数值标签的文本
fn metric_text<E: DomElement>(element: &E, markup: &HostMarkup, title: &str) -> Option<String> {
    element
        .query(&Query::Titled {
            tag: &markup.metric_tag,
            title,
        })
        .map(|node| node.text_content())
}

fn metric<E: DomElement>(element: &E, markup: &HostMarkup, title: &str, default: u64) -> u64 {
    metric_text(element, markup, title)
        .as_deref()
        .and_then(parse_leading_int)
        .unwrap_or(default)
}

/// 从一个搜索结果元素中提取条目
///
/// 只读，不会修改元素。任何字段解析失败都替换为 `defaults` 中的值。
pub fn extract<E: DomElement>(element: &E, markup: &HostMarkup, defaults: &ExtractDefaults) -> Item {
    let duration = metric_text(element, markup, &markup.duration_title)
        .as_deref()
        .and_then(parse_duration)
        .unwrap_or(defaults.duration);

    let author = element
        .query(&Query::AttrPrefix {
            tag: "a",
            attr: "href",
            prefix: &markup.author_href_prefix,
        })
        .map(|link| link.text_content().trim().to_lowercase())
        .unwrap_or_default();

    let difficulties: BTreeSet<Difficulty> = Difficulty::ALL
        .into_iter()
        .filter(|difficulty| {
            let classes = [markup.tag_class.as_str(), difficulty.class_name()];
            element.query(&Query::Classes(&classes)).is_some()
        })
        .collect();

    let hash = element
        .query(&Query::Tag("img"))
        .and_then(|image| image.attribute("src"))
        .and_then(|src| hash_from_image_src(&src, &markup.image_placeholder));

    let id = element
        .attribute(&markup.id_attribute)
        .filter(|id| !id.is_empty())
        .or_else(|| hash.clone());

    Item {
        id,
        hash,
        upvotes: metric(element, markup, &markup.upvotes_title, defaults.upvotes),
        downvotes: metric(element, markup, &markup.downvotes_title, defaults.downvotes),
        downloads: metric(element, markup, &markup.downloads_title, defaults.downloads),
        rating: metric(element, markup, &markup.rating_title, defaults.rating),
        duration,
        author,
        difficulties,
    }
}
