use serde::{Deserialize, Serialize};

/// 宿主页面结构约定 - 选择器与加载状态标记
///
/// 默认值对应 beatsaver 搜索结果页。页面改版时可以从 JS 传入 JSON 覆盖，
/// 缺失的字段保持默认。
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct HostMarkup {
    /// 主内容容器的 CSS 选择器，观察器挂在它上面
    pub content_root: String,
    /// 搜索结果条目的类名
    pub item_class: String,
    /// 宿主脚本标记“尚未渲染”的类名
    pub pending_class: String,
    /// 条目稳定标识所在的属性
    pub id_attribute: String,
    /// 数值标签所在的元素名
    pub metric_tag: String,
    pub upvotes_title: String,
    pub downvotes_title: String,
    pub downloads_title: String,
    pub rating_title: String,
    pub duration_title: String,
    /// 难度标签的公共类名
    pub tag_class: String,
    /// 谱师链接 href 的前缀
    pub author_href_prefix: String,
    /// 封面图片加载中时 src 里包含的占位标记
    pub image_placeholder: String,
}

impl Default for HostMarkup {
    fn default() -> Self {
        Self {
            content_root: ".search-results".to_string(),
            item_class: "beatmap-result".to_string(),
            pending_class: "beatmap-result-hidden".to_string(),
            id_attribute: "data-key".to_string(),
            metric_tag: "li".to_string(),
            upvotes_title: "Upvotes".to_string(),
            downvotes_title: "Downvotes".to_string(),
            downloads_title: "Downloads".to_string(),
            rating_title: "Beatmap Rating".to_string(),
            duration_title: "Beatmap Duration".to_string(),
            tag_class: "tag".to_string(),
            author_href_prefix: "/uploader/".to_string(),
            image_placeholder: "placeholder".to_string(),
        }
    }
}

impl HostMarkup {
    /// 从 JSON 覆盖默认配置
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
