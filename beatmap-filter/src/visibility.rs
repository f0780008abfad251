use crate::dom::DomElement;
use crate::error::Result;

const DISPLAY: &str = "display";
const HIDDEN: &str = "none";
/// 本控制器写入的隐藏样式带有这个优先级，宿主自己的 `display: none` 不带
const OWN_PRIORITY: &str = "important";

/// 元素当前是否被本控制器隐藏
pub fn is_suppressed<E: DomElement>(element: &E) -> bool {
    element.style_property(DISPLAY).as_deref() == Some(HIDDEN)
        && element.style_priority(DISPLAY).as_deref() == Some(OWN_PRIORITY)
}

/// 设置条目可见性，返回是否实际写入了页面
///
/// 只读写内联 `display` 样式，不碰宿主脚本管理的类名。
/// 已处于目标状态时不写入，避免触发多余的变更通知。
/// 宿主已经用内联样式隐藏的元素保持原样，显示时也不会清除宿主的样式。
pub fn apply_visibility<E: DomElement>(element: &E, visible: bool) -> Result<bool> {
    if is_suppressed(element) {
        if !visible {
            return Ok(false);
        }
        return element.remove_style_property(DISPLAY).map(|_| true);
    }

    let host_hidden = element.style_property(DISPLAY).as_deref() == Some(HIDDEN);
    if visible || host_hidden {
        return Ok(false);
    }
    element
        .set_style_property_with_priority(DISPLAY, HIDDEN, OWN_PRIORITY)
        .map(|_| true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeElement;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hide_is_idempotent() {
        let element = FakeElement::new("div").with_class("beatmap-result");

        assert!(apply_visibility(&element, false).unwrap());
        assert!(!apply_visibility(&element, false).unwrap());
        assert_eq!(element.write_count(), 1);
        assert!(is_suppressed(&element));
    }

    #[test]
    fn test_show_only_clears_own_style() {
        let element = FakeElement::new("div")
            .with_class("beatmap-result is-featured")
            .with_attr("style", "color: red;");

        assert!(!apply_visibility(&element, true).unwrap());
        assert_eq!(element.write_count(), 0);

        apply_visibility(&element, false).unwrap();
        apply_visibility(&element, true).unwrap();
        assert_eq!(element.attribute("style").as_deref(), Some("color: red;"));
        assert_eq!(element.attribute("class").as_deref(), Some("beatmap-result is-featured"));
        assert!(!is_suppressed(&element));
    }

    #[test]
    fn test_host_hidden_style_survives() {
        let element = FakeElement::new("div")
            .with_class("beatmap-result")
            .with_attr("style", "display: none;");

        assert!(!apply_visibility(&element, true).unwrap());
        assert_eq!(element.attribute("style").as_deref(), Some("display: none;"));
        assert!(!is_suppressed(&element));

        assert!(!apply_visibility(&element, false).unwrap());
        assert!(!apply_visibility(&element, true).unwrap());
        assert_eq!(element.attribute("style").as_deref(), Some("display: none;"));
        assert_eq!(element.write_count(), 0);
    }

    #[test]
    fn test_hide_marks_own_style() {
        let element = FakeElement::new("div").with_attr("style", "display: flex;");

        assert!(apply_visibility(&element, false).unwrap());
        assert_eq!(element.attribute("style").as_deref(), Some("display: none !important;"));
        assert!(is_suppressed(&element));
    }
}
