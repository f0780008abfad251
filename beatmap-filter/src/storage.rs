use log::debug;
use utils_common::FilterSettings;

use crate::error::Result;

/// 设置在存储中的键名
pub const FILTERS_KEY: &str = "bt-filters";

/// 单个键值的设置存储，浏览器中为 `localStorage`
pub trait SettingsStore {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&mut self, key: &str, value: &str) -> Result<()>;
}

/// 读取保存的设置；不存在或已损坏时返回默认设置
pub fn load_settings(store: &dyn SettingsStore) -> FilterSettings {
    let Some(raw) = store.load(FILTERS_KEY) else {
        debug!("没有保存的筛选设置，使用默认值");
        return FilterSettings::default();
    };

    match serde_json::from_str::<FilterSettings>(&raw) {
        Ok(settings) if settings.validate().is_ok() => settings,
        Ok(_) => {
            debug!("保存的筛选设置超出范围，使用默认值");
            FilterSettings::default()
        }
        Err(e) => {
            debug!("保存的筛选设置无法解析，使用默认值: {}", e);
            FilterSettings::default()
        }
    }
}

pub fn save_settings(store: &mut dyn SettingsStore, settings: &FilterSettings) -> Result<()> {
    let json = serde_json::to_string(settings)?;
    store.save(FILTERS_KEY, &json)
}
