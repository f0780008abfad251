use std::collections::HashSet;
use utils_common::{FilterSettings, Item};

/// 筛选条件，按求值顺序排列
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Clause {
    Difficulty,
    Upvotes,
    Downvotes,
    Downloads,
    Rating,
    Duration,
    ExcludedMapper,
}

impl Clause {
    pub fn describe(self) -> &'static str {
        match self {
            Clause::Difficulty => "no enabled difficulty",
            Clause::Upvotes => "too few upvotes",
            Clause::Downvotes => "too many downvotes",
            Clause::Downloads => "too few downloads",
            Clause::Rating => "rating too low",
            Clause::Duration => "duration out of range",
            Clause::ExcludedMapper => "excluded mapper",
        }
    }
}

/// 预先计算好的筛选条件，避免对每个条目重复拆分排除列表
#[derive(Clone, Debug)]
pub struct Predicate {
    settings: FilterSettings,
    excluded: HashSet<String>,
}

impl Predicate {
    pub fn new(settings: &FilterSettings) -> Self {
        Self {
            excluded: settings.excluded_mapper_set(),
            settings: settings.clone(),
        }
    }

    /// 第一个不满足的条件；全部满足时返回 `None`
    pub fn failed_clause(&self, item: &Item) -> Option<Clause> {
        let s = &self.settings;
        let checks = [
            (
                Clause::Difficulty,
                item.difficulties.iter().any(|d| s.difficulties.is_enabled(*d)),
            ),
            (Clause::Upvotes, item.upvotes >= s.min_upvotes),
            (Clause::Downvotes, item.downvotes <= s.max_downvotes),
            (Clause::Downloads, item.downloads >= s.min_downloads),
            (Clause::Rating, item.rating >= s.min_rating),
            (
                Clause::Duration,
                item.duration >= s.min_duration.seconds() && item.duration <= s.max_duration.seconds(),
            ),
            (Clause::ExcludedMapper, !self.excluded.contains(&item.author)),
        ];

        checks
            .into_iter()
            .find(|(_, holds)| !holds)
            .map(|(clause, _)| clause)
    }

    pub fn passes(&self, item: &Item) -> bool {
        self.failed_clause(item).is_none()
    }
}

/// 判断条目是否通过全部筛选条件
pub fn passes(item: &Item, settings: &FilterSettings) -> bool {
    Predicate::new(settings).passes(item)
}

/// 第一个不满足的条件
pub fn failed_clause(item: &Item, settings: &FilterSettings) -> Option<Clause> {
    Predicate::new(settings).failed_clause(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;
    use utils_common::{ClockTime, Difficulty, DifficultyFlags};

    fn sample_item() -> Item {
        Item {
            id: Some("1".to_string()),
            hash: Some("abc".to_string()),
            upvotes: 10,
            downvotes: 2,
            downloads: 100,
            rating: 90,
            duration: 120,
            author: "eric".to_string(),
            difficulties: BTreeSet::from([Difficulty::Hard]),
        }
    }

    fn sample_settings(excluded: &str) -> FilterSettings {
        let mut difficulties = DifficultyFlags::none();
        difficulties.set(Difficulty::Hard, true);
        FilterSettings {
            min_upvotes: 5,
            max_downvotes: 5,
            min_downloads: 50,
            min_rating: 80,
            min_duration: ClockTime::from_seconds(0),
            max_duration: ClockTime::from_seconds(300),
            difficulties,
            excluded_mappers: excluded.to_string(),
            ..FilterSettings::default()
        }
    }

    #[test]
    fn test_item_passes() {
        assert!(passes(&sample_item(), &sample_settings("john")));
    }

    #[test]
    fn test_excluded_author_fails() {
        let settings = sample_settings("eric");
        assert!(!passes(&sample_item(), &settings));
        assert_eq!(failed_clause(&sample_item(), &settings), Some(Clause::ExcludedMapper));

        let settings = sample_settings(" John , ERIC ");
        assert!(!passes(&sample_item(), &settings));
    }

    #[test]
    fn test_evaluation_is_pure() {
        let item = sample_item();
        let settings = sample_settings("john");
        let predicate = Predicate::new(&settings);
        let first = predicate.passes(&item);
        for _ in 0..3 {
            assert_eq!(predicate.passes(&item), first);
            assert_eq!(passes(&item, &settings), first);
        }
    }

    #[test]
    fn test_no_enabled_difficulty_fails() {
        let mut settings = sample_settings("");
        settings.difficulties = DifficultyFlags::none();
        assert_eq!(failed_clause(&sample_item(), &settings), Some(Clause::Difficulty));
    }

    #[test]
    fn test_each_numeric_clause() {
        let settings = sample_settings("");

        let mut item = sample_item();
        item.upvotes = 4;
        assert_eq!(failed_clause(&item, &settings), Some(Clause::Upvotes));

        let mut item = sample_item();
        item.downvotes = 6;
        assert_eq!(failed_clause(&item, &settings), Some(Clause::Downvotes));

        let mut item = sample_item();
        item.downloads = 49;
        assert_eq!(failed_clause(&item, &settings), Some(Clause::Downloads));

        let mut item = sample_item();
        item.rating = 79;
        assert_eq!(failed_clause(&item, &settings), Some(Clause::Rating));

        let mut item = sample_item();
        item.duration = 301;
        assert_eq!(failed_clause(&item, &settings), Some(Clause::Duration));
    }

    #[test]
    fn test_duration_bounds_inclusive_and_degenerate_range() {
        let mut settings = sample_settings("");
        let mut item = sample_item();
        item.duration = 300;
        assert!(passes(&item, &settings));

        settings.min_duration = ClockTime::from_seconds(200);
        settings.max_duration = ClockTime::from_seconds(100);
        item.duration = 150;
        assert!(!passes(&item, &settings));
    }

    #[test]
    fn test_default_settings_accept_defaulted_item() {
        let settings = FilterSettings::default();
        let mut item = sample_item();
        item.author = String::new();
        item.downvotes = utils_common::MAX_SAFE_INTEGER;
        assert!(passes(&item, &settings));
    }
}
