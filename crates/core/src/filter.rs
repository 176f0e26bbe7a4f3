//! Search and level filtering of the module list.

use crate::model::{LevelFilter, Module};

/// What the user currently types into search and picks as level.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub query: String,
    pub level: LevelFilter,
}

impl FilterState {
    #[must_use]
    pub fn new(query: impl Into<String>, level: LevelFilter) -> Self {
        Self {
            query: query.into(),
            level,
        }
    }

    #[must_use]
    pub fn apply<'a>(&self, modules: &'a [Module]) -> Vec<&'a Module> {
        filter_modules(modules, &self.query, self.level)
    }
}

/// Modules matching `query` and `level`, in their original order.
///
/// The query is a case-insensitive substring test against title, style and
/// instructor; any one of them matching is enough. An empty query matches
/// every module. The level filter is applied on top of the text match.
#[must_use]
pub fn filter_modules<'a>(modules: &'a [Module], query: &str, level: LevelFilter) -> Vec<&'a Module> {
    let needle = query.to_lowercase();
    modules
        .iter()
        .filter(|m| needle.is_empty() || matches_text(m, &needle))
        .filter(|m| level.matches(m.level()))
        .collect()
}

fn matches_text(module: &Module, needle: &str) -> bool {
    [module.title(), module.style(), module.instructor()]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Level, ModuleDraft, ModuleId};

    fn module(id: &str, title: &str, style: &str, instructor: &str, level: Level) -> Module {
        ModuleDraft {
            id: ModuleId::new(id),
            title: title.into(),
            level,
            style: style.into(),
            instructor: instructor.into(),
            description: String::new(),
            thumbnail: None,
            video_count: 0,
            duration_secs: 0,
            videos: Vec::new(),
        }
        .validate()
        .unwrap()
    }

    fn fixture() -> Vec<Module> {
        vec![
            module("m1", "Classical Ballet", "Ballet", "Ana Silva", Level::Beginner),
            module("m2", "Street Dance", "Hip Hop", "Carlos Santos", Level::Intermediate),
            module("m3", "Cuban Salsa", "Salsa", "Maria Rodriguez", Level::Beginner),
            module("m4", "Contemporary Expression", "Contemporary", "Juliana Costa", Level::Advanced),
        ]
    }

    fn ids(found: &[&Module]) -> Vec<String> {
        found.iter().map(|m| m.id().to_string()).collect()
    }

    #[test]
    fn empty_query_and_all_levels_returns_everything_in_order() {
        let modules = fixture();
        let found = filter_modules(&modules, "", LevelFilter::All);
        assert_eq!(ids(&found), ["m1", "m2", "m3", "m4"]);
    }

    #[test]
    fn matches_instructor_case_insensitively() {
        let modules = fixture();
        let found = filter_modules(&modules, "ANA", LevelFilter::All);
        assert_eq!(ids(&found), ["m1", "m4"]);
        let lower = filter_modules(&modules, "ana", LevelFilter::All);
        assert_eq!(ids(&lower), ids(&found));
    }

    #[test]
    fn matches_title_or_style() {
        let modules = fixture();
        assert_eq!(ids(&filter_modules(&modules, "hip", LevelFilter::All)), ["m2"]);
        assert_eq!(ids(&filter_modules(&modules, "cuban", LevelFilter::All)), ["m3"]);
    }

    #[test]
    fn level_filter_is_anded_with_text() {
        let modules = fixture();
        let level = LevelFilter::Only(Level::Beginner);
        assert_eq!(ids(&filter_modules(&modules, "", level)), ["m1", "m3"]);
        assert_eq!(ids(&filter_modules(&modules, "ana", level)), ["m1"]);
        assert!(filter_modules(&modules, "salsa", LevelFilter::Only(Level::Advanced)).is_empty());
    }

    #[test]
    fn filter_state_applies_both_parts() {
        let modules = fixture();
        let state = FilterState::new("contemporary", LevelFilter::All);
        assert_eq!(ids(&state.apply(&modules)), ["m4"]);
        assert_eq!(FilterState::default().apply(&modules).len(), 4);
    }
}
