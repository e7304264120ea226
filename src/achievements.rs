//! Badges and profile statistics
//!
//! Nothing here is stored. Every call recomputes from the current favorites
//! and completions, so a badge whose condition stops holding (after a reset,
//! for example) shows as locked again.

use std::collections::BTreeSet;

use crate::catalog::Catalog;
use crate::storage::UserSnapshot;
use crate::types::Category;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    CompletedAtLeast(usize),
    FavoritesAtLeast(usize),
    /// Completed at least one recipe from every category.
    AllCategoriesCompleted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub rule: Rule,
}

pub static ACHIEVEMENTS: [Achievement; 6] = [
    Achievement {
        id: "first-recipe",
        name: "First Steps",
        description: "Completed your first recipe",
        icon: "👶",
        rule: Rule::CompletedAtLeast(1),
    },
    Achievement {
        id: "sauce-lover",
        name: "Sauce Lover",
        description: "Saved 5 recipes to favorites",
        icon: "❤️",
        rule: Rule::FavoritesAtLeast(5),
    },
    Achievement {
        id: "recipe-master",
        name: "Recipe Master",
        description: "Completed 5 recipes",
        icon: "🏆",
        rule: Rule::CompletedAtLeast(5),
    },
    Achievement {
        id: "sauce-explorer",
        name: "Sauce Explorer",
        description: "Tried recipes from all 3 categories",
        icon: "🧭",
        rule: Rule::AllCategoriesCompleted,
    },
    Achievement {
        id: "chef-extraordinaire",
        name: "Chef Extraordinaire",
        description: "Completed 10 recipes",
        icon: "⭐",
        rule: Rule::CompletedAtLeast(10),
    },
    Achievement {
        id: "flavor-fanatic",
        name: "Flavor Fanatic",
        description: "Saved 10 recipes to favorites",
        icon: "🔥",
        rule: Rule::FavoritesAtLeast(10),
    },
];

/// The counters badges are judged on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub favorites: usize,
    pub completed: usize,
    pub categories_completed: BTreeSet<Category>,
}

impl Progress {
    /// Counts ids as given. Category coverage only includes completed ids the
    /// catalog still knows.
    pub fn from_snapshot(catalog: &Catalog, snapshot: &UserSnapshot) -> Self {
        let categories_completed = snapshot
            .completed
            .iter()
            .filter_map(|id| catalog.recipe(id))
            .map(|recipe| recipe.category)
            .collect();
        Self {
            favorites: snapshot.favorites.len(),
            completed: snapshot.completed.len(),
            categories_completed,
        }
    }
}

impl Rule {
    pub fn holds(&self, progress: &Progress) -> bool {
        match self {
            Rule::CompletedAtLeast(n) => progress.completed >= *n,
            Rule::FavoritesAtLeast(n) => progress.favorites >= *n,
            Rule::AllCategoriesCompleted => Category::ALL
                .iter()
                .all(|c| progress.categories_completed.contains(c)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AchievementStatus {
    pub achievement: &'static Achievement,
    pub unlocked: bool,
}

/// Every badge with its current lock state, in display order.
pub fn evaluate(progress: &Progress) -> Vec<AchievementStatus> {
    ACHIEVEMENTS
        .iter()
        .map(|achievement| AchievementStatus {
            achievement,
            unlocked: achievement.rule.holds(progress),
        })
        .collect()
}

pub fn unlocked(progress: &Progress) -> Vec<&'static Achievement> {
    evaluate(progress)
        .into_iter()
        .filter(|status| status.unlocked)
        .map(|status| status.achievement)
        .collect()
}

/// Headline numbers for the profile page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileStats {
    pub favorites: usize,
    pub completed: usize,
    pub achievements_unlocked: usize,
    pub achievements_total: usize,
    pub cooking_minutes: u32,
}

pub fn profile_stats(catalog: &Catalog, snapshot: &UserSnapshot) -> ProfileStats {
    let progress = Progress::from_snapshot(catalog, snapshot);
    let cooking_minutes = snapshot
        .completed
        .iter()
        .filter_map(|id| catalog.recipe(id))
        .map(|recipe| recipe.prep_time.minutes())
        .sum();

    ProfileStats {
        favorites: progress.favorites,
        completed: progress.completed,
        achievements_unlocked: unlocked(&progress).len(),
        achievements_total: ACHIEVEMENTS.len(),
        cooking_minutes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(favorites: &[&str], completed: &[&str]) -> UserSnapshot {
        UserSnapshot {
            favorites: favorites.iter().map(|s| s.to_string()).collect(),
            completed: completed.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn is_unlocked(progress: &Progress, id: &str) -> bool {
        evaluate(progress)
            .iter()
            .find(|s| s.achievement.id == id)
            .map(|s| s.unlocked)
            .unwrap()
    }

    #[test]
    fn nothing_unlocked_for_a_new_user() {
        assert!(unlocked(&Progress::default()).is_empty());
        assert_eq!(evaluate(&Progress::default()).len(), ACHIEVEMENTS.len());
    }

    #[test]
    fn first_steps_follows_completed_count_both_ways() {
        let mut progress = Progress::default();
        assert!(!is_unlocked(&progress, "first-recipe"));
        progress.completed = 1;
        assert!(is_unlocked(&progress, "first-recipe"));
        progress.completed = 0;
        assert!(!is_unlocked(&progress, "first-recipe"));
    }

    #[test]
    fn thresholds_unlock_at_the_boundary() {
        let progress = Progress {
            favorites: 5,
            completed: 4,
            ..Progress::default()
        };
        let ids: Vec<&str> = unlocked(&progress).iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["first-recipe", "sauce-lover"]);

        let progress = Progress {
            favorites: 10,
            completed: 10,
            ..Progress::default()
        };
        let ids: Vec<&str> = unlocked(&progress).iter().map(|a| a.id).collect();
        assert_eq!(
            ids,
            vec![
                "first-recipe",
                "sauce-lover",
                "recipe-master",
                "chef-extraordinaire",
                "flavor-fanatic"
            ]
        );
    }

    #[test]
    fn explorer_needs_every_category() {
        let catalog = Catalog::builtin().unwrap();
        let two = Progress::from_snapshot(&catalog, &snapshot(&[], &["1", "7"]));
        assert!(!is_unlocked(&two, "sauce-explorer"));

        let three = Progress::from_snapshot(&catalog, &snapshot(&[], &["1", "7", "11"]));
        assert!(is_unlocked(&three, "sauce-explorer"));
    }

    #[test]
    fn unknown_ids_count_but_add_no_category() {
        let catalog = Catalog::builtin().unwrap();
        let progress = Progress::from_snapshot(&catalog, &snapshot(&["gone"], &["gone"]));
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.favorites, 1);
        assert!(progress.categories_completed.is_empty());
    }

    #[test]
    fn profile_stats_sum_cooking_minutes() {
        let catalog = Catalog::builtin().unwrap();
        // <15 min, 15-30 min, >30 min
        let stats = profile_stats(&catalog, &snapshot(&["3"], &["1", "2", "9"]));
        assert_eq!(stats.cooking_minutes, 15 + 15 + 30);
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.favorites, 1);
        assert_eq!(stats.achievements_unlocked, 1);
        assert_eq!(stats.achievements_total, 6);
    }

    #[test]
    fn first_steps_relocks_after_a_reset() {
        use crate::storage::{MemoryStore, StateStore};

        let catalog = Catalog::builtin().unwrap();
        let state = StateStore::new(MemoryStore::new());
        let recipe = catalog.recipe("3").unwrap();
        for i in 0..recipe.steps.len() {
            state.toggle_step(recipe, i).unwrap();
        }
        state.mark_completed(recipe).unwrap();

        let progress = Progress::from_snapshot(&catalog, &state.snapshot());
        assert!(is_unlocked(&progress, "first-recipe"));

        state.reset().unwrap();
        let progress = Progress::from_snapshot(&catalog, &state.snapshot());
        assert!(!is_unlocked(&progress, "first-recipe"));
    }
}
