use serde::Serialize;
use strum::{Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum GoalDimension {
    EntryCount,
    ChatCount,
    PositivityPercent,
    StreakLength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub goal: u32,
    pub dimension: GoalDimension,
}

pub const ACHIEVEMENTS: &[AchievementDefinition] = &[
    AchievementDefinition {
        id: "first-entry",
        label: "First Reflection",
        goal: 1,
        dimension: GoalDimension::EntryCount,
    },
    AchievementDefinition {
        id: "ten-entries",
        label: "Dedicated Writer",
        goal: 10,
        dimension: GoalDimension::EntryCount,
    },
    AchievementDefinition {
        id: "fifty-entries",
        label: "Seasoned Journaler",
        goal: 50,
        dimension: GoalDimension::EntryCount,
    },
    AchievementDefinition {
        id: "week-streak",
        label: "Week Warrior",
        goal: 7,
        dimension: GoalDimension::StreakLength,
    },
    AchievementDefinition {
        id: "month-streak",
        label: "Monthly Master",
        goal: 30,
        dimension: GoalDimension::StreakLength,
    },
    AchievementDefinition {
        id: "first-chat",
        label: "Opening Up",
        goal: 1,
        dimension: GoalDimension::ChatCount,
    },
    AchievementDefinition {
        id: "chat-regular",
        label: "Conversation Regular",
        goal: 10,
        dimension: GoalDimension::ChatCount,
    },
    AchievementDefinition {
        id: "positive-mind",
        label: "Sunny Outlook",
        goal: 70,
        dimension: GoalDimension::PositivityPercent,
    },
];

/// Day counts celebrated on the streak card.
pub const STREAK_MILESTONES: &[u32] = &[3, 7, 14, 30, 60, 100];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementCounts {
    pub streak_length: u32,
    pub total_entries: u32,
    pub chat_sessions: u32,
    pub positivity_percent: u32,
}

impl AchievementCounts {
    pub fn value(&self, dimension: GoalDimension) -> u32 {
        match dimension {
            GoalDimension::EntryCount => self.total_entries,
            GoalDimension::ChatCount => self.chat_sessions,
            GoalDimension::PositivityPercent => self.positivity_percent,
            GoalDimension::StreakLength => self.streak_length,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementStatus {
    pub id: &'static str,
    pub label: &'static str,
    pub dimension: GoalDimension,
    pub goal: u32,
    pub current: u32,
    pub achieved: bool,
    /// Distance to the goal; zero once achieved.
    pub remaining: u32,
}

pub fn evaluate_achievements(counts: &AchievementCounts) -> Vec<AchievementStatus> {
    evaluate_against(ACHIEVEMENTS, counts)
}

pub fn evaluate_against(
    table: &[AchievementDefinition],
    counts: &AchievementCounts,
) -> Vec<AchievementStatus> {
    table
        .iter()
        .map(|def| {
            let current = counts.value(def.dimension);
            AchievementStatus {
                id: def.id,
                label: def.label,
                dimension: def.dimension,
                goal: def.goal,
                current,
                achieved: current >= def.goal,
                remaining: def.goal.saturating_sub(current),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneProgress {
    /// Highest goal already reached.
    pub current: Option<u32>,
    /// Lowest goal not yet reached.
    pub next: Option<u32>,
    pub remaining_to_next: Option<u32>,
}

pub fn milestone_progress<I>(goals: I, value: u32) -> MilestoneProgress
where
    I: IntoIterator<Item = u32>,
{
    let mut current = None;
    let mut next: Option<u32> = None;
    for goal in goals {
        if value >= goal {
            current = current.max(Some(goal));
        } else {
            next = Some(next.map_or(goal, |n| n.min(goal)));
        }
    }
    MilestoneProgress {
        current,
        next,
        remaining_to_next: next.map(|goal| goal - value),
    }
}

/// Current/next tier among the achievement goals of one dimension.
pub fn dimension_milestones(
    dimension: GoalDimension,
    counts: &AchievementCounts,
) -> MilestoneProgress {
    milestone_progress(
        ACHIEVEMENTS
            .iter()
            .filter(|def| def.dimension == dimension)
            .map(|def| def.goal),
        counts.value(dimension),
    )
}

pub fn streak_milestone(streak_length: u32) -> MilestoneProgress {
    milestone_progress(STREAK_MILESTONES.iter().copied(), streak_length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn status<'a>(statuses: &'a [AchievementStatus], id: &str) -> &'a AchievementStatus {
        statuses
            .iter()
            .find(|status| status.id == id)
            .expect("achievement present")
    }

    #[test]
    fn ten_entries_goal_boundary() {
        let at_goal = evaluate_achievements(&AchievementCounts {
            total_entries: 10,
            ..Default::default()
        });
        let ten = status(&at_goal, "ten-entries");
        assert!(ten.achieved);
        assert_eq!(ten.remaining, 0);

        let below = evaluate_achievements(&AchievementCounts {
            total_entries: 9,
            ..Default::default()
        });
        let ten = status(&below, "ten-entries");
        assert!(!ten.achieved);
        assert_eq!(ten.remaining, 1);
    }

    #[test]
    fn achieved_iff_count_meets_goal_for_every_definition() {
        for def in ACHIEVEMENTS {
            for value in [0, def.goal.saturating_sub(1), def.goal, def.goal + 1, def.goal * 3] {
                let mut counts = AchievementCounts::default();
                match def.dimension {
                    GoalDimension::EntryCount => counts.total_entries = value,
                    GoalDimension::ChatCount => counts.chat_sessions = value,
                    GoalDimension::PositivityPercent => counts.positivity_percent = value,
                    GoalDimension::StreakLength => counts.streak_length = value,
                }
                let statuses = evaluate_achievements(&counts);
                let status = status(&statuses, def.id);
                assert_eq!(status.achieved, value >= def.goal, "{} at {value}", def.id);
                assert_eq!(status.remaining, def.goal.saturating_sub(value));
            }
        }
    }

    #[test]
    fn evaluation_preserves_table_order() {
        let statuses = evaluate_achievements(&AchievementCounts::default());
        let ids: Vec<_> = statuses.iter().map(|s| s.id).collect();
        let expected: Vec<_> = ACHIEVEMENTS.iter().map(|d| d.id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn current_milestone_is_highest_achieved_goal() {
        let counts = AchievementCounts {
            total_entries: 12,
            ..Default::default()
        };
        let progress = dimension_milestones(GoalDimension::EntryCount, &counts);
        assert_eq!(progress.current, Some(10));
        assert_eq!(progress.next, Some(50));
        assert_eq!(progress.remaining_to_next, Some(38));
    }

    #[test]
    fn milestones_before_first_and_after_last_tier() {
        assert_eq!(
            streak_milestone(0),
            MilestoneProgress {
                current: None,
                next: Some(3),
                remaining_to_next: Some(3),
            }
        );
        let beyond = streak_milestone(150);
        assert_eq!(beyond.current, Some(100));
        assert_eq!(beyond.next, None);
        assert_eq!(beyond.remaining_to_next, None);
    }

    #[test]
    fn milestone_progress_ignores_goal_order() {
        let progress = milestone_progress([30, 3, 14, 7], 8);
        assert_eq!(progress.current, Some(7));
        assert_eq!(progress.next, Some(14));
    }

    #[test]
    fn every_dimension_has_at_least_one_definition() {
        for dimension in GoalDimension::iter() {
            assert!(ACHIEVEMENTS.iter().any(|def| def.dimension == dimension));
        }
    }
}
