use crate::profile::Difficulty;

/// How far the user is from unlocking the next level
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionInfo {
    pub difficulty: Difficulty,
    pub completed: u32,
    pub remaining: u32,
    pub progress_percent: f64,
    pub can_progress: bool,
    /// Level to suggest; only set once the threshold is reached
    pub next: Option<Difficulty>,
}

impl ProgressionInfo {
    pub fn new(difficulty: Difficulty, completed_sessions: u32) -> Self {
        let threshold = difficulty.profile().progression_threshold;
        let can_progress = completed_sessions >= threshold;
        let progress_percent =
            (completed_sessions as f64 / threshold.max(1) as f64 * 100.0).min(100.0);

        Self {
            difficulty,
            completed: completed_sessions,
            remaining: threshold.saturating_sub(completed_sessions),
            progress_percent,
            can_progress,
            next: if can_progress { difficulty.next() } else { None },
        }
    }

    pub fn suggestion(&self) -> Option<String> {
        self.next.map(|next| {
            format!(
                "{} sessions done at {}: ready for {}",
                self.completed,
                self.difficulty,
                next.profile().name
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_below_threshold() {
        let info = ProgressionInfo::new(Difficulty::Beginner, 12);
        assert_eq!(info.remaining, 18);
        assert_eq!(info.progress_percent, 40.0);
        assert!(!info.can_progress);
        assert_eq!(info.next, None);
        assert_eq!(info.suggestion(), None);
    }

    #[test]
    fn test_progress_unlocks_next_level() {
        let info = ProgressionInfo::new(Difficulty::Intermediate, 75);
        assert_eq!(info.remaining, 0);
        assert_eq!(info.progress_percent, 100.0);
        assert!(info.can_progress);
        assert_eq!(info.next, Some(Difficulty::Advanced));
        assert!(info.suggestion().unwrap().contains("Advanced"));
    }

    #[test]
    fn test_advanced_has_no_next_level() {
        let info = ProgressionInfo::new(Difficulty::Advanced, 250);
        assert!(info.can_progress);
        assert_eq!(info.next, None);
    }
}
