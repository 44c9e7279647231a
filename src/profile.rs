use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::trainer::Phase;

/// Training level selected by the user
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

/// Static schedule for one difficulty level.
///
/// Phase lengths are in seconds. `sets_per_session` may be fractional (the
/// published ranges are "2-3 sets"), the controller iterates its ceiling.
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyProfile {
    pub name: &'static str,
    pub contract_secs: f64,
    pub relax_secs: f64,
    pub reps_per_set: u32,
    pub sets_per_session: f64,
    pub total_time_minutes: f64,
    pub progression_threshold: u32,
    pub progression_weeks: &'static str,
    pub description: &'static str,
}

const BEGINNER: DifficultyProfile = DifficultyProfile {
    name: "Beginner (Basic Adaptation)",
    contract_secs: 3.0,
    relax_secs: 5.5,
    reps_per_set: 12,
    sets_per_session: 2.5,
    total_time_minutes: 7.5,
    progression_threshold: 30,
    progression_weeks: "2-4",
    description: "Contract 2-4s, relax 5-6s. Sit or lie down to reduce muscle compensation. \
                  Move on after 30 sessions or three easy sessions in a row.",
};

const INTERMEDIATE: DifficultyProfile = DifficultyProfile {
    name: "Intermediate (Strengthening Phase)",
    contract_secs: 6.0,
    relax_secs: 4.0,
    reps_per_set: 17,
    sets_per_session: 3.5,
    total_time_minutes: 12.5,
    progression_threshold: 70,
    progression_weeks: "4-6",
    description: "Contract 5-7s, relax 3-5s. Try standing or walking to build core stability. \
                  Move on after 70 sessions or five easy sessions in a row.",
};

const ADVANCED: DifficultyProfile = DifficultyProfile {
    name: "Advanced (High-level Optimization)",
    contract_secs: 9.0,
    relax_secs: 2.5,
    reps_per_set: 25,
    sets_per_session: 4.5,
    total_time_minutes: 17.5,
    progression_threshold: 200,
    progression_weeks: "8-12",
    description: "Contract 8-10s, relax 2-3s. Mix postures such as knee-chest to add difficulty. \
                  Keep this level long term once 200 sessions are done.",
};

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn profile(&self) -> &'static DifficultyProfile {
        match self {
            Difficulty::Beginner => &BEGINNER,
            Difficulty::Intermediate => &INTERMEDIATE,
            Difficulty::Advanced => &ADVANCED,
        }
    }

    /// Level unlocked after reaching this level's progression threshold
    pub fn next(&self) -> Option<Difficulty> {
        match self {
            Difficulty::Beginner => Some(Difficulty::Intermediate),
            Difficulty::Intermediate => Some(Difficulty::Advanced),
            Difficulty::Advanced => None,
        }
    }

    pub fn cycle_next(&self) -> Difficulty {
        self.next().unwrap_or(Difficulty::Beginner)
    }

    pub fn cycle_prev(&self) -> Difficulty {
        match self {
            Difficulty::Beginner => Difficulty::Advanced,
            Difficulty::Intermediate => Difficulty::Beginner,
            Difficulty::Advanced => Difficulty::Intermediate,
        }
    }
}

fn secs_to_ms(secs: f64) -> u64 {
    (secs * 1000.0).round() as u64
}

impl DifficultyProfile {
    /// Number of sets actually iterated (2.5 -> 3)
    pub fn sets_to_complete(&self) -> u32 {
        self.sets_per_session.ceil() as u32
    }

    pub fn total_reps(&self) -> u32 {
        self.reps_per_set * self.sets_to_complete()
    }

    pub fn contract_ms(&self) -> u64 {
        secs_to_ms(self.contract_secs)
    }

    pub fn relax_ms(&self) -> u64 {
        secs_to_ms(self.relax_secs)
    }

    /// Length of a phase in milliseconds; `Ready` has none.
    pub fn phase_duration_ms(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Ready => 0,
            Phase::Contract => self.contract_ms(),
            Phase::Relax => self.relax_ms(),
        }
    }

    pub fn phase_duration(&self, phase: Phase) -> f64 {
        self.phase_duration_ms(phase) as f64 / 1000.0
    }

    /// Active exercise time of a full session, excluding pauses between sets
    pub fn session_seconds(&self) -> f64 {
        (self.contract_secs + self.relax_secs)
            * self.reps_per_set as f64
            * self.sets_to_complete() as f64
    }

    /// Panics when the profile cannot drive a session.
    ///
    /// Profiles are compiled-in configuration, so a broken one is a
    /// programming error rather than something to recover from.
    pub fn assert_valid(&self) {
        assert!(
            self.contract_ms() > 0,
            "profile {:?}: contract phase must be longer than 0s",
            self.name
        );
        assert!(
            self.relax_ms() > 0,
            "profile {:?}: relax phase must be longer than 0s",
            self.name
        );
        assert!(
            self.reps_per_set > 0,
            "profile {:?}: reps per set must be positive",
            self.name
        );
        assert!(
            self.sets_per_session > 0.0,
            "profile {:?}: sets per session must be positive",
            self.name
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_profiles_are_valid() {
        for d in Difficulty::ALL {
            d.profile().assert_valid();
        }
    }

    #[test]
    fn test_sets_round_up() {
        assert_eq!(Difficulty::Beginner.profile().sets_to_complete(), 3);
        assert_eq!(Difficulty::Intermediate.profile().sets_to_complete(), 4);
        assert_eq!(Difficulty::Advanced.profile().sets_to_complete(), 5);
    }

    #[test]
    fn test_beginner_session_length() {
        let p = Difficulty::Beginner.profile();
        assert_eq!(p.total_reps(), 36);
        assert_eq!(p.session_seconds(), 306.0);
        assert_eq!(p.phase_duration_ms(Phase::Relax), 5500);
        assert_eq!(p.phase_duration(Phase::Ready), 0.0);
    }

    #[test]
    fn test_next_and_cycle() {
        assert_eq!(Difficulty::Beginner.next(), Some(Difficulty::Intermediate));
        assert_eq!(Difficulty::Advanced.next(), None);
        assert_eq!(Difficulty::Advanced.cycle_next(), Difficulty::Beginner);
        assert_eq!(Difficulty::Beginner.cycle_prev(), Difficulty::Advanced);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(
            Difficulty::from_str("Advanced", true),
            Ok(Difficulty::Advanced)
        );
        assert!(Difficulty::from_str("expert", true).is_err());
        assert_eq!(Difficulty::Intermediate.to_string(), "intermediate");
        assert_eq!(
            serde_json::to_string(&Difficulty::Beginner).unwrap(),
            "\"beginner\""
        );
    }

    #[test]
    #[should_panic(expected = "contract phase")]
    fn test_zero_length_phase_fails_fast() {
        let broken = DifficultyProfile {
            contract_secs: 0.0,
            ..Difficulty::Beginner.profile().clone()
        };
        broken.assert_valid();
    }
}
