//! Per-night action buffer and death resolution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{DeathCause, DisabledReason, InspectionRecord, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WitchChoice {
    Save,
    Poison,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitchAction {
    pub choice: WitchChoice,
    pub target_id: PlayerId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NightOutcome {
    /// In order: the wolves' victim, then the poisoned player.
    pub deaths: Vec<PlayerId>,
    pub poisoned: Option<PlayerId>,
    /// The wolves' victim was saved or protected.
    pub kill_prevented: bool,
}

impl NightOutcome {
    pub fn cause_of(&self, player_id: &str) -> DeathCause {
        if self.poisoned.as_deref() == Some(player_id) {
            DeathCause::Poison
        } else {
            DeathCause::Wolves
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NightState {
    // この夜のアクション
    pub wolf_proposals: BTreeMap<PlayerId, PlayerId>,
    pub wolf_target: Option<PlayerId>,
    pub guard_target: Option<PlayerId>,
    pub guard_acted: bool,
    pub witch_action: Option<WitchAction>,
    pub witch_acted: bool,
    pub seer_target: Option<PlayerId>,
    // ゲームを通して一度きり
    pub save_used: bool,
    pub poison_used: bool,
    pub last_guard_target: Option<PlayerId>,
    pub inspections: Vec<InspectionRecord>,
}

impl NightState {
    /// Clears the per-night buffer. One-shot flags and history survive.
    pub fn begin_night(&mut self) {
        self.wolf_proposals.clear();
        self.wolf_target = None;
        self.guard_target = None;
        self.guard_acted = false;
        self.witch_action = None;
        self.witch_acted = false;
        self.seer_target = None;
    }

    pub fn propose(&mut self, wolf_id: &str, target_id: &str) {
        self.wolf_proposals
            .insert(wolf_id.to_string(), target_id.to_string());
    }

    pub fn wolves_acted(&self) -> bool {
        self.wolf_target.is_some()
    }

    pub fn commit_kill(&mut self, target_id: &str) -> Result<(), DisabledReason> {
        if self.wolves_acted() {
            return Err(DisabledReason::AlreadyActed);
        }
        self.wolf_target = Some(target_id.to_string());
        Ok(())
    }

    pub fn protect_block(&self, target_id: &str) -> Option<DisabledReason> {
        if self.last_guard_target.as_deref() == Some(target_id) {
            Some(DisabledReason::SameAsLastNight)
        } else {
            None
        }
    }

    /// `None` means the guard chose to protect nobody tonight.
    pub fn protect(&mut self, target_id: Option<&str>) -> Result<(), DisabledReason> {
        if self.guard_acted {
            return Err(DisabledReason::AlreadyActed);
        }
        if let Some(reason) = target_id.and_then(|t| self.protect_block(t)) {
            return Err(reason);
        }
        self.guard_target = target_id.map(str::to_string);
        self.guard_acted = true;
        Ok(())
    }

    /// Reason the save potion cannot be used at all tonight.
    pub fn save_block(&self) -> Option<DisabledReason> {
        if self.save_used {
            Some(DisabledReason::PotionUsed)
        } else if self.wolf_target.is_none() {
            Some(DisabledReason::NoVictim)
        } else {
            None
        }
    }

    pub fn poison_block(&self) -> Option<DisabledReason> {
        self.poison_used.then_some(DisabledReason::PotionUsed)
    }

    pub fn witch(&mut self, choice: WitchChoice, target_id: &str) -> Result<(), DisabledReason> {
        if self.witch_acted {
            return Err(DisabledReason::AlreadyActed);
        }
        match choice {
            WitchChoice::Save => {
                if let Some(reason) = self.save_block() {
                    return Err(reason);
                }
                if self.wolf_target.as_deref() != Some(target_id) {
                    return Err(DisabledReason::NotTheVictim);
                }
                self.save_used = true;
            }
            WitchChoice::Poison => {
                if let Some(reason) = self.poison_block() {
                    return Err(reason);
                }
                self.poison_used = true;
            }
        }
        self.witch_action = Some(WitchAction {
            choice,
            target_id: target_id.to_string(),
        });
        self.witch_acted = true;
        Ok(())
    }

    pub fn witch_skip(&mut self) -> Result<(), DisabledReason> {
        if self.witch_acted {
            return Err(DisabledReason::AlreadyActed);
        }
        self.witch_acted = true;
        Ok(())
    }

    pub fn inspect(&mut self, round: u32, target_id: &str, is_wolf: bool) -> Result<(), DisabledReason> {
        if self.seer_target.is_some() {
            return Err(DisabledReason::AlreadyActed);
        }
        self.seer_target = Some(target_id.to_string());
        self.inspections.push(InspectionRecord {
            round,
            target_id: target_id.to_string(),
            is_wolf,
        });
        Ok(())
    }

    fn saved(&self) -> Option<&str> {
        match &self.witch_action {
            Some(WitchAction {
                choice: WitchChoice::Save,
                target_id,
            }) => Some(target_id),
            _ => None,
        }
    }

    fn poisoned(&self) -> Option<&str> {
        match &self.witch_action {
            Some(WitchAction {
                choice: WitchChoice::Poison,
                target_id,
            }) => Some(target_id),
            _ => None,
        }
    }

    /// Computes tonight's deaths and rolls the guard's target into
    /// `last_guard_target`. Runs once per night, after every night phase.
    pub fn resolve(&mut self) -> NightOutcome {
        let mut outcome = NightOutcome::default();

        if let Some(victim) = self.wolf_target.as_deref() {
            let saved = self.saved() == Some(victim);
            let guarded = self.guard_target.as_deref() == Some(victim);
            if saved || guarded {
                outcome.kill_prevented = true;
            } else {
                outcome.deaths.push(victim.to_string());
            }
        }

        if let Some(poisoned) = self.poisoned() {
            if !outcome.deaths.iter().any(|d| d == poisoned) {
                outcome.deaths.push(poisoned.to_string());
            }
            outcome.poisoned = Some(poisoned.to_string());
        }

        self.last_guard_target = self.guard_target.clone();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_victim_survives() {
        let mut night = NightState::default();
        night.commit_kill("v").unwrap();
        night.witch(WitchChoice::Save, "v").unwrap();
        let outcome = night.resolve();
        assert!(outcome.deaths.is_empty());
        assert!(outcome.kill_prevented);
        assert_eq!(outcome.poisoned, None);
    }

    #[test]
    fn poison_kills_independently_of_wolves() {
        let mut night = NightState::default();
        night.commit_kill("v").unwrap();
        night.witch(WitchChoice::Poison, "p").unwrap();
        let outcome = night.resolve();
        assert_eq!(outcome.deaths, vec!["v".to_string(), "p".to_string()]);
        assert_eq!(outcome.poisoned.as_deref(), Some("p"));
        assert_eq!(outcome.cause_of("p"), DeathCause::Poison);
        assert_eq!(outcome.cause_of("v"), DeathCause::Wolves);
    }

    #[test]
    fn poisoning_the_victim_lists_them_once() {
        let mut night = NightState::default();
        night.commit_kill("v").unwrap();
        night.witch(WitchChoice::Poison, "v").unwrap();
        let outcome = night.resolve();
        assert_eq!(outcome.deaths, vec!["v".to_string()]);
        assert_eq!(outcome.cause_of("v"), DeathCause::Poison);
    }

    #[test]
    fn potions_are_single_use_across_nights() {
        let mut night = NightState::default();
        night.commit_kill("a").unwrap();
        night.witch(WitchChoice::Save, "a").unwrap();
        night.resolve();

        night.begin_night();
        night.commit_kill("b").unwrap();
        assert_eq!(night.witch(WitchChoice::Save, "b"), Err(DisabledReason::PotionUsed));
        night.witch(WitchChoice::Poison, "c").unwrap();
        night.resolve();

        night.begin_night();
        assert_eq!(night.witch(WitchChoice::Poison, "d"), Err(DisabledReason::PotionUsed));
    }

    #[test]
    fn save_must_target_the_victim() {
        let mut night = NightState::default();
        assert_eq!(night.witch(WitchChoice::Save, "x"), Err(DisabledReason::NoVictim));
        night.commit_kill("v").unwrap();
        assert_eq!(night.witch(WitchChoice::Save, "x"), Err(DisabledReason::NotTheVictim));
        assert!(!night.save_used);
    }

    #[test]
    fn guard_cannot_repeat_target_on_consecutive_nights() {
        let mut night = NightState::default();
        night.protect(Some("a")).unwrap();
        night.commit_kill("a").unwrap();
        let outcome = night.resolve();
        assert!(outcome.deaths.is_empty());

        night.begin_night();
        assert_eq!(night.protect(Some("a")), Err(DisabledReason::SameAsLastNight));
        night.protect(None).unwrap();
        night.resolve();

        // skipping a night clears the restriction
        night.begin_night();
        night.protect(Some("a")).unwrap();
    }

    #[test]
    fn each_role_acts_once_per_night() {
        let mut night = NightState::default();
        night.commit_kill("a").unwrap();
        assert_eq!(night.commit_kill("b"), Err(DisabledReason::AlreadyActed));
        night.witch_skip().unwrap();
        assert_eq!(night.witch(WitchChoice::Poison, "b"), Err(DisabledReason::AlreadyActed));
        night.inspect(1, "a", false).unwrap();
        assert_eq!(night.inspect(1, "b", true), Err(DisabledReason::AlreadyActed));
        assert_eq!(night.wolf_target.as_deref(), Some("a"));
    }
}
