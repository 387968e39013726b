//! Role capability table: what each role may do given the current game.
//!
//! Everything role-specific lives here. The rest of the engine asks this
//! module instead of matching on roles itself.

use std::collections::BTreeSet;

use crate::game::Game;
use crate::models::{
    ActionKind, AvailableAction, DeathCause, DisabledReason, NightView, Phase, Player, Role,
};

/// What a death sets in motion for the dead player's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathHook {
    /// Preempt the current flow for a last shot.
    HunterShot,
}

pub fn on_death(player: &Player, _cause: DeathCause) -> Option<DeathHook> {
    match player.role {
        Some(role) if role.interrupts_on_death() && !player.hunter_resolved => {
            Some(DeathHook::HunterShot)
        }
        _ => None,
    }
}

pub fn acts_while_dead(player: &Player) -> bool {
    player.role.is_some_and(|role| role.acts_while_dead())
}

/// What passing on a turn means for the role that passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipEffect {
    /// Nobody is protected tonight.
    GuardRests,
    /// Both potions stay in the bottle tonight.
    WitchRests,
    /// The last shot is not taken.
    HunterPasses,
}

pub fn skip_effect(role: Role) -> Option<SkipEffect> {
    match role {
        Role::Guard => Some(SkipEffect::GuardRests),
        Role::Witch => Some(SkipEffect::WitchRests),
        Role::Hunter => Some(SkipEffect::HunterPasses),
        Role::Villager | Role::Wolf | Role::Seer => None,
    }
}

/// Night facts the player's role entitles them to.
pub fn night_view(game: &Game, player: &Player) -> NightView {
    let night = &game.night;
    match player.role {
        Some(Role::Wolf) => NightView {
            wolf_target: night.wolf_target.clone(),
            wolf_proposals: night.wolf_proposals.clone(),
            ..Default::default()
        },
        Some(Role::Guard) => NightView {
            guard_target: night.guard_target.clone(),
            guard_last_target: night.last_guard_target.clone(),
            ..Default::default()
        },
        Some(Role::Witch) => NightView {
            // 魔女は自分の番にだけ犠牲者を知る
            wolf_target: if game.phase == Phase::NightWitch {
                night.wolf_target.clone()
            } else {
                None
            },
            save_available: Some(!night.save_used),
            poison_available: Some(!night.poison_used),
            ..Default::default()
        },
        Some(Role::Seer) => NightView {
            inspections: night.inspections.clone(),
            ..Default::default()
        },
        Some(Role::Villager | Role::Hunter) | None => NightView::default(),
    }
}

/// Night phases for the roles present, lowest priority first, one per role.
pub fn night_flow(roles: impl IntoIterator<Item = Role>) -> Vec<Phase> {
    let mut present: Vec<Role> = roles
        .into_iter()
        .filter(Role::can_act_at_night)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    present.sort_by_key(|role| role.night_priority());
    present
        .into_iter()
        .filter_map(|role| role.night_phase())
        .collect()
}

/// The action menu for `player`. Pure function of game state.
pub fn available_actions(game: &Game, player: &Player) -> Vec<AvailableAction> {
    let Some(role) = player.role else {
        return Vec::new();
    };

    if role == Role::Hunter {
        return hunter_actions(game, player);
    }

    let Some(own_phase) = role.night_phase() else {
        return Vec::new();
    };
    if player.is_dead || !game.phase.is_night() || game.phase == Phase::NightStart {
        return Vec::new();
    }

    let mut actions = match role {
        Role::Wolf => wolf_actions(game),
        Role::Guard => guard_actions(game, player),
        Role::Witch => witch_actions(game, player),
        Role::Seer => seer_actions(game, player),
        Role::Villager | Role::Hunter => Vec::new(),
    };

    if game.phase != own_phase {
        for action in &mut actions {
            action.disabled = Some(DisabledReason::NotYourTurn);
        }
    }
    actions
}

fn disable_dead(game: &Game, action: &mut AvailableAction) {
    for p in game.players.iter().filter(|p| p.is_dead) {
        action.disable_target(&p.id, DisabledReason::TargetDead);
    }
}

fn wolf_actions(game: &Game) -> Vec<AvailableAction> {
    let acted = game.night.wolves_acted();
    let mut kill = AvailableAction::new(ActionKind::Kill, true)
        .disabled(acted.then_some(DisabledReason::AlreadyActed));
    disable_dead(game, &mut kill);
    vec![kill]
}

fn guard_actions(game: &Game, player: &Player) -> Vec<AvailableAction> {
    let acted = game.night.guard_acted.then_some(DisabledReason::AlreadyActed);
    let mut protect = AvailableAction::new(ActionKind::Protect, true).disabled(acted);
    protect.disable_target(&player.id, DisabledReason::SelfTarget);
    for p in &game.players {
        if let Some(reason) = game.night.protect_block(&p.id) {
            protect.disable_target(&p.id, reason);
        }
    }
    disable_dead(game, &mut protect);
    let skip = AvailableAction::new(ActionKind::Skip, false).disabled(acted);
    vec![protect, skip]
}

fn witch_actions(game: &Game, player: &Player) -> Vec<AvailableAction> {
    let acted = game.night.witch_acted.then_some(DisabledReason::AlreadyActed);

    let mut save = AvailableAction::new(ActionKind::Save, true)
        .disabled(acted.or_else(|| game.night.save_block()));
    for p in &game.players {
        if game.night.wolf_target.as_deref() != Some(p.id.as_str()) {
            save.disable_target(&p.id, DisabledReason::NotTheVictim);
        }
    }

    let mut poison = AvailableAction::new(ActionKind::Poison, true)
        .disabled(acted.or_else(|| game.night.poison_block()));
    poison.disable_target(&player.id, DisabledReason::SelfTarget);
    disable_dead(game, &mut poison);

    let skip = AvailableAction::new(ActionKind::Skip, false).disabled(acted);
    vec![save, poison, skip]
}

fn seer_actions(game: &Game, player: &Player) -> Vec<AvailableAction> {
    let acted = game
        .night
        .seer_target
        .is_some()
        .then_some(DisabledReason::AlreadyActed);
    let mut inspect = AvailableAction::new(ActionKind::Inspect, true).disabled(acted);
    inspect.disable_target(&player.id, DisabledReason::SelfTarget);
    disable_dead(game, &mut inspect);
    vec![inspect]
}

fn hunter_actions(game: &Game, player: &Player) -> Vec<AvailableAction> {
    let deciding = game.phase == Phase::DayHunterDecide
        && game.hunter_dead_id.as_deref() == Some(player.id.as_str());
    if !deciding {
        return Vec::new();
    }
    let mut shoot = AvailableAction::new(ActionKind::Shoot, true);
    shoot.disable_target(&player.id, DisabledReason::SelfTarget);
    disable_dead(game, &mut shoot);
    vec![shoot, AvailableAction::new(ActionKind::Skip, false)]
}
