//! Turns a player count and optional role counts into a shuffled deck.

use rand::seq::SliceRandom;
use rand::RngCore;
use tracing::info;

use crate::models::{Role, RoleConfig};

pub const MIN_PLAYERS: usize = 4;

/// Tiered defaults when the host did not pick roles.
pub fn default_roles(player_count: usize) -> RoleConfig {
    match player_count {
        0..=5 => RoleConfig {
            wolves: 1,
            seer: true,
            witch: true,
            guard: false,
            hunter: false,
        },
        6..=8 => RoleConfig {
            wolves: 2,
            seer: true,
            witch: true,
            guard: false,
            hunter: false,
        },
        9..=11 => RoleConfig {
            wolves: 2,
            seer: true,
            witch: true,
            guard: false,
            hunter: true,
        },
        _ => RoleConfig {
            wolves: 2,
            seer: true,
            witch: true,
            guard: true,
            hunter: true,
        },
    }
}

fn special_count(config: &RoleConfig) -> usize {
    config.wolves
        + usize::from(config.seer)
        + usize::from(config.witch)
        + usize::from(config.guard)
        + usize::from(config.hunter)
}

/// Fits `config` into `player_count` seats.
///
/// Order: wolves capped at a third of the table, then witch, seer, hunter and
/// guard are dropped one at a time until the roles fit.
pub fn fit_roles(player_count: usize, config: &RoleConfig) -> RoleConfig {
    let mut fitted = *config;
    if special_count(&fitted) <= player_count {
        return fitted;
    }

    let cap = player_count / 3;
    if fitted.wolves > cap {
        info!(
            configured = fitted.wolves,
            cap, "too many roles for {} players, capping wolves", player_count
        );
        fitted.wolves = cap;
    }

    for role in [Role::Witch, Role::Seer, Role::Hunter, Role::Guard] {
        if special_count(&fitted) <= player_count {
            break;
        }
        let flag = match role {
            Role::Witch => &mut fitted.witch,
            Role::Seer => &mut fitted.seer,
            Role::Hunter => &mut fitted.hunter,
            _ => &mut fitted.guard,
        };
        if *flag {
            *flag = false;
            info!(%role, "too many roles for {} players, dropping", player_count);
        }
    }

    fitted
}

/// Builds a deck of exactly `player_count` roles, uniformly shuffled.
pub fn build_deck(
    player_count: usize,
    config: Option<&RoleConfig>,
    rng: &mut dyn RngCore,
) -> Vec<Role> {
    let requested = config.copied().unwrap_or_else(|| default_roles(player_count));
    let fitted = fit_roles(player_count, &requested);

    let mut deck = Vec::with_capacity(player_count);
    deck.extend(std::iter::repeat(Role::Wolf).take(fitted.wolves));
    for (present, role) in [
        (fitted.seer, Role::Seer),
        (fitted.witch, Role::Witch),
        (fitted.guard, Role::Guard),
        (fitted.hunter, Role::Hunter),
    ] {
        if present {
            deck.push(role);
        }
    }
    deck.resize(player_count, Role::Villager);
    deck.shuffle(rng);
    deck
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn count(deck: &[Role], role: Role) -> usize {
        deck.iter().filter(|r| **r == role).count()
    }

    fn all_configs() -> Vec<RoleConfig> {
        let mut configs = Vec::new();
        for wolves in 0..=6 {
            for bits in 0..16u8 {
                configs.push(RoleConfig {
                    wolves,
                    seer: bits & 1 != 0,
                    witch: bits & 2 != 0,
                    guard: bits & 4 != 0,
                    hunter: bits & 8 != 0,
                });
            }
        }
        configs
    }

    #[test]
    fn deck_always_has_one_role_per_player() {
        let mut rng = StdRng::seed_from_u64(11);
        for n in 0..=16 {
            assert_eq!(build_deck(n, None, &mut rng).len(), n);
            for config in all_configs() {
                assert_eq!(build_deck(n, Some(&config), &mut rng).len(), n);
            }
        }
    }

    #[test]
    fn explicit_counts_are_kept_when_they_fit() {
        let mut rng = StdRng::seed_from_u64(5);
        let config = RoleConfig {
            wolves: 2,
            seer: true,
            witch: true,
            guard: true,
            hunter: false,
        };
        let deck = build_deck(8, Some(&config), &mut rng);
        assert_eq!(count(&deck, Role::Wolf), 2);
        assert_eq!(count(&deck, Role::Seer), 1);
        assert_eq!(count(&deck, Role::Witch), 1);
        assert_eq!(count(&deck, Role::Guard), 1);
        assert_eq!(count(&deck, Role::Hunter), 0);
        assert_eq!(count(&deck, Role::Villager), 3);
    }

    #[test]
    fn overfull_config_caps_wolves_then_drops_witch_then_seer() {
        let config = RoleConfig {
            wolves: 4,
            seer: true,
            witch: true,
            guard: false,
            hunter: false,
        };
        // 4 wolves + 2 on 5 seats: wolves capped to 1, fits at 3
        let fitted = fit_roles(5, &config);
        assert_eq!(fitted.wolves, 1);
        assert!(fitted.seer && fitted.witch);

        // 3 seats: cap to 1 wolf, still 3 specials, fits
        let fitted = fit_roles(3, &config);
        assert_eq!((fitted.wolves, fitted.seer, fitted.witch), (1, true, true));

        // 2 seats: cap to 0 wolves, then witch goes
        let fitted = fit_roles(2, &config);
        assert_eq!((fitted.wolves, fitted.seer, fitted.witch), (0, true, true));

        let fitted = fit_roles(1, &config);
        assert_eq!((fitted.wolves, fitted.seer, fitted.witch), (0, true, false));
    }

    #[test]
    fn default_tiers_add_hunter_then_guard() {
        assert!(!default_roles(8).hunter);
        assert!(default_roles(9).hunter && !default_roles(11).guard);
        assert!(default_roles(12).guard && default_roles(12).hunter);
        assert_eq!(default_roles(5).wolves, 1);
        for n in 6..=16 {
            let tier = default_roles(n);
            assert_eq!(tier.wolves, 2, "{} players", n);
            assert!(tier.seer && tier.witch);
        }
    }

    #[test]
    fn shuffle_varies_between_games() {
        let mut rng = StdRng::seed_from_u64(99);
        let first = build_deck(12, None, &mut rng);
        let differs = (0..20).any(|_| build_deck(12, None, &mut rng) != first);
        assert!(differs);
    }
}
