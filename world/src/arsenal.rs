//! Player gun selection and temporary powerup overrides.

use std::time::Duration;

use grid_assault_core::{GunKind, PowerupGrant};

/// Persisted gun choice plus an optional override that shadows it.
#[derive(Debug, Default)]
pub(crate) struct Arsenal {
    selected: GunKind,
    powerup: Option<Powerup>,
}

#[derive(Clone, Copy, Debug)]
struct Powerup {
    gun: GunKind,
    expiry: Expiry,
}

#[derive(Clone, Copy, Debug)]
enum Expiry {
    At(Duration),
    ShotsLeft(u32),
}

impl Arsenal {
    /// The persisted gun choice.
    pub(crate) fn selected(&self) -> GunKind {
        self.selected
    }

    /// The gun currently in effect, accounting for an active override.
    pub(crate) fn effective(&self) -> GunKind {
        self.powerup.map_or(self.selected, |powerup| powerup.gun)
    }

    pub(crate) fn select(&mut self, gun: GunKind) {
        self.selected = gun;
    }

    /// Installs an override; a fresh grant replaces any previous one.
    pub(crate) fn grant(&mut self, gun: GunKind, grant: PowerupGrant, now: Duration) {
        let expiry = match grant {
            PowerupGrant::Timed(duration) => Expiry::At(now.saturating_add(duration)),
            PowerupGrant::Shots(count) => Expiry::ShotsLeft(count.max(1)),
        };
        self.powerup = Some(Powerup { gun, expiry });
    }

    /// Accounts one accepted shot against a shot-counted override.
    ///
    /// Returns the gun the selection reverted to when the override lapsed.
    pub(crate) fn consume_shot(&mut self) -> Option<GunKind> {
        let lapsed = match self.powerup.as_mut() {
            Some(Powerup {
                expiry: Expiry::ShotsLeft(left),
                ..
            }) => {
                *left = left.saturating_sub(1);
                *left == 0
            }
            _ => false,
        };
        if lapsed {
            self.powerup = None;
            return Some(self.selected);
        }
        None
    }

    /// Lapses a timed override once the session clock passes its deadline.
    pub(crate) fn expire_by_clock(&mut self, now: Duration) -> Option<GunKind> {
        if let Some(Powerup {
            expiry: Expiry::At(deadline),
            ..
        }) = self.powerup
        {
            if now >= deadline {
                self.powerup = None;
                return Some(self.selected);
            }
        }
        None
    }

    pub(crate) fn clear_powerup(&mut self) {
        self.powerup = None;
    }
}
