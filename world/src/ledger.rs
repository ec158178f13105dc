//! Money, health and round bookkeeping.

use std::collections::BTreeSet;

use team_defence_core::{LedgerSnapshot, RoundNumber};

/// Amount a debit fell short by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Shortfall {
    pub(crate) available: i64,
}

/// Economy state owned by the world.
#[derive(Debug)]
pub(crate) struct Ledger {
    money: i64,
    health: i64,
    round: RoundNumber,
    active_rounds: BTreeSet<RoundNumber>,
    early_start: Option<u32>,
    depleted: bool,
}

impl Ledger {
    pub(crate) fn new(money: i64, health: i64) -> Self {
        Self {
            money,
            health,
            round: RoundNumber::new(0),
            active_rounds: BTreeSet::new(),
            early_start: None,
            depleted: health <= 0,
        }
    }

    pub(crate) fn money(&self) -> i64 {
        self.money
    }

    pub(crate) fn credit(&mut self, amount: i64) {
        self.money = self.money.saturating_add(amount);
    }

    /// Debits `amount`, refusing when the balance would drop below zero.
    pub(crate) fn spend(&mut self, amount: u32) -> Result<(), Shortfall> {
        let amount = i64::from(amount);
        match self.money.checked_sub(amount) {
            Some(remaining) if remaining >= 0 => {
                self.money = remaining;
                Ok(())
            }
            _ => Err(Shortfall {
                available: self.money,
            }),
        }
    }

    /// Removes health, returning `true` the first time it reaches zero.
    pub(crate) fn take_damage(&mut self, amount: u32) -> bool {
        self.health = self.health.saturating_sub(i64::from(amount));
        if self.health <= 0 && !self.depleted {
            self.depleted = true;
            return true;
        }
        false
    }

    pub(crate) fn round(&self) -> RoundNumber {
        self.round
    }

    pub(crate) fn begin_round(&mut self, round: RoundNumber) {
        self.round = round;
        let _ = self.active_rounds.insert(round);
        self.early_start = None;
    }

    /// Retires an active round, returning `false` when it was not active.
    pub(crate) fn finish_round(&mut self, round: RoundNumber) -> bool {
        self.active_rounds.remove(&round)
    }

    pub(crate) fn has_active_rounds(&self) -> bool {
        !self.active_rounds.is_empty()
    }

    pub(crate) fn active_rounds(&self) -> impl Iterator<Item = RoundNumber> + '_ {
        self.active_rounds.iter().copied()
    }

    pub(crate) fn early_start(&self) -> Option<u32> {
        self.early_start
    }

    pub(crate) fn set_early_start(&mut self, bonus: Option<u32>) {
        self.early_start = bonus;
    }

    pub(crate) fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            money: self.money,
            health: self.health,
            round: self.round,
            active_rounds: u32::try_from(self.active_rounds.len()).unwrap_or(u32::MAX),
            early_start: self.early_start,
        }
    }
}
