//! Token Ledger Interface
//!
//! The engine reaches the reward token only through [`TokenLedger`]. The
//! in-memory implementation enforces the same rules a deployed token does:
//! a hard supply cap on every mint, balances and allowances on transfers.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::{Address, TokenAmount};

/// Token operation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Mint would exceed the cap.
    #[error("max supply exceeded: requested {requested}, available {available}")]
    MaxSupplyExceeded {
        /// Mint amount.
        requested: TokenAmount,
        /// Remaining headroom.
        available: TokenAmount,
    },
    /// Not enough balance.
    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance {
        /// Required.
        needed: TokenAmount,
        /// Held.
        available: TokenAmount,
    },
    /// Not enough allowance.
    #[error("insufficient allowance: need {needed}, have {available}")]
    InsufficientAllowance {
        /// Required.
        needed: TokenAmount,
        /// Approved.
        available: TokenAmount,
    },
}

/// What the engine may do with the reward token.
pub trait TokenLedger: Send + Sync {
    /// Tokens in circulation.
    fn total_supply(&self) -> TokenAmount;

    /// Hard cap.
    fn max_supply(&self) -> TokenAmount;

    /// Balance of an account.
    fn balance_of(&self, owner: &Address) -> TokenAmount;

    /// Amount `spender` may move out of `owner`.
    fn allowance(&self, owner: &Address, spender: &Address) -> TokenAmount;

    /// Move tokens using `spender`'s allowance.
    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<(), TokenError>;

    /// Create tokens. Fails if the cap would be exceeded.
    fn mint(&mut self, to: &Address, amount: TokenAmount) -> Result<(), TokenError>;

    /// Destroy tokens held by `from`.
    fn burn(&mut self, from: &Address, amount: TokenAmount) -> Result<(), TokenError>;

    /// Room left under the cap.
    fn headroom(&self) -> TokenAmount {
        self.max_supply().saturating_sub(self.total_supply())
    }
}

/// In-process token with a supply cap.
#[derive(Clone, Debug)]
pub struct InMemoryTokenLedger {
    max_supply: TokenAmount,
    total_supply: TokenAmount,
    balances: BTreeMap<Address, TokenAmount>,
    allowances: BTreeMap<(Address, Address), TokenAmount>,
}

impl InMemoryTokenLedger {
    /// Empty token with a cap.
    pub fn new(max_supply: TokenAmount) -> Self {
        Self {
            max_supply,
            total_supply: 0,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        }
    }

    /// Set `spender`'s allowance over `owner`'s tokens.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: TokenAmount) {
        self.allowances.insert((*owner, *spender), amount);
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn total_supply(&self) -> TokenAmount {
        self.total_supply
    }

    fn max_supply(&self) -> TokenAmount {
        self.max_supply
    }

    fn balance_of(&self, owner: &Address) -> TokenAmount {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> TokenAmount {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<(), TokenError> {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance { needed: amount, available: allowed });
        }
        let held = self.balance_of(from);
        if held < amount {
            return Err(TokenError::InsufficientBalance { needed: amount, available: held });
        }

        self.allowances.insert((*from, *spender), allowed - amount);
        self.balances.insert(*from, held - amount);
        *self.balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }

    fn mint(&mut self, to: &Address, amount: TokenAmount) -> Result<(), TokenError> {
        let available = self.headroom();
        if amount > available {
            return Err(TokenError::MaxSupplyExceeded { requested: amount, available });
        }
        self.total_supply += amount;
        *self.balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }

    fn burn(&mut self, from: &Address, amount: TokenAmount) -> Result<(), TokenError> {
        let held = self.balance_of(from);
        if held < amount {
            return Err(TokenError::InsufficientBalance { needed: amount, available: held });
        }
        self.balances.insert(*from, held - amount);
        self.total_supply -= amount;
        Ok(())
    }
}
