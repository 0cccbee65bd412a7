//! Set of held tokens, stored as index-aligned parallel sequences.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::domain::Decimal;

/// One token held by a fund or investor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    /// Cached amount in whole-token units.
    pub amount: Decimal,
}

/// Token membership keyed by address.
///
/// Addresses, symbols, decimals and amounts are kept in four sequences that
/// share indices. A token appears at most once; ordering carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<TokenEntry>", into = "Vec<TokenEntry>")]
pub struct TokenList {
    addresses: Vec<Address>,
    symbols: Vec<String>,
    decimals: Vec<u8>,
    amounts: Vec<Decimal>,
}

impl TokenList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn contains(&self, token: &Address) -> bool {
        self.index_of(token).is_some()
    }

    fn index_of(&self, token: &Address) -> Option<usize> {
        self.addresses.iter().position(|a| a == token)
    }

    /// Append a newly observed token with a zero amount.
    ///
    /// Returns false (and changes nothing) if the token is already a member.
    pub fn insert(&mut self, token: Address, symbol: String, decimals: u8) -> bool {
        if self.contains(&token) {
            return false;
        }
        self.addresses.push(token);
        self.symbols.push(symbol);
        self.decimals.push(decimals);
        self.amounts.push(Decimal::zero());
        true
    }

    /// Drop a token from every sequence at once.
    pub fn remove(&mut self, token: &Address) -> bool {
        match self.index_of(token) {
            Some(idx) => {
                self.addresses.swap_remove(idx);
                self.symbols.swap_remove(idx);
                self.decimals.swap_remove(idx);
                self.amounts.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn set_amount(&mut self, token: &Address, amount: Decimal) -> bool {
        match self.index_of(token) {
            Some(idx) => {
                self.amounts[idx] = amount;
                true
            }
            None => false,
        }
    }

    pub fn amount(&self, token: &Address) -> Option<Decimal> {
        self.index_of(token).map(|idx| self.amounts[idx])
    }

    pub fn decimals_of(&self, token: &Address) -> Option<u8> {
        self.index_of(token).map(|idx| self.decimals[idx])
    }

    pub fn symbol_of(&self, token: &Address) -> Option<&str> {
        self.index_of(token).map(|idx| self.symbols[idx].as_str())
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn entries(&self) -> Vec<TokenEntry> {
        (0..self.len())
            .map(|idx| TokenEntry {
                address: self.addresses[idx],
                symbol: self.symbols[idx].clone(),
                decimals: self.decimals[idx],
                amount: self.amounts[idx],
            })
            .collect()
    }
}

impl From<Vec<TokenEntry>> for TokenList {
    fn from(entries: Vec<TokenEntry>) -> Self {
        let mut list = TokenList::new();
        for entry in entries {
            if list.insert(entry.address, entry.symbol, entry.decimals) {
                list.set_amount(&entry.address, entry.amount);
            }
        }
        list
    }
}

impl From<TokenList> for Vec<TokenEntry> {
    fn from(list: TokenList) -> Self {
        list.entries()
    }
}
