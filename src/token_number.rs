//! Human-readable token numbers such as `#J0042`.
//!
//! The letter encodes the hour of issue (`A` = midnight) and the digits are a
//! running sequence across all departments and days.

use crate::store::ClinicStore;
use chrono::{DateTime, Local, Timelike};

/// Format a token number from an hour of day and a sequence number.
pub fn format_token_number(hour: u32, sequence: u64) -> String {
    let letter = (b'A' + (hour % 24) as u8) as char;
    format!("#{}{:04}", letter, sequence)
}

/// Stamps new tokens using the store's sequence counter.
pub struct TokenNumberGenerator<'a, S: ClinicStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ClinicStore + ?Sized> TokenNumberGenerator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        TokenNumberGenerator { store }
    }

    /// Reserve the next sequence and format it for the hour of `now`.
    ///
    /// Returns the token string together with the reserved sequence.
    pub fn next(&self, now: DateTime<Local>) -> (String, u64) {
        let sequence = self.store.next_token_sequence();
        (format_token_number(now.hour(), sequence), sequence)
    }
}
