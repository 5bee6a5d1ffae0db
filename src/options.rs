//! Table configuration options.

use std::time::Duration;

/// Rounding mode for payouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundingMode {
    /// Round up.
    Up,
    /// Round down.
    Down,
    /// Round to nearest.
    Nearest,
}

impl RoundingMode {
    /// Rounds a chip amount.
    #[must_use]
    pub fn apply(self, amount: f64) -> u64 {
        match self {
            Self::Up => amount.ceil() as u64,
            Self::Down => amount.floor() as u64,
            Self::Nearest => amount.round() as u64,
        }
    }
}

/// Configuration options for a blackjack table.
///
/// Use the builder pattern to customize options:
///
/// ```
/// use bjtable::TableOptions;
///
/// let options = TableOptions::default()
///     .with_seats(7)
///     .with_min_buy_in(500)
///     .without_delays();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TableOptions {
    /// Number of seats, numbered from 1.
    pub seats: u8,
    /// Smallest buy-in (and rebuy) accepted.
    pub min_buy_in: u64,
    /// Minimum bet as a fraction of the player's table limit.
    pub min_bet_ratio: f64,
    /// Blackjack payout ratio (typically 1.5).
    pub blackjack_pays: f64,
    /// Rounding mode for blackjack payouts.
    pub rounding_blackjack: RoundingMode,
    /// Dealer stands on all totals of this value or more.
    pub dealer_stands_on: u8,
    /// Pause after each player's cards are dealt.
    pub deal_delay: Duration,
    /// Pause before the hole card is revealed and between dealer draws.
    pub dealer_delay: Duration,
    /// Pause after each player's payout is credited.
    pub payout_delay: Duration,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            seats: 5,
            min_buy_in: 100,
            min_bet_ratio: 0.01,
            blackjack_pays: 1.5,
            rounding_blackjack: RoundingMode::Down,
            dealer_stands_on: 17,
            deal_delay: Duration::from_millis(300),
            dealer_delay: Duration::from_millis(1000),
            payout_delay: Duration::from_millis(300),
        }
    }
}

impl TableOptions {
    /// Minimum bet for a player with the given table limit.
    ///
    /// # Example
    ///
    /// ```
    /// use bjtable::TableOptions;
    ///
    /// let options = TableOptions::default();
    /// assert_eq!(options.min_bet(1000), 10);
    /// assert_eq!(options.min_bet(150), 2);
    /// ```
    #[must_use]
    pub fn min_bet(&self, table_limit: u64) -> u64 {
        #[expect(
            clippy::cast_precision_loss,
            reason = "f64 has sufficient precision for chip amounts"
        )]
        let raw = table_limit as f64 * self.min_bet_ratio;
        RoundingMode::Up.apply(raw)
    }

    /// Sets the number of seats.
    ///
    /// # Example
    ///
    /// ```
    /// use bjtable::TableOptions;
    ///
    /// let options = TableOptions::default().with_seats(3);
    /// assert_eq!(options.seats, 3);
    /// ```
    #[must_use]
    pub const fn with_seats(mut self, seats: u8) -> Self {
        self.seats = seats;
        self
    }

    /// Sets the minimum buy-in.
    #[must_use]
    pub const fn with_min_buy_in(mut self, amount: u64) -> Self {
        self.min_buy_in = amount;
        self
    }

    /// Sets the minimum bet ratio.
    ///
    /// # Example
    ///
    /// ```
    /// use bjtable::TableOptions;
    ///
    /// let options = TableOptions::default().with_min_bet_ratio(0.05);
    /// assert_eq!(options.min_bet(1000), 50);
    /// ```
    #[must_use]
    pub const fn with_min_bet_ratio(mut self, ratio: f64) -> Self {
        self.min_bet_ratio = ratio;
        self
    }

    /// Sets the blackjack payout ratio.
    #[must_use]
    pub const fn with_blackjack_pays(mut self, ratio: f64) -> Self {
        self.blackjack_pays = ratio;
        self
    }

    /// Sets the rounding mode for blackjack payouts.
    #[must_use]
    pub const fn with_rounding_blackjack(mut self, mode: RoundingMode) -> Self {
        self.rounding_blackjack = mode;
        self
    }

    /// Sets the total the dealer stands on.
    #[must_use]
    pub const fn with_dealer_stands_on(mut self, total: u8) -> Self {
        self.dealer_stands_on = total;
        self
    }

    /// Sets the pacing delays used so polling clients see incremental state.
    #[must_use]
    pub const fn with_delays(mut self, deal: Duration, dealer: Duration, payout: Duration) -> Self {
        self.deal_delay = deal;
        self.dealer_delay = dealer;
        self.payout_delay = payout;
        self
    }

    /// Disables every pacing delay.
    #[must_use]
    pub const fn without_delays(self) -> Self {
        self.with_delays(Duration::ZERO, Duration::ZERO, Duration::ZERO)
    }
}
