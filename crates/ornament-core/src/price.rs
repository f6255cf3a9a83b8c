//! Tiered ornament pricing.
//!
//! Every complete bundle is charged the bundle price and the remainder is
//! charged per unit. With the standard tiers (4 for $18, $6 each otherwise)
//! this is the "Buy 3, Get 1 Free" promotion. All arithmetic is in cents.

use ornament_config::PricingConfig;
use ornament_types::Money;

/// Price tiers for one sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceSchedule {
	unit_price: Money,
	bundle_size: u64,
	bundle_price: Money,
	donation_per_unit: Money,
}

impl PriceSchedule {
	/// The standard fundraiser tiers.
	pub const STANDARD: PriceSchedule = PriceSchedule {
		unit_price: Money::from_dollars(6),
		bundle_size: 4,
		bundle_price: Money::from_dollars(18),
		donation_per_unit: Money::from_dollars(1),
	};

	pub fn from_config(config: &PricingConfig) -> Self {
		Self {
			unit_price: Money::from_cents(config.unit_price_cents),
			// Config validation rejects 0; clamp so the division below is total.
			bundle_size: config.bundle_size.max(1),
			bundle_price: Money::from_cents(config.bundle_price_cents),
			donation_per_unit: Money::from_cents(config.donation_per_unit_cents),
		}
	}

	/// Charged total for `count` ornaments.
	pub fn price(&self, count: usize) -> Money {
		let count = count as u64;
		let bundles = count / self.bundle_size;
		let remainder = count % self.bundle_size;
		self.bundle_price * bundles + self.unit_price * remainder
	}

	/// Amount passed on to charity for `count` ornaments. Informational only.
	pub fn donation(&self, count: usize) -> Money {
		self.donation_per_unit * count as u64
	}

	pub fn unit_price(&self) -> Money {
		self.unit_price
	}

	pub fn bundle_size(&self) -> u64 {
		self.bundle_size
	}

	pub fn bundle_price(&self) -> Money {
		self.bundle_price
	}

	pub fn donation_per_unit(&self) -> Money {
		self.donation_per_unit
	}

	/// Banner text for the bundle deal, e.g. "Buy 3, Get 1 Free!".
	///
	/// Only phrased as a free item when the bundle costs exactly one unit less
	/// than buying the same count individually.
	pub fn promotion(&self) -> String {
		let paid = self.bundle_size.saturating_sub(1);
		if paid > 0 && self.bundle_price == self.unit_price * paid {
			format!("Buy {}, Get 1 Free!", paid)
		} else {
			format!("{} for {}", self.bundle_size, self.bundle_price)
		}
	}
}

impl Default for PriceSchedule {
	fn default() -> Self {
		Self::STANDARD
	}
}

/// Charged total for `count` ornaments at the standard tiers.
pub fn price(count: usize) -> Money {
	PriceSchedule::STANDARD.price(count)
}
