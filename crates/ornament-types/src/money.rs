//! Money amounts for order pricing.
//!
//! Amounts are held as whole cents so that tier arithmetic never touches
//! floating point. Conversion to a decimal dollar figure happens only at the
//! edges: display strings and the persisted `totalPrice` number.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Mul};

/// An amount of money in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl Money {
	/// Zero dollars.
	pub const ZERO: Money = Money(0);

	/// Creates an amount from whole cents.
	pub const fn from_cents(cents: u64) -> Self {
		Self(cents)
	}

	/// Creates an amount from whole dollars.
	pub const fn from_dollars(dollars: u64) -> Self {
		Self(dollars * 100)
	}

	/// Returns the amount in cents.
	pub const fn cents(&self) -> u64 {
		self.0
	}

	/// Returns the amount as a dollar number with two-decimal semantics.
	pub fn as_dollars(&self) -> f64 {
		self.0 as f64 / 100.0
	}
}

impl fmt::Display for Money {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
	}
}

impl Add for Money {
	type Output = Money;

	fn add(self, rhs: Money) -> Money {
		Money(self.0 + rhs.0)
	}
}

impl Mul<u64> for Money {
	type Output = Money;

	fn mul(self, rhs: u64) -> Money {
		Money(self.0 * rhs)
	}
}

/// Serde module writing a `Money` as a plain dollar number (`18.0`).
///
/// This is the representation the document store expects for `totalPrice`.
pub mod dollars_serde {
	use super::Money;
	use serde::{de::Error, Deserialize, Deserializer, Serializer};

	pub fn serialize<S>(value: &Money, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_f64(value.as_dollars())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Money, D::Error>
	where
		D: Deserializer<'de>,
	{
		let dollars = f64::deserialize(deserializer)?;
		if !dollars.is_finite() || dollars < 0.0 {
			return Err(D::Error::custom(format!("invalid amount: {}", dollars)));
		}
		Ok(Money::from_cents((dollars * 100.0).round() as u64))
	}
}

impl Serialize for Money {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_u64(self.0)
	}
}

impl<'de> Deserialize<'de> for Money {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		u64::deserialize(deserializer).map(Money)
	}
}
