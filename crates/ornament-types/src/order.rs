//! Order types for the ornament wizard.
//!
//! This module holds the pieces of wizard state that are shared across crates
//! (lines, buyer fields, consents, step and submission status) and the
//! immutable [`OrderRecord`] that is written to the document store.

use crate::{money::dollars_serde, Design, FormSchema, Money};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of an ornament line, unique within one order.
///
/// Ids are handed out in increasing order and never reused, so a removed
/// line's id cannot alias a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(pub u64);

impl fmt::Display for LineId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// One ornament being configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrnamentLine {
	pub id: LineId,
	pub design: Option<Design>,
	pub engraving: String,
}

impl OrnamentLine {
	/// A line with no design and an empty engraving.
	pub fn blank(id: LineId) -> Self {
		Self {
			id,
			design: None,
			engraving: String::new(),
		}
	}

	/// A line is complete once it has a design and a non-blank engraving.
	pub fn is_complete(&self) -> bool {
		self.design.is_some() && !is_blank(&self.engraving)
	}
}

/// Editable fields of an ornament line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum LineUpdate {
	/// Sets or clears the design.
	Design(Option<Design>),
	/// Replaces the engraving text.
	Engraving(String),
}

/// Buyer fields keyed by the schema's field keys.
///
/// Values are kept exactly as entered; trimming only happens when checking
/// for blanks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuyerInfo(BTreeMap<String, String>);

impl BuyerInfo {
	/// Creates empty values for every field in the schema.
	pub fn for_schema(schema: &FormSchema) -> Self {
		Self(
			schema
				.fields
				.iter()
				.map(|f| (f.key.clone(), String::new()))
				.collect(),
		)
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	/// Sets a field value. Returns false if the key is not part of this record.
	pub fn set(&mut self, key: &str, value: impl Into<String>) -> bool {
		match self.0.get_mut(key) {
			Some(slot) => {
				*slot = value.into();
				true
			},
			None => false,
		}
	}

	/// True when every field is non-empty after trimming.
	pub fn is_complete(&self) -> bool {
		self.0.values().all(|v| !is_blank(v))
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	pub fn into_inner(self) -> BTreeMap<String, String> {
		self.0
	}
}

/// Consent checkboxes keyed by the schema's consent keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsentFlags(BTreeMap<String, bool>);

impl ConsentFlags {
	/// Creates unchecked flags for every consent in the schema.
	pub fn for_schema(schema: &FormSchema) -> Self {
		Self(
			schema
				.consents
				.iter()
				.map(|c| (c.key.clone(), false))
				.collect(),
		)
	}

	pub fn get(&self, key: &str) -> Option<bool> {
		self.0.get(key).copied()
	}

	/// Sets a flag. Returns false if the key is not part of this record.
	pub fn set(&mut self, key: &str, checked: bool) -> bool {
		match self.0.get_mut(key) {
			Some(slot) => {
				*slot = checked;
				true
			},
			None => false,
		}
	}

	pub fn all_checked(&self) -> bool {
		self.0.values().all(|checked| *checked)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
		self.0.iter().map(|(k, v)| (k.as_str(), *v))
	}

	pub fn into_inner(self) -> BTreeMap<String, bool> {
		self.0
	}
}

/// Wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Step {
	/// Step 1: buyer information.
	BuyerInfo,
	/// Step 2: ornament configuration.
	Ornaments,
	/// Step 3: review and consent.
	Review,
}

impl Step {
	pub const COUNT: u8 = 3;

	pub fn number(&self) -> u8 {
		match self {
			Self::BuyerInfo => 1,
			Self::Ornaments => 2,
			Self::Review => 3,
		}
	}

	pub fn next(&self) -> Option<Step> {
		match self {
			Self::BuyerInfo => Some(Self::Ornaments),
			Self::Ornaments => Some(Self::Review),
			Self::Review => None,
		}
	}

	pub fn previous(&self) -> Option<Step> {
		match self {
			Self::BuyerInfo => None,
			Self::Ornaments => Some(Self::BuyerInfo),
			Self::Review => Some(Self::Ornaments),
		}
	}

	/// Heading shown under the progress bar.
	pub fn description(&self) -> &'static str {
		match self {
			Self::BuyerInfo => "Please provide your contact information",
			Self::Ornaments => "Design your custom ornaments",
			Self::Review => "Review your order before submitting",
		}
	}
}

impl TryFrom<u8> for Step {
	type Error = String;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			1 => Ok(Self::BuyerInfo),
			2 => Ok(Self::Ornaments),
			3 => Ok(Self::Review),
			other => Err(format!("invalid step {}", other)),
		}
	}
}

impl From<Step> for u8 {
	fn from(step: Step) -> Self {
		step.number()
	}
}

/// Progress of the order submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
	#[default]
	Idle,
	Submitting,
	Submitted,
	Failed,
}

/// Payment status recorded with a new order. Payment is collected at the
/// pickup event, so every stored order is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
	Pending,
}

/// One ornament in a persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrnamentEntry {
	/// 1-based position in the order.
	pub ornament_number: usize,
	pub design: Design,
	pub engraving: String,
}

/// The record written to the `orders` collection.
///
/// Buyer fields and consent flags are flattened into the top level of the
/// document, next to the order totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawOrderRecord")]
pub struct OrderRecord {
	#[serde(flatten)]
	pub buyer: BTreeMap<String, String>,
	pub ornaments: Vec<OrnamentEntry>,
	pub total_ornaments: usize,
	#[serde(with = "dollars_serde")]
	pub total_price: Money,
	/// Assigned by the store when the record is written.
	pub order_date: Option<DateTime<Utc>>,
	pub payment_status: PaymentStatus,
	#[serde(flatten)]
	pub consents: BTreeMap<String, bool>,
}

/// Wire shape used to split flattened buyer fields from consent flags.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOrderRecord {
	ornaments: Vec<OrnamentEntry>,
	total_ornaments: usize,
	#[serde(with = "dollars_serde")]
	total_price: Money,
	#[serde(default)]
	order_date: Option<DateTime<Utc>>,
	payment_status: PaymentStatus,
	#[serde(flatten)]
	rest: BTreeMap<String, serde_json::Value>,
}

impl TryFrom<RawOrderRecord> for OrderRecord {
	type Error = String;

	fn try_from(raw: RawOrderRecord) -> Result<Self, Self::Error> {
		let mut buyer = BTreeMap::new();
		let mut consents = BTreeMap::new();
		for (key, value) in raw.rest {
			match value {
				serde_json::Value::String(s) => {
					buyer.insert(key, s);
				},
				serde_json::Value::Bool(b) => {
					consents.insert(key, b);
				},
				other => {
					return Err(format!("unexpected value for '{}': {}", key, other));
				},
			}
		}

		Ok(Self {
			buyer,
			ornaments: raw.ornaments,
			total_ornaments: raw.total_ornaments,
			total_price: raw.total_price,
			order_date: raw.order_date,
			payment_status: raw.payment_status,
			consents,
		})
	}
}

/// True when the string is empty or whitespace only.
pub fn is_blank(value: &str) -> bool {
	value.trim().is_empty()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::FormVariant;
	use serde_json::json;

	fn sample_record() -> OrderRecord {
		OrderRecord {
			buyer: BTreeMap::from([
				("firstName".to_string(), "Jane".to_string()),
				("email".to_string(), "jane@example.com".to_string()),
			]),
			ornaments: vec![OrnamentEntry {
				ornament_number: 1,
				design: Design::Bell,
				engraving: "Jane 2025".to_string(),
			}],
			total_ornaments: 1,
			total_price: Money::from_dollars(6),
			order_date: None,
			payment_status: PaymentStatus::Pending,
			consents: BTreeMap::from([("agreedToTerms".to_string(), true)]),
		}
	}

	#[test]
	fn test_record_shape_is_flat() {
		let value = serde_json::to_value(sample_record()).unwrap();

		assert_eq!(value["firstName"], json!("Jane"));
		assert_eq!(value["agreedToTerms"], json!(true));
		assert_eq!(value["totalOrnaments"], json!(1));
		assert_eq!(value["totalPrice"].as_f64(), Some(6.0));
		assert_eq!(value["paymentStatus"], json!("pending"));
		assert_eq!(value["orderDate"], json!(null));
		assert_eq!(
			value["ornaments"],
			json!([{"ornamentNumber": 1, "design": "5", "engraving": "Jane 2025"}])
		);
		assert!(value.get("buyer").is_none());
		assert!(value.get("consents").is_none());
	}

	#[test]
	fn test_record_reads_back() {
		let record = sample_record();
		let bytes = serde_json::to_vec(&record).unwrap();
		let back: OrderRecord = serde_json::from_slice(&bytes).unwrap();
		assert_eq!(back, record);
	}

	#[test]
	fn test_buyer_info_blank_detection() {
		let schema = FormVariant::Contact.schema();
		let mut buyer = BuyerInfo::for_schema(&schema);
		assert!(!buyer.is_complete());

		for field in &schema.fields {
			assert!(buyer.set(&field.key, "x"));
		}
		assert!(buyer.is_complete());

		buyer.set("email", "   ");
		assert!(!buyer.is_complete());
		assert_eq!(buyer.get("email"), Some("   "));
	}

	#[test]
	fn test_buyer_info_rejects_unknown_key() {
		let mut buyer = BuyerInfo::for_schema(&FormVariant::Contact.schema());
		assert!(!buyer.set("studentNumber", "123"));
		assert_eq!(buyer.get("studentNumber"), None);
	}

	#[test]
	fn test_step_navigation() {
		assert_eq!(Step::BuyerInfo.next(), Some(Step::Ornaments));
		assert_eq!(Step::Review.next(), None);
		assert_eq!(Step::BuyerInfo.previous(), None);
		assert!(Step::try_from(4u8).is_err());
	}
}
