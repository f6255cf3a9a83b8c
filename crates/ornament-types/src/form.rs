//! Form schema types for the ornament order wizard.
//!
//! The same wizard serves more than one page: each page collects a different
//! set of buyer fields and asks for a different set of consents. A
//! [`FormSchema`] captures those differences so the state machine itself is
//! written once.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ornament designs offered by the fundraiser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Design {
	ClassicStar,
	Snowflake,
	ChristmasTree,
	CandyCane,
	Bell,
	OrnamentBall,
}

impl Design {
	/// Returns all designs in catalogue order.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::ClassicStar,
			Self::Snowflake,
			Self::ChristmasTree,
			Self::CandyCane,
			Self::Bell,
			Self::OrnamentBall,
		]
		.into_iter()
	}

	/// Catalogue number of the design, 1 through 6.
	pub fn number(&self) -> u8 {
		match self {
			Self::ClassicStar => 1,
			Self::Snowflake => 2,
			Self::ChristmasTree => 3,
			Self::CandyCane => 4,
			Self::Bell => 5,
			Self::OrnamentBall => 6,
		}
	}

	/// Human-readable design name.
	pub fn name(&self) -> &'static str {
		match self {
			Self::ClassicStar => "Classic Star",
			Self::Snowflake => "Snowflake",
			Self::ChristmasTree => "Christmas Tree",
			Self::CandyCane => "Candy Cane",
			Self::Bell => "Bell",
			Self::OrnamentBall => "Ornament Ball",
		}
	}

	/// Looks up a design by its catalogue number.
	pub fn from_number(number: u8) -> Option<Self> {
		Self::all().find(|d| d.number() == number)
	}
}

impl fmt::Display for Design {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Design {}", self.number())
	}
}

impl FromStr for Design {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		s.trim()
			.parse::<u8>()
			.ok()
			.and_then(Self::from_number)
			.ok_or_else(|| format!("unknown design '{}'", s))
	}
}

impl TryFrom<String> for Design {
	type Error = String;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<Design> for String {
	fn from(design: Design) -> Self {
		design.number().to_string()
	}
}

/// A required buyer text field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
	/// Key used in the persisted record (camelCase).
	pub key: String,
	/// Label shown next to the input.
	pub label: String,
}

/// A consent checkbox shown on the review step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentSpec {
	/// Key used in the persisted record (camelCase).
	pub key: String,
	/// Statement the buyer agrees to.
	pub statement: String,
}

/// Built-in page variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormVariant {
	/// Public page: contact details, pickup at the school office, pay at the event.
	#[default]
	Contact,
	/// Student page: classroom delivery details, e-transfer or alternate payment.
	Classroom,
}

impl FormVariant {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Contact => "contact",
			Self::Classroom => "classroom",
		}
	}

	/// Builds the schema for this variant.
	pub fn schema(&self) -> FormSchema {
		match self {
			Self::Contact => FormSchema::new(
				vec![
					field("firstName", "First Name"),
					field("lastName", "Last Name"),
					field("email", "Email"),
					field("phoneNumber", "Phone Number"),
				],
				vec![
					consent(
						"agreedToTerms",
						"Once I submit this form, I am agreeing that all the information that I have sent is valid.",
					),
					consent(
						"agreedToFinalEngravings",
						"All engravings and ornament designs are final. Any changes will be considered a new order requiring a new payment.",
					),
					consent(
						"agreedToPickup",
						"I do not expect the ornaments to be delivered. I will pick them up at the school Main Office once notified by email.",
					),
					consent(
						"agreedToPayAtEvent",
						"The ornaments will only be made once I have paid at the Christmas Event.",
					),
				],
			),
			Self::Classroom => FormSchema::new(
				vec![
					field("firstName", "First Name"),
					field("lastName", "Last Name"),
					field("studentEmail", "Student Email"),
					field("studentNumber", "Student Number"),
					field("period", "Period"),
					field("teacher", "Teacher"),
					field("courseCode", "Course Code"),
					field("classroom", "Classroom"),
				],
				vec![
					consent(
						"agreedToTerms",
						"Once I submit this form, I am agreeing that all the information that I have sent is valid.",
					),
					consent(
						"agreedToFinalEngravings",
						"All engravings and ornament designs are final. Any changes will be considered a new order requiring a new payment.",
					),
					consent(
						"agreedToETransfer",
						"I will pay by e-transfer before the ornaments are made.",
					),
					consent(
						"agreedToAlternatePayment",
						"If I cannot pay by e-transfer I will arrange an alternate payment with the organizers.",
					),
				],
			),
		}
	}
}

impl FromStr for FormVariant {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"contact" => Ok(Self::Contact),
			"classroom" => Ok(Self::Classroom),
			other => Err(format!("unknown form variant '{}'", other)),
		}
	}
}

fn field(key: &str, label: &str) -> FieldSpec {
	FieldSpec {
		key: key.to_string(),
		label: label.to_string(),
	}
}

fn consent(key: &str, statement: &str) -> ConsentSpec {
	ConsentSpec {
		key: key.to_string(),
		statement: statement.to_string(),
	}
}

/// The buyer fields and consent flags a wizard collects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSchema {
	pub fields: Vec<FieldSpec>,
	pub consents: Vec<ConsentSpec>,
}

impl FormSchema {
	pub fn new(fields: Vec<FieldSpec>, consents: Vec<ConsentSpec>) -> Self {
		Self { fields, consents }
	}

	pub fn has_field(&self, key: &str) -> bool {
		self.fields.iter().any(|f| f.key == key)
	}

	pub fn has_consent(&self, key: &str) -> bool {
		self.consents.iter().any(|c| c.key == key)
	}
}

impl Default for FormSchema {
	fn default() -> Self {
		FormVariant::default().schema()
	}
}
