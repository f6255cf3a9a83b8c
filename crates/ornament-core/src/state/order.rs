//! Order wizard state machine.
//!
//! [`OrderState`] is a plain value; every interaction is a [`WizardEvent`]
//! applied with [`OrderState::apply`], which returns the next state. Steps move
//! Buyer Info -> Ornaments -> Review and only advance while the current step's
//! predicate holds. Submission is split into [`OrderState::begin_submission`]
//! and [`OrderState::finish_submission`] so the awaited write can happen in
//! between without holding the state.
//!
//! Gated actions (advancing from an incomplete step, removing the last line,
//! editing an unknown line, submitting without every consent) leave the state
//! unchanged rather than failing. [`WizardError`] is reserved for events that
//! cannot be expressed through the page at all.

use crate::price::PriceSchedule;
use once_cell::sync::Lazy;
use ornament_types::{
	BuyerInfo, ConsentFlags, FormSchema, LineId, LineUpdate, OrderRecord, OrnamentEntry,
	OrnamentLine, PaymentStatus, Step, SubmissionStatus,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors for events the wizard refuses outright.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
	#[error("Unknown buyer field: {0}")]
	UnknownField(String),
	#[error("Unknown consent flag: {0}")]
	UnknownConsent(String),
	#[error("Order has already been submitted")]
	AlreadySubmitted,
	#[error("A submission is already in progress")]
	SubmissionInProgress,
	#[error("The sale is closed")]
	SaleClosed,
}

/// A single interaction with the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
	SetBuyerField { key: String, value: String },
	AddLine,
	RemoveLine(LineId),
	UpdateLine(LineId, LineUpdate),
	Next,
	Back,
	SetConsent { key: String, checked: bool },
	/// The buyer closed the failed-submission notice.
	DismissError,
}

/// Outcome of the document store write, as seen by the state machine.
pub type WriteOutcome<E> = Result<String, E>;

/// State of one buyer's order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderState {
	step: Step,
	buyer: BuyerInfo,
	lines: Vec<OrnamentLine>,
	consents: ConsentFlags,
	submission: SubmissionStatus,
	order_id: Option<String>,
	next_line_id: u64,
}

impl OrderState {
	/// A fresh order on step 1 with a single blank ornament line.
	pub fn new(schema: &FormSchema) -> Self {
		Self {
			step: Step::BuyerInfo,
			buyer: BuyerInfo::for_schema(schema),
			lines: vec![OrnamentLine::blank(LineId(1))],
			consents: ConsentFlags::for_schema(schema),
			submission: SubmissionStatus::Idle,
			order_id: None,
			next_line_id: 2,
		}
	}

	pub fn step(&self) -> Step {
		self.step
	}

	pub fn buyer(&self) -> &BuyerInfo {
		&self.buyer
	}

	/// Ornament lines in display order. Never empty.
	pub fn lines(&self) -> &[OrnamentLine] {
		&self.lines
	}

	pub fn consents(&self) -> &ConsentFlags {
		&self.consents
	}

	pub fn submission(&self) -> SubmissionStatus {
		self.submission
	}

	/// Identifier assigned by the store once the order is submitted.
	pub fn order_id(&self) -> Option<&str> {
		self.order_id.as_deref()
	}

	pub fn is_confirmed(&self) -> bool {
		self.submission == SubmissionStatus::Submitted
	}

	/// Every buyer field is non-blank.
	pub fn is_step1_valid(&self) -> bool {
		self.buyer.is_complete()
	}

	/// Every line has a design and a non-blank engraving.
	pub fn is_step2_valid(&self) -> bool {
		self.lines.iter().all(OrnamentLine::is_complete)
	}

	/// Whether "Next" is enabled on the current step.
	pub fn can_advance(&self) -> bool {
		match self.step {
			Step::BuyerInfo => self.is_step1_valid(),
			Step::Ornaments => self.is_step2_valid(),
			Step::Review => false,
		}
	}

	/// Whether "Submit Order" is enabled.
	///
	/// Requires the review step, every consent, no write in flight, and both
	/// earlier predicates, since lines and buyer fields stay editable.
	pub fn can_submit(&self) -> bool {
		self.step == Step::Review
			&& self.consents.all_checked()
			&& matches!(
				self.submission,
				SubmissionStatus::Idle | SubmissionStatus::Failed
			) && self.is_step1_valid()
			&& self.is_step2_valid()
	}

	/// Applies an event and returns the resulting state.
	pub fn apply(&self, schema: &FormSchema, event: WizardEvent) -> Result<OrderState, WizardError> {
		match self.submission {
			SubmissionStatus::Submitted => return Err(WizardError::AlreadySubmitted),
			SubmissionStatus::Submitting => return Err(WizardError::SubmissionInProgress),
			SubmissionStatus::Idle | SubmissionStatus::Failed => {},
		}

		let mut next = self.clone();
		// Any interaction closes the failure notice.
		if next.submission == SubmissionStatus::Failed {
			next.set_submission(SubmissionStatus::Idle);
		}

		match event {
			WizardEvent::SetBuyerField { key, value } => {
				if !schema.has_field(&key) || !next.buyer.set(&key, value) {
					return Err(WizardError::UnknownField(key));
				}
			},
			WizardEvent::AddLine => {
				next.lines.push(OrnamentLine::blank(LineId(next.next_line_id)));
				next.next_line_id += 1;
			},
			WizardEvent::RemoveLine(id) => {
				if next.lines.len() > 1 {
					next.lines.retain(|line| line.id != id);
				}
			},
			WizardEvent::UpdateLine(id, update) => {
				if let Some(line) = next.lines.iter_mut().find(|line| line.id == id) {
					match update {
						LineUpdate::Design(design) => line.design = design,
						LineUpdate::Engraving(text) => line.engraving = text,
					}
				}
			},
			WizardEvent::Next => {
				if next.can_advance() {
					if let Some(step) = next.step.next() {
						next.step = step;
					}
				}
			},
			WizardEvent::Back => {
				if let Some(step) = next.step.previous() {
					next.step = step;
				}
			},
			WizardEvent::SetConsent { key, checked } => {
				if !schema.has_consent(&key) || !next.consents.set(&key, checked) {
					return Err(WizardError::UnknownConsent(key));
				}
			},
			WizardEvent::DismissError => {},
		}

		Ok(next)
	}

	/// Starts a submission.
	///
	/// Returns `None` when submission is not enabled, leaving the caller's
	/// state as it was. Otherwise returns the Submitting state together with
	/// the record to write. `orderDate` is left for the store to assign.
	///
	/// A retry from Failed passes through Idle first, so every submission
	/// starts from Idle.
	pub fn begin_submission(
		&self,
		prices: &PriceSchedule,
	) -> Result<Option<(OrderState, OrderRecord)>, WizardError> {
		match self.submission {
			SubmissionStatus::Submitted => return Err(WizardError::AlreadySubmitted),
			SubmissionStatus::Submitting => return Err(WizardError::SubmissionInProgress),
			SubmissionStatus::Idle | SubmissionStatus::Failed => {},
		}
		if !self.can_submit() {
			return Ok(None);
		}

		let Some(ornaments) = self
			.lines
			.iter()
			.enumerate()
			.map(|(index, line)| {
				line.design.map(|design| OrnamentEntry {
					ornament_number: index + 1,
					design,
					engraving: line.engraving.clone(),
				})
			})
			.collect::<Option<Vec<_>>>()
		else {
			return Ok(None);
		};

		let record = OrderRecord {
			buyer: self.buyer.clone().into_inner(),
			total_ornaments: ornaments.len(),
			total_price: prices.price(ornaments.len()),
			ornaments,
			order_date: None,
			payment_status: PaymentStatus::Pending,
			consents: self.consents.clone().into_inner(),
		};

		let mut submitting = self.clone();
		if submitting.submission == SubmissionStatus::Failed {
			submitting.set_submission(SubmissionStatus::Idle);
		}
		submitting.set_submission(SubmissionStatus::Submitting);
		Ok(Some((submitting, record)))
	}

	/// Records the outcome of the write started by [`begin_submission`](Self::begin_submission).
	///
	/// A state that is not Submitting is returned unchanged.
	pub fn finish_submission<E>(&self, outcome: WriteOutcome<E>) -> OrderState {
		if self.submission != SubmissionStatus::Submitting {
			return self.clone();
		}

		let mut next = self.clone();
		match outcome {
			Ok(order_id) => {
				next.order_id = Some(order_id);
				next.set_submission(SubmissionStatus::Submitted);
			},
			Err(_) => next.set_submission(SubmissionStatus::Failed),
		}
		next
	}

	fn set_submission(&mut self, to: SubmissionStatus) {
		debug_assert!(
			is_valid_transition(self.submission, to),
			"invalid submission transition {:?} -> {:?}",
			self.submission,
			to
		);
		self.submission = to;
	}
}

/// Checks a submission status transition against the lifecycle table.
fn is_valid_transition(from: SubmissionStatus, to: SubmissionStatus) -> bool {
	static TRANSITIONS: Lazy<HashMap<SubmissionStatus, HashSet<SubmissionStatus>>> =
		Lazy::new(|| {
			use SubmissionStatus::*;
			HashMap::from([
				(Idle, HashSet::from([Submitting])),
				(Submitting, HashSet::from([Submitted, Failed])),
				(Failed, HashSet::from([Idle])),
				(Submitted, HashSet::new()), // terminal
			])
		});

	TRANSITIONS.get(&from).is_some_and(|set| set.contains(&to))
}

#[cfg(test)]
mod tests {
	use super::*;
	use ornament_types::{Design, FormVariant, Money};

	fn schema() -> FormSchema {
		FormVariant::Contact.schema()
	}

	fn apply(state: OrderState, event: WizardEvent) -> OrderState {
		state.apply(&schema(), event).unwrap()
	}

	fn set_field(key: &str, value: &str) -> WizardEvent {
		WizardEvent::SetBuyerField {
			key: key.to_string(),
			value: value.to_string(),
		}
	}

	fn filled_buyer() -> OrderState {
		let mut state = OrderState::new(&schema());
		for (key, value) in [
			("firstName", "Jane"),
			("lastName", "Doe"),
			("email", "jane@example.com"),
			("phoneNumber", "555-0100"),
		] {
			state = apply(state, set_field(key, value));
		}
		state
	}

	fn complete_line(state: OrderState, id: LineId, design: Design, text: &str) -> OrderState {
		let state = apply(
			state,
			WizardEvent::UpdateLine(id, LineUpdate::Design(Some(design))),
		);
		apply(
			state,
			WizardEvent::UpdateLine(id, LineUpdate::Engraving(text.to_string())),
		)
	}

	fn at_review(lines: usize) -> OrderState {
		let mut state = apply(filled_buyer(), WizardEvent::Next);
		for _ in 1..lines {
			state = apply(state, WizardEvent::AddLine);
		}
		let ids: Vec<LineId> = state.lines().iter().map(|l| l.id).collect();
		for id in ids {
			state = complete_line(state, id, Design::Snowflake, &format!("Line {}", id));
		}
		apply(state, WizardEvent::Next)
	}

	fn check_all(mut state: OrderState) -> OrderState {
		for consent in &schema().consents {
			state = apply(
				state,
				WizardEvent::SetConsent {
					key: consent.key.clone(),
					checked: true,
				},
			);
		}
		state
	}

	#[test]
	fn test_new_state() {
		let state = OrderState::new(&schema());
		assert_eq!(state.step(), Step::BuyerInfo);
		assert_eq!(state.lines().len(), 1);
		assert_eq!(state.lines()[0].id, LineId(1));
		assert_eq!(state.submission(), SubmissionStatus::Idle);
		assert!(!state.is_step1_valid());
		assert!(!state.is_step2_valid());
	}

	#[test]
	fn test_step1_requires_non_blank_fields() {
		let state = filled_buyer();
		assert!(state.is_step1_valid());

		let state = apply(state, set_field("email", "  \t "));
		assert!(!state.is_step1_valid());
		assert_eq!(state.buyer().get("email"), Some("  \t "));

		let state = apply(state, set_field("email", "  jane@example.com "));
		assert!(state.is_step1_valid());
		assert_eq!(state.buyer().get("email"), Some("  jane@example.com "));
	}

	#[test]
	fn test_next_is_gated_by_step_predicates() {
		let state = OrderState::new(&schema());
		let state = apply(state, WizardEvent::Next);
		assert_eq!(state.step(), Step::BuyerInfo);

		let state = apply(filled_buyer(), WizardEvent::Next);
		assert_eq!(state.step(), Step::Ornaments);

		// Blank line blocks step 2.
		let blocked = apply(state.clone(), WizardEvent::Next);
		assert_eq!(blocked.step(), Step::Ornaments);

		let state = complete_line(state, LineId(1), Design::Bell, "Grandma");
		let state = apply(state, WizardEvent::Next);
		assert_eq!(state.step(), Step::Review);

		// Nothing past review.
		let state = apply(state, WizardEvent::Next);
		assert_eq!(state.step(), Step::Review);
	}

	#[test]
	fn test_back_always_allowed() {
		let state = at_review(1);
		let state = apply(state, WizardEvent::Back);
		assert_eq!(state.step(), Step::Ornaments);
		let state = apply(state, WizardEvent::Back);
		assert_eq!(state.step(), Step::BuyerInfo);
		let state = apply(state, WizardEvent::Back);
		assert_eq!(state.step(), Step::BuyerInfo);
	}

	#[test]
	fn test_added_line_invalidates_step2() {
		let state = apply(filled_buyer(), WizardEvent::Next);
		let state = complete_line(state, LineId(1), Design::ClassicStar, "A");
		assert!(state.is_step2_valid());

		let state = apply(state, WizardEvent::AddLine);
		assert_eq!(state.lines().len(), 2);
		assert!(!state.is_step2_valid());
		assert!(state.lines()[1].design.is_none());
		assert!(state.lines()[1].engraving.is_empty());

		let state = complete_line(state, LineId(2), Design::CandyCane, "B");
		assert!(state.is_step2_valid());

		let state = apply(
			state,
			WizardEvent::UpdateLine(LineId(2), LineUpdate::Engraving("   ".into())),
		);
		assert!(!state.is_step2_valid());
	}

	#[test]
	fn test_remove_never_drops_last_line() {
		let state = OrderState::new(&schema());
		let state = apply(state, WizardEvent::RemoveLine(LineId(1)));
		assert_eq!(state.lines().len(), 1);

		let state = apply(state, WizardEvent::AddLine);
		let state = apply(state, WizardEvent::RemoveLine(LineId(1)));
		assert_eq!(state.lines().len(), 1);
		assert_eq!(state.lines()[0].id, LineId(2));

		let state = apply(state, WizardEvent::RemoveLine(LineId(2)));
		assert_eq!(state.lines().len(), 1);
	}

	#[test]
	fn test_line_ids_are_never_reused() {
		let state = OrderState::new(&schema());
		let state = apply(state, WizardEvent::AddLine);
		let state = apply(state, WizardEvent::RemoveLine(LineId(2)));
		let state = apply(state, WizardEvent::AddLine);
		let ids: Vec<_> = state.lines().iter().map(|l| l.id).collect();
		assert_eq!(ids, vec![LineId(1), LineId(3)]);
	}

	#[test]
	fn test_unknown_line_is_ignored() {
		let state = OrderState::new(&schema());
		let unchanged = apply(state.clone(), WizardEvent::RemoveLine(LineId(42)));
		assert_eq!(unchanged, state);
		let unchanged = apply(
			state.clone(),
			WizardEvent::UpdateLine(LineId(42), LineUpdate::Engraving("x".into())),
		);
		assert_eq!(unchanged, state);
	}

	#[test]
	fn test_unknown_keys_are_errors() {
		let state = OrderState::new(&schema());
		assert_eq!(
			state.apply(&schema(), set_field("studentNumber", "1")),
			Err(WizardError::UnknownField("studentNumber".into()))
		);
		assert_eq!(
			state.apply(
				&schema(),
				WizardEvent::SetConsent {
					key: "agreedToETransfer".into(),
					checked: true
				}
			),
			Err(WizardError::UnknownConsent("agreedToETransfer".into()))
		);
	}

	#[test]
	fn test_submit_requires_every_consent() {
		let state = check_all(at_review(1));
		assert!(state.can_submit());

		let state = apply(
			state,
			WizardEvent::SetConsent {
				key: "agreedToPickup".into(),
				checked: false,
			},
		);
		assert!(!state.can_submit());
		assert!(state
			.begin_submission(&PriceSchedule::STANDARD)
			.unwrap()
			.is_none());
	}

	#[test]
	fn test_submit_only_from_review() {
		let state = check_all(filled_buyer());
		assert!(!state.can_submit());
		assert!(state
			.begin_submission(&PriceSchedule::STANDARD)
			.unwrap()
			.is_none());
	}

	#[test]
	fn test_scenario_three_lines() {
		let state = check_all(at_review(3));
		let (submitting, record) = state
			.begin_submission(&PriceSchedule::STANDARD)
			.unwrap()
			.unwrap();

		assert_eq!(submitting.submission(), SubmissionStatus::Submitting);
		assert_eq!(record.total_ornaments, 3);
		assert_eq!(record.total_price, Money::from_dollars(18));
		assert_eq!(record.payment_status, PaymentStatus::Pending);
		assert_eq!(record.buyer.get("firstName").map(String::as_str), Some("Jane"));
		assert_eq!(record.consents.len(), 4);
		assert!(record.consents.values().all(|v| *v));
		let numbers: Vec<_> = record.ornaments.iter().map(|o| o.ornament_number).collect();
		assert_eq!(numbers, vec![1, 2, 3]);
		assert!(record.order_date.is_none());
	}

	#[test]
	fn test_scenario_bundle_totals() {
		for (lines, dollars) in [(5, 24), (8, 36)] {
			let state = check_all(at_review(lines));
			let (_, record) = state
				.begin_submission(&PriceSchedule::STANDARD)
				.unwrap()
				.unwrap();
			assert_eq!(record.total_ornaments, lines);
			assert_eq!(record.total_price, Money::from_dollars(dollars));
		}
	}

	#[test]
	fn test_submitting_blocks_events_and_second_submit() {
		let state = check_all(at_review(1));
		let (submitting, _) = state
			.begin_submission(&PriceSchedule::STANDARD)
			.unwrap()
			.unwrap();

		assert_eq!(
			submitting.begin_submission(&PriceSchedule::STANDARD),
			Err(WizardError::SubmissionInProgress)
		);
		assert_eq!(
			submitting.apply(&schema(), WizardEvent::AddLine),
			Err(WizardError::SubmissionInProgress)
		);
	}

	#[test]
	fn test_failure_keeps_data_and_allows_retry() {
		let state = check_all(at_review(2));
		let (submitting, first) = state
			.begin_submission(&PriceSchedule::STANDARD)
			.unwrap()
			.unwrap();

		let failed = submitting.finish_submission::<&str>(Err("unavailable"));
		assert_eq!(failed.submission(), SubmissionStatus::Failed);
		assert_eq!(failed.step(), Step::Review);
		assert_eq!(failed.buyer(), state.buyer());
		assert_eq!(failed.lines(), state.lines());
		assert!(failed.can_submit());

		let (retrying, second) = failed
			.begin_submission(&PriceSchedule::STANDARD)
			.unwrap()
			.unwrap();
		assert_eq!(second, first);
		assert_eq!(retrying.submission(), SubmissionStatus::Submitting);
	}

	#[test]
	fn test_dismiss_error_returns_to_idle() {
		let state = check_all(at_review(1));
		let (submitting, _) = state
			.begin_submission(&PriceSchedule::STANDARD)
			.unwrap()
			.unwrap();
		let failed = submitting.finish_submission::<&str>(Err("down"));

		let dismissed = apply(failed, WizardEvent::DismissError);
		assert_eq!(dismissed.submission(), SubmissionStatus::Idle);
		assert_eq!(dismissed.step(), Step::Review);
	}

	#[test]
	fn test_success_is_terminal() {
		let state = check_all(at_review(1));
		let (submitting, _) = state
			.begin_submission(&PriceSchedule::STANDARD)
			.unwrap()
			.unwrap();
		let done = submitting.finish_submission::<&str>(Ok("order-1".to_string()));

		assert!(done.is_confirmed());
		assert_eq!(done.order_id(), Some("order-1"));
		assert_eq!(
			done.apply(&schema(), WizardEvent::Back),
			Err(WizardError::AlreadySubmitted)
		);
		assert_eq!(
			done.begin_submission(&PriceSchedule::STANDARD),
			Err(WizardError::AlreadySubmitted)
		);
	}

	#[test]
	fn test_finish_without_begin_is_noop() {
		let state = at_review(1);
		assert_eq!(state.finish_submission::<&str>(Ok("x".into())), state);
	}

	#[test]
	fn test_state_serializes() {
		let state = at_review(1);
		let value = serde_json::to_value(&state).unwrap();
		assert_eq!(value["step"], 3);
		assert_eq!(value["submission"], "idle");
		let back: OrderState = serde_json::from_value(value).unwrap();
		assert_eq!(back, state);
	}

	#[test]
	fn test_transition_table() {
		use SubmissionStatus::*;
		assert!(is_valid_transition(Idle, Submitting));
		assert!(is_valid_transition(Failed, Idle));
		assert!(!is_valid_transition(Failed, Submitting));
		assert!(!is_valid_transition(Submitted, Idle));
		assert!(!is_valid_transition(Idle, Submitted));
	}
}
