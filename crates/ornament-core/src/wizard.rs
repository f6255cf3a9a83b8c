//! Order wizard bound to one sale.
//!
//! Combines the form schema, price tiers and order writer so callers can drive
//! an [`OrderState`] without passing them around. The only suspending
//! operation is [`Wizard::submit`].

use crate::price::PriceSchedule;
use crate::state::{OrderState, WizardError, WizardEvent};
use crate::writer::OrderWriter;
use ornament_types::{truncate_id, FormSchema, OrderRecord};
use std::sync::Arc;

pub struct Wizard {
	schema: FormSchema,
	prices: PriceSchedule,
	writer: Arc<dyn OrderWriter>,
	sale_open: bool,
}

impl Wizard {
	pub fn new(schema: FormSchema, prices: PriceSchedule, writer: Arc<dyn OrderWriter>) -> Self {
		Self {
			schema,
			prices,
			writer,
			sale_open: true,
		}
	}

	/// Opens or closes the sale.
	pub fn with_sale_open(mut self, open: bool) -> Self {
		self.sale_open = open;
		self
	}

	pub fn schema(&self) -> &FormSchema {
		&self.schema
	}

	pub fn prices(&self) -> &PriceSchedule {
		&self.prices
	}

	pub fn is_sale_open(&self) -> bool {
		self.sale_open
	}

	/// Starts a new order.
	pub fn start(&self) -> Result<OrderState, WizardError> {
		if !self.sale_open {
			return Err(WizardError::SaleClosed);
		}
		Ok(OrderState::new(&self.schema))
	}

	pub fn apply(&self, state: &OrderState, event: WizardEvent) -> Result<OrderState, WizardError> {
		state.apply(&self.schema, event)
	}

	/// First half of a submission: guards and builds the record.
	///
	/// `None` means submission is not enabled for this state.
	pub fn prepare_submission(
		&self,
		state: &OrderState,
	) -> Result<Option<(OrderState, OrderRecord)>, WizardError> {
		if !self.sale_open {
			return Err(WizardError::SaleClosed);
		}
		state.begin_submission(&self.prices)
	}

	/// Second half of a submission: writes the record and records the outcome.
	pub async fn complete_submission(&self, submitting: &OrderState, record: &OrderRecord) -> OrderState {
		let outcome = self.writer.append(record).await;
		match &outcome {
			Ok(order_id) => tracing::info!(
				order_id = %truncate_id(order_id),
				ornaments = record.total_ornaments,
				"Order submitted"
			),
			Err(e) => tracing::warn!(error = %e, "Order submission failed"),
		}
		submitting.finish_submission(outcome)
	}

	/// Submits the order and waits for the write to finish.
	///
	/// A failed write is not an error here: the returned state is Failed and
	/// can be submitted again.
	pub async fn submit(&self, state: &OrderState) -> Result<OrderState, WizardError> {
		match self.prepare_submission(state)? {
			Some((submitting, record)) => Ok(self.complete_submission(&submitting, &record).await),
			None => Ok(state.clone()),
		}
	}
}
