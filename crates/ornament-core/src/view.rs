//! View snapshots for the order page.

use crate::state::OrderState;
use crate::wizard::Wizard;
use ornament_types::{
	ConsentView, ControlsView, Design, DesignOption, FormResponse, LineView, Money,
	OrnamentLine, PricingInfo, ReviewField, ReviewView, SessionView, Step, SubmissionStatus,
};

/// Notice shown after a failed submission.
pub const SUBMIT_FAILED_NOTICE: &str = "There was an error submitting your order. Please try again.";

/// Describes the form: fields, consents, designs, pricing and sale status.
pub fn form_response(wizard: &Wizard, title: &str, variant: &str, closed_message: &str) -> FormResponse {
	let prices = wizard.prices();
	let sale_open = wizard.is_sale_open();

	FormResponse {
		title: title.to_string(),
		variant: variant.to_string(),
		fields: wizard.schema().fields.clone(),
		consents: wizard.schema().consents.clone(),
		designs: Design::all()
			.map(|design| DesignOption {
				value: design.into(),
				label: format!("{} - {}", design, design.name()),
			})
			.collect(),
		pricing: PricingInfo {
			unit_price: prices.unit_price().to_string(),
			bundle_size: prices.bundle_size(),
			bundle_price: prices.bundle_price().to_string(),
			promotion: prices.promotion(),
			donation_per_unit: non_zero(prices.donation_per_unit()),
		},
		sale_open,
		closed_message: (!sale_open).then(|| closed_message.to_string()),
	}
}

/// Snapshot of a session as the page renders it.
pub fn session_view(wizard: &Wizard, session_id: &str, state: &OrderState) -> SessionView {
	let prices = wizard.prices();
	let count = state.lines().len();
	let busy = state.submission() == SubmissionStatus::Submitting;
	let confirmed = state.is_confirmed();

	let buyer: Vec<ReviewField> = wizard
		.schema()
		.fields
		.iter()
		.map(|field| ReviewField {
			label: field.label.clone(),
			value: state.buyer().get(&field.key).unwrap_or_default().to_string(),
		})
		.collect();

	let lines: Vec<LineView> = state
		.lines()
		.iter()
		.enumerate()
		.map(|(index, line)| line_view(index, line, prices.unit_price()))
		.collect();

	let review = (state.step() == Step::Review).then(|| ReviewView {
		buyer: buyer.clone(),
		lines: lines.clone(),
		final_price: prices.price(count).to_string(),
		donation_total: non_zero(prices.donation(count)),
		consents: wizard
			.schema()
			.consents
			.iter()
			.map(|consent| ConsentView {
				key: consent.key.clone(),
				statement: consent.statement.clone(),
				checked: state.consents().get(&consent.key).unwrap_or(false),
			})
			.collect(),
	});

	SessionView {
		session_id: session_id.to_string(),
		step: state.step(),
		total_steps: Step::COUNT,
		description: state.step().description().to_string(),
		buyer,
		lines,
		total_price: prices.price(count).to_string(),
		controls: ControlsView {
			can_advance: !busy && !confirmed && state.can_advance(),
			can_go_back: !busy && !confirmed && state.step().previous().is_some(),
			can_remove_lines: !busy && !confirmed && count > 1,
			can_submit: wizard.is_sale_open() && state.can_submit(),
		},
		review,
		submission: state.submission(),
		confirmed,
		order_id: state.order_id().map(str::to_string),
		notice: (state.submission() == SubmissionStatus::Failed)
			.then(|| SUBMIT_FAILED_NOTICE.to_string()),
	}
}

/// Every line shows the single-unit price, whatever bundle it falls in.
fn line_view(index: usize, line: &OrnamentLine, unit_price: Money) -> LineView {
	LineView {
		id: line.id,
		number: index + 1,
		design: line.design.map(String::from),
		design_label: line
			.design
			.map(|design| design.to_string())
			.unwrap_or_else(|| "Not selected".to_string()),
		engraving: line.engraving.clone(),
		engraving_label: if line.engraving.is_empty() {
			"None".to_string()
		} else {
			line.engraving.clone()
		},
		unit_price: unit_price.to_string(),
	}
}

fn non_zero(amount: Money) -> Option<String> {
	(amount != Money::ZERO).then(|| amount.to_string())
}
