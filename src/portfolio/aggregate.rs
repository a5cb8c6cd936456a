//! Pure aggregation of purchase transactions into holdings and totals.
//!
//! Nothing here rounds: values keep full `Decimal` precision and rounding
//! is left to presentation. Nothing here panics either: sums and products
//! saturate at the `Decimal` range and quotients that overflow clamp to it.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::models::{Id, Transaction};

use super::{Holding, PortfolioSummary, TransactionValuation};

/// `profit / investment × 100`, or zero when nothing was invested.
pub fn profit_percent(profit: Decimal, investment: Decimal) -> Decimal {
    if investment.is_zero() {
        return Decimal::ZERO;
    }
    let negative = profit.is_sign_negative() != investment.is_sign_negative();
    profit
        .checked_div(investment)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or_else(|| clamp(negative))
}

fn clamp(negative: bool) -> Decimal {
    if negative {
        Decimal::MIN
    } else {
        Decimal::MAX
    }
}

struct Accumulator<'a> {
    first: &'a Transaction,
    /// Member carrying the most recently refreshed price.
    latest: &'a Transaction,
    ids: Vec<Id>,
    total_quantity: Decimal,
    total_investment: Decimal,
}

impl<'a> Accumulator<'a> {
    fn new(first: &'a Transaction) -> Self {
        Self {
            first,
            latest: first,
            ids: Vec::new(),
            total_quantity: Decimal::ZERO,
            total_investment: Decimal::ZERO,
        }
    }

    fn add(&mut self, tx: &'a Transaction) {
        self.ids.push(tx.id.clone());
        self.total_quantity = self.total_quantity.saturating_add(tx.quantity);
        self.total_investment = self.total_investment.saturating_add(tx.cost());
        // Newest refresh wins; equal timestamps fall back to the larger
        // price so the pick does not depend on input order.
        let newer = (tx.price_updated_at, tx.price_at_record_time)
            > (self.latest.price_updated_at, self.latest.price_at_record_time);
        if newer {
            self.latest = tx;
        }
    }

    fn finish(self) -> Holding {
        let current_unit_price = self.latest.price_at_record_time;
        let average_purchase_price = if self.total_quantity.is_zero() {
            Decimal::ZERO
        } else {
            self.total_investment
                .checked_div(self.total_quantity)
                .unwrap_or(Decimal::MAX)
        };
        let current_value = current_unit_price.saturating_mul(self.total_quantity);
        let profit = current_value.saturating_sub(self.total_investment);

        Holding {
            asset_id: self.first.asset_id.clone(),
            asset_symbol: self.first.asset_symbol.clone(),
            asset_name: self.first.asset_name.clone(),
            asset_image_ref: self.first.asset_image_ref.clone(),
            transaction_ids: self.ids,
            total_quantity: self.total_quantity,
            total_investment: self.total_investment,
            current_unit_price,
            average_purchase_price,
            current_value,
            profit,
            profit_percent: profit_percent(profit, self.total_investment),
        }
    }
}

/// Group transactions by asset id, in first-seen order.
pub fn compute_holdings(transactions: &[Transaction]) -> Vec<Holding> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Accumulator<'_>> = Vec::new();

    for tx in transactions {
        let slot = *index.entry(tx.asset_id.as_str()).or_insert_with(|| {
            groups.push(Accumulator::new(tx));
            groups.len() - 1
        });
        groups[slot].add(tx);
    }

    groups.into_iter().map(Accumulator::finish).collect()
}

/// Portfolio totals, reduced over transactions rather than holdings.
pub fn compute_summary(transactions: &[Transaction]) -> PortfolioSummary {
    let (total_investment, total_current_value) = transactions.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(invested, value), tx| {
            (
                invested.saturating_add(tx.cost()),
                value.saturating_add(tx.current_value()),
            )
        },
    );
    let total_profit = total_current_value.saturating_sub(total_investment);

    PortfolioSummary {
        total_investment,
        total_current_value,
        total_profit,
        total_profit_percent: profit_percent(total_profit, total_investment),
    }
}

pub fn value_transaction(tx: &Transaction) -> TransactionValuation {
    let cost = tx.cost();
    let current_value = tx.current_value();
    let profit = current_value.saturating_sub(cost);
    TransactionValuation {
        cost,
        current_value,
        profit,
        profit_percent: profit_percent(profit, cost),
    }
}
