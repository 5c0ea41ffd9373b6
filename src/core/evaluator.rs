// src/core/evaluator.rs
use rust_decimal::Decimal;
use tracing::{error, info};

use crate::plan::item::PlanItem;
use crate::types::{OrderIntent, Side};

/// Runs the full decision sequence for one price observation: circuit
/// breaker, buy condition, sell condition, then the trailing-price update.
/// The trailing update is last on purpose: both conditions compare against
/// the price one interval ago, not the one just observed.
///
/// The triple condition (price now vs. price one interval ago vs. target)
/// requires the price to cross through the target, not merely sit beyond it,
/// which keeps a flat price from re-triggering every bar.
pub fn evaluate(item: &mut PlanItem, price: Decimal) -> Vec<OrderIntent> {
    let mut intents = Vec::new();

    // After too many attempts to establish a position, clear the target so we
    // stay away from the instrument.
    if item.buy_attempted >= item.buy_attempt_limit && item.target_long_pos > 0 {
        info!(
            symbol = %item.symbol,
            buy_attempted = item.buy_attempted,
            "resetting targetLongPos to 0"
        );
        item.target_long_pos = 0;
    }
    if item.sell_attempted >= item.sell_attempt_limit && item.target_short_pos < 0 {
        info!(
            symbol = %item.symbol,
            sell_attempted = item.sell_attempted,
            "resetting targetShortPos to 0"
        );
        item.target_short_pos = 0;
    }

    // Buy and sell are checked independently against the same lagged price.
    // They can never both fire on one observation (buy needs the price rising,
    // sell needs it falling), but neither check short-circuits the other.
    if let Some(prev) = item.previous_price {
        if item.enabled
            && item.latest_pos < item.target_long_pos
            && price >= item.target_buy_price
            && price >= prev
            && item.target_buy_price >= prev
        {
            let quantity = item.target_long_pos - item.latest_pos;
            if quantity > 0 {
                item.buy_attempted += 1;
                info!(
                    symbol = %item.symbol,
                    %price,
                    target_buy_price = %item.target_buy_price,
                    previous_price = %prev,
                    target_long_pos = item.target_long_pos,
                    latest_pos = item.latest_pos,
                    buy_attempted = item.buy_attempted,
                    "BUY triggered"
                );
                intents.push(OrderIntent {
                    symbol: item.symbol.clone(),
                    side: Side::Buy,
                    quantity,
                    limit_price: item.target_buy_price,
                });
            } else {
                error!(
                    symbol = %item.symbol,
                    quantity,
                    "computed non-positive buy quantity; intent suppressed"
                );
            }
        }

        if item.enabled
            && item.latest_pos > item.target_short_pos
            && price < item.target_sell_price
            && price < prev
            && item.target_sell_price <= prev
        {
            let quantity = item.latest_pos - item.target_short_pos;
            if quantity > 0 {
                item.sell_attempted += 1;
                info!(
                    symbol = %item.symbol,
                    %price,
                    target_sell_price = %item.target_sell_price,
                    previous_price = %prev,
                    target_short_pos = item.target_short_pos,
                    latest_pos = item.latest_pos,
                    sell_attempted = item.sell_attempted,
                    "SELL triggered"
                );
                intents.push(OrderIntent {
                    symbol: item.symbol.clone(),
                    side: Side::Sell,
                    quantity,
                    limit_price: item.target_sell_price,
                });
            } else {
                error!(
                    symbol = %item.symbol,
                    quantity,
                    "computed non-positive sell quantity; intent suppressed"
                );
            }
        }
    }

    item.previous_price = Some(price);
    intents
}
