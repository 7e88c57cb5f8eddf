//! Credit cost estimation for AI token usage
//!
//! Converts raw token counts from the reply pipeline into credit costs.
//! Costs round UP to the nearest 0.1 credit so rounding can never underpay
//! the provider, and period totals sum per-row rounded costs rather than
//! rounding once at the end.

use rust_decimal::Decimal;

/// Output tokens are weighted four times heavier than input tokens
const OUTPUT_TOKEN_WEIGHT: i64 = 4;

/// Weighted tokens covered by one credit
const WEIGHTED_TOKENS_PER_CREDIT: i64 = 3000;

/// Raw token counts reported by the AI pipeline for one call.
///
/// Upstream values can be negative or otherwise garbage; estimation clamps
/// them to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    pub input_tokens: i64,
    pub output_tokens: i64,
}

impl TokenUsage {
    pub fn new(input_tokens: i64, output_tokens: i64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }
}

/// Credit cost for one usage event, rounded up to the nearest 0.1 credit.
pub fn usage_credit_cost(usage: TokenUsage) -> Decimal {
    let input = usage.input_tokens.max(0);
    let output = usage.output_tokens.max(0);
    weighted_cost(input.saturating_add(output.saturating_mul(OUTPUT_TOKEN_WEIGHT)))
}

/// Credit cost from a pre-aggregated total token count, same rounding.
pub fn total_tokens_credit_cost(total_tokens: i64) -> Decimal {
    weighted_cost(total_tokens.max(0))
}

/// Period total over many usage rows.
///
/// Each row is rounded to a tenth before summation (sum of rounded tenths,
/// never round-after-sum), so many small calls cannot under-bill through
/// aggregate rounding.
pub fn period_usage_cost<I>(rows: I) -> Decimal
where
    I: IntoIterator<Item = TokenUsage>,
{
    rows.into_iter().map(usage_credit_cost).sum()
}

fn weighted_cost(weighted: i64) -> Decimal {
    if weighted <= 0 {
        return Decimal::ZERO;
    }
    // ceil(weighted / 3000 * 10) computed in integer tenths keeps the
    // rounding exact for arbitrarily large counts.
    let tenths = (weighted.saturating_mul(10) as u64)
        .div_ceil(WEIGHTED_TOKENS_PER_CREDIT as u64) as i64;
    Decimal::new(tenths, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_and_garbage_inputs_cost_nothing() {
        assert_eq!(usage_credit_cost(TokenUsage::new(0, 0)), Decimal::ZERO);
        assert_eq!(usage_credit_cost(TokenUsage::new(-500, -1)), Decimal::ZERO);
        assert_eq!(total_tokens_credit_cost(-42), Decimal::ZERO);
        assert_eq!(total_tokens_credit_cost(0), Decimal::ZERO);
    }

    #[test]
    fn single_token_rounds_up_to_a_tenth() {
        assert_eq!(total_tokens_credit_cost(1), dec!(0.1));
        assert_eq!(usage_credit_cost(TokenUsage::new(1, 0)), dec!(0.1));
    }

    #[test]
    fn output_tokens_weigh_four_times_input() {
        // 1000 input + 500 output = 3000 weighted = exactly one credit
        assert_eq!(usage_credit_cost(TokenUsage::new(1000, 500)), dec!(1.0));
        // One more output token tips over to the next tenth
        assert_eq!(usage_credit_cost(TokenUsage::new(1000, 501)), dec!(1.1));
    }

    #[test]
    fn boundaries_round_up_not_down() {
        assert_eq!(total_tokens_credit_cost(2999), dec!(1.0));
        assert_eq!(total_tokens_credit_cost(3000), dec!(1.0));
        assert_eq!(total_tokens_credit_cost(3001), dec!(1.1));
        assert_eq!(total_tokens_credit_cost(300), dec!(1.0));
        assert_eq!(total_tokens_credit_cost(301), dec!(1.1));
    }

    #[test]
    fn cost_is_always_a_multiple_of_a_tenth() {
        for total in [1, 7, 299, 300, 2999, 3000, 44_444, 1_000_000] {
            let cost = total_tokens_credit_cost(total);
            assert_eq!(
                cost * dec!(10) % dec!(1),
                Decimal::ZERO,
                "cost {cost} for {total} tokens is not a tenth multiple"
            );
        }
    }

    #[test]
    fn cost_is_monotone_in_both_inputs() {
        let mut previous = Decimal::ZERO;
        for input in 0..200 {
            let cost = usage_credit_cost(TokenUsage::new(input * 100, 0));
            assert!(cost >= previous);
            previous = cost;
        }
        let mut previous = Decimal::ZERO;
        for output in 0..200 {
            let cost = usage_credit_cost(TokenUsage::new(0, output * 100));
            assert!(cost >= previous);
            previous = cost;
        }
    }

    #[test]
    fn period_total_sums_per_row_rounded_costs() {
        // Two one-token rows must cost 0.2, not round-after-sum's 0.1.
        let rows = vec![TokenUsage::new(1, 0), TokenUsage::new(1, 0)];
        assert_eq!(period_usage_cost(rows), dec!(0.2));

        // N identical rows cost exactly N times one row.
        let row = TokenUsage::new(120, 37);
        let single = usage_credit_cost(row);
        let total = period_usage_cost(std::iter::repeat(row).take(25));
        assert_eq!(total, single * dec!(25));
    }
}
