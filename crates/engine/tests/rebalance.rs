mod common;

use common::{DEPOSIT, INITIAL_RANGE, harness, within};
use range_vault_domain::token::{Address, SwapDirection, TokenPair};
use range_vault_domain::value_objects::{Percentage, SqrtPrice};
use range_vault_engine::config::VaultConfig;
use range_vault_engine::error::{VaultError, VenueError};
use range_vault_engine::events::EventData;
use range_vault_engine::venues::YieldReserve;
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};

#[test]
fn test_rebalance_requires_rebalancer() {
    let h = harness(VaultConfig::default());
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));

    assert_eq!(
        h.vault.rebalance(&h.alice, 50).unwrap_err(),
        VaultError::Unauthorized(h.alice.clone())
    );
    assert_eq!(
        h.vault.rebalance(&h.governance, 50).unwrap_err(),
        VaultError::Unauthorized(h.governance.clone())
    );
}

#[test]
fn test_rebalance_deploys_valid_range() {
    let h = harness(VaultConfig::default());
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));

    let report = h.vault.rebalance(&h.keeper, 50).unwrap();
    let range = report.range;
    assert_eq!(report.previous_range, INITIAL_RANGE);
    assert!(range.lower < range.upper);
    assert_eq!(range.lower % 60, 0);
    assert_eq!(range.upper % 60, 0);
    assert!(range.lower <= 0 && 0 < range.upper);
    assert!(report.swap.is_none());

    assert_eq!(h.vault.state().unwrap().range, range);
    assert_eq!(h.liquidity(), report.liquidity);
    assert!(report.liquidity > 0);

    // Whatever was not deployed went to the reserves.
    assert!(report.reserve_deposits.a > 0 && report.reserve_deposits.b > 0);
    assert_eq!(h.vault.state().unwrap().idle, TokenPair::ZERO);
    let vault = Address::from("vault");
    assert_eq!(
        h.market.reserve_a.balance_of_shares(&vault),
        report.reserve_deposits.a
    );
}

#[test]
fn test_full_allocation_leaves_only_dust() {
    let h = harness(VaultConfig::default());
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));

    let report = h.vault.rebalance(&h.keeper, 100).unwrap();
    assert!(report.deployed.a > DEPOSIT - 1_000);
    assert!(report.deployed.b > DEPOSIT - 1_000);
    assert!(report.reserve_deposits.a < 1_000);
}

#[test]
fn test_zero_share_keeps_range_empty() {
    let h = harness(VaultConfig::default());
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));
    h.vault.rebalance(&h.keeper, 50).unwrap();

    let previous = h.vault.state().unwrap().range;
    let report = h.vault.rebalance(&h.keeper, 0).unwrap();
    assert_eq!(report.liquidity, 0);
    assert_eq!(report.range, previous);
    assert_eq!(h.liquidity(), 0);
    assert!(h.vault.valuation().unwrap().reserves.a > DEPOSIT - 10);
}

#[test]
fn test_imbalance_inside_band_is_not_swapped() {
    let h = harness(
        VaultConfig::default().with_excess_ignore_band(Percentage::new(dec!(0.01)).unwrap()),
    );
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));
    h.market.pool.set_price(SqrtPrice::from_tick(100).unwrap());

    let report = h.vault.rebalance(&h.keeper, 50).unwrap();
    assert!(report.swap.is_none());
}

#[test]
fn test_imbalance_outside_band_sells_heavier_asset() {
    let h = harness(
        VaultConfig::default().with_excess_ignore_band(Percentage::new(dec!(0.001)).unwrap()),
    );
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));
    h.market.pool.set_price(SqrtPrice::from_tick(100).unwrap());

    let report = h.vault.rebalance(&h.keeper, 50).unwrap();
    let swap = report.swap.unwrap();
    assert_eq!(swap.direction, SwapDirection::AToB);
    assert!(swap.amount_in > 0 && swap.amount_out > 0);
    // Roughly half of the one percent excess.
    assert!(swap.amount_in < DEPOSIT / 100);
}

#[test]
fn test_swap_draws_from_reserve_when_idle_is_short() {
    let h = harness(VaultConfig::default());
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));
    h.vault.rebalance(&h.keeper, 0).unwrap();
    assert_eq!(h.vault.state().unwrap().idle, TokenPair::ZERO);

    h.market.pool.set_price(SqrtPrice::from_tick(2_000).unwrap());
    let report = h.vault.rebalance(&h.keeper, 50).unwrap();
    let swap = report.swap.unwrap();
    assert_eq!(swap.direction, SwapDirection::AToB);
    assert!(report.reserve_withdrawals.a >= swap.amount_in);
}

#[test]
fn test_invalid_share_rolls_back() {
    let h = harness(VaultConfig::default());
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));
    let state = h.vault.state().unwrap();

    assert_eq!(
        h.vault.rebalance(&h.keeper, 101).unwrap_err(),
        VaultError::InvalidAmmShare(101)
    );
    assert_eq!(h.vault.state().unwrap(), state);
}

#[test]
fn test_failing_reserve_rolls_back_whole_rebalance() {
    let h = harness(VaultConfig::default());
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));
    h.vault.rebalance(&h.keeper, 50).unwrap();
    h.vault.take_events().unwrap();

    let state = h.vault.state().unwrap();
    let liquidity = h.liquidity();
    let vault = Address::from("vault");
    let reserve_shares = (
        h.market.reserve_a.balance_of_shares(&vault),
        h.market.reserve_b.balance_of_shares(&vault),
    );

    h.market.reserve_b.set_halted(true);
    let err = h.vault.rebalance(&h.keeper, 30).unwrap_err();
    assert!(matches!(
        err,
        VaultError::Venue(VenueError::Rejected { .. })
    ));

    assert_eq!(h.vault.state().unwrap(), state);
    assert_eq!(h.liquidity(), liquidity);
    assert_eq!(
        (
            h.market.reserve_a.balance_of_shares(&vault),
            h.market.reserve_b.balance_of_shares(&vault),
        ),
        reserve_shares
    );
    assert!(h.vault.take_events().unwrap().is_empty());

    h.market.reserve_b.set_halted(false);
    assert!(h.vault.rebalance(&h.keeper, 30).is_ok());
}

#[test]
fn test_halted_pool_blocks_rebalance() {
    let h = harness(VaultConfig::default());
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));
    let state = h.vault.state().unwrap();

    h.market.pool.set_halted(true);
    assert!(h.vault.rebalance(&h.keeper, 50).is_err());
    assert_eq!(h.vault.state().unwrap(), state);
}

#[test]
fn test_rebalance_charges_fee_on_pool_gain() {
    let h = harness(
        VaultConfig::default().with_protocol_fee_rate(Percentage::new(dec!(0.2)).unwrap()),
    );
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));
    h.vault.rebalance(&h.keeper, 50).unwrap();

    let range = h.vault.state().unwrap().range;
    h.market
        .pool
        .accrue_fees(range.lower, range.upper, TokenPair::new(1_000, 500))
        .unwrap();

    let report = h.vault.rebalance(&h.keeper, 50).unwrap();
    assert_eq!(report.fee, TokenPair::new(200, 100));
    let state = h.vault.state().unwrap();
    assert_eq!(state.accrued_fee, TokenPair::new(200, 100));
    // Fees stay idle for the sweep.
    assert!(state.idle.a >= 200 && state.idle.b >= 100);
}

#[test]
fn test_reserve_gain_is_rebased_after_rebalance() {
    let h = harness(
        VaultConfig::default().with_protocol_fee_rate(Percentage::new(dec!(0.1)).unwrap()),
    );
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));
    h.vault.rebalance(&h.keeper, 50).unwrap();

    h.market
        .reserve_a
        .accrue_yield(Percentage::new(dec!(0.05)).unwrap())
        .unwrap();
    let first = h.vault.rebalance(&h.keeper, 50).unwrap();
    assert!(first.fee.a > 0);

    // Nothing new was earned, so nothing more is charged.
    let second = h.vault.rebalance(&h.keeper, 50).unwrap();
    assert_eq!(second.fee, TokenPair::ZERO);
    assert_eq!(h.vault.state().unwrap().accrued_fee, first.fee);
}

#[test]
fn test_nested_entry_is_rejected() {
    let h = harness(VaultConfig::default());
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let vault = Arc::downgrade(&h.vault);
    let record = Arc::clone(&seen);
    let bob = h.bob.clone();
    h.market.pool.set_open_hook(move || {
        if let Some(vault) = vault.upgrade() {
            let deposit = vault
                .deposit(&bob, TokenPair::new(100, 100), TokenPair::ZERO, &bob)
                .map(|receipt| receipt.shares);
            let view = vault.total_value().map(|_| 0);
            record.lock().unwrap().extend([deposit, view]);
        }
    });

    h.vault.rebalance(&h.keeper, 50).unwrap();
    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![Err(VaultError::Reentrant), Err(VaultError::Reentrant)]
    );
    assert_eq!(h.vault.balance_of(&h.bob).unwrap(), 0);
}

#[test]
fn test_idle_at_threshold_stays_idle() {
    let h = harness(
        VaultConfig::default().with_reserve_deposit_threshold(TokenPair::new(DEPOSIT, 0)),
    );
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));

    let report = h.vault.rebalance(&h.keeper, 0).unwrap();
    assert_eq!(report.reserve_deposits, TokenPair::new(0, DEPOSIT));
    assert_eq!(h.vault.state().unwrap().idle, TokenPair::new(DEPOSIT, 0));
    assert_eq!(
        h.market.reserve_a.balance_of_shares(&Address::from("vault")),
        0
    );
}

#[test]
fn test_withdrawal_buffer_pulls_extra_from_reserves() {
    let h = harness(
        VaultConfig::default().with_withdrawal_buffer(Percentage::new(dec!(0.1)).unwrap()),
    );
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));
    h.vault.rebalance(&h.keeper, 0).unwrap();
    assert_eq!(h.vault.state().unwrap().idle, TokenPair::ZERO);

    let report = h.vault.rebalance(&h.keeper, 50).unwrap();
    let half = DEPOSIT / 2;
    assert_eq!(
        report.reserve_withdrawals,
        TokenPair::new(half + half / 10, half + half / 10)
    );
    assert!(within(report.deployed.a, half, DEPOSIT / 1_000));
    assert!(within(report.deployed.b, half, DEPOSIT / 1_000));
    // The unused buffer goes back to the reserves.
    assert!(report.reserve_deposits.a > 0 && report.reserve_deposits.b > 0);
}

#[test]
fn test_reserve_loss_does_not_offset_other_gain() {
    let h = harness(
        VaultConfig::default().with_protocol_fee_rate(Percentage::new(dec!(0.1)).unwrap()),
    );
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));
    h.vault.rebalance(&h.keeper, 50).unwrap();

    h.market
        .reserve_a
        .accrue_yield(Percentage::new(dec!(0.1)).unwrap())
        .unwrap();
    h.market.reserve_b.set_exchange_rate(900_000);

    let report = h.vault.rebalance(&h.keeper, 50).unwrap();
    assert_eq!(report.fee, TokenPair::new(5_000_000_000, 0));
    assert_eq!(
        h.vault.state().unwrap().accrued_fee,
        TokenPair::new(5_000_000_000, 0)
    );
}

#[test]
fn test_late_depositor_cannot_dilute_holders() {
    let h = harness(
        VaultConfig::default().with_protocol_fee_rate(Percentage::new(dec!(0.1)).unwrap()),
    );
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));
    h.vault.rebalance(&h.keeper, 50).unwrap();

    h.market
        .pool
        .trade_to(SqrtPrice::from_tick(-300).unwrap())
        .unwrap();
    h.market
        .reserve_a
        .accrue_yield(Percentage::new(dec!(0.05)).unwrap())
        .unwrap();
    h.market
        .reserve_b
        .accrue_yield(Percentage::new(dec!(0.02)).unwrap())
        .unwrap();
    let before = h.vault.total_value().unwrap();

    let receipt = h
        .vault
        .deposit(
            &h.bob,
            TokenPair::new(DEPOSIT, DEPOSIT),
            TokenPair::ZERO,
            &h.bob,
        )
        .unwrap();
    let out = h.withdraw_all(&h.bob);

    assert!(out.a <= receipt.taken.a && out.b <= receipt.taken.b);
    assert!(within(out.a, receipt.taken.a, DEPOSIT / 1_000_000));
    assert!(within(out.b, receipt.taken.b, DEPOSIT / 1_000_000));

    // Alice keeps at least what she had, up to valuation rounding.
    let after = h.vault.total_value().unwrap();
    assert!(after.a + 10 >= before.a);
    assert!(after.b + 10 >= before.b);
}

#[test]
fn test_rebalance_event_reports_fee_totals() {
    let h = harness(
        VaultConfig::default().with_protocol_fee_rate(Percentage::new(dec!(0.2)).unwrap()),
    );
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));
    h.vault.rebalance(&h.keeper, 50).unwrap();

    let range = h.vault.state().unwrap().range;
    h.market
        .pool
        .accrue_fees(range.lower, range.upper, TokenPair::new(1_000, 500))
        .unwrap();
    h.vault.rebalance(&h.keeper, 50).unwrap();
    h.vault.take_events().unwrap();

    // A later rebalance charges nothing new but still reports the running total.
    let report = h.vault.rebalance(&h.keeper, 50).unwrap();
    assert_eq!(report.fee, TokenPair::ZERO);
    let events = h.vault.take_events().unwrap();
    let data = match &events[..] {
        [event] => match &event.data {
            EventData::Rebalance(data) => data.clone(),
            other => panic!("unexpected event {other:?}"),
        },
        other => panic!("expected one event, got {}", other.len()),
    };
    assert_eq!(data.fee, TokenPair::ZERO);
    assert_eq!(data.accrued_fee, TokenPair::new(200, 100));
    assert_eq!(data.reserve_withdrawals, report.reserve_withdrawals);
}
