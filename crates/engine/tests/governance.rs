mod common;

use common::{DEPOSIT, harness};
use range_vault_domain::token::{Address, Asset, TokenPair};
use range_vault_domain::value_objects::{Percentage, SqrtPrice};
use range_vault_engine::config::VaultConfig;
use range_vault_engine::error::VaultError;
use range_vault_engine::events::{EventData, VaultEventType};
use range_vault_engine::vault::Vault;
use range_vault_engine::venues::{Venue, YieldReserve};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::thread;

#[test]
fn test_vault_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Vault>();
}

#[test]
fn test_admin_requires_governance() {
    let h = harness(VaultConfig::default());
    let rate = Percentage::from_bps(100).unwrap();

    assert_eq!(
        h.vault.set_protocol_fee_rate(&h.alice, rate).unwrap_err(),
        VaultError::Unauthorized(h.alice.clone())
    );
    assert!(h.vault.pause_deposits(&h.keeper).is_err());
    assert!(h.vault.sweep_fees(&h.alice, &h.alice).is_err());
    assert!(h.vault.emergency_unwind(&h.alice, Venue::Amm).is_err());

    h.vault.set_protocol_fee_rate(&h.governance, rate).unwrap();
    assert_eq!(h.vault.state().unwrap().config.protocol_fee_rate, rate);

    let events = h.vault.take_events().unwrap();
    assert_eq!(events.len(), 1);
    match &events[0].data {
        EventData::ConfigChanged(data) => assert_eq!(data.field, "protocol_fee_rate"),
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn test_invalid_setting_is_reverted() {
    let h = harness(VaultConfig::default());
    let err = h.vault.set_max_total_supply(&h.governance, 0).unwrap_err();
    assert!(matches!(err, VaultError::InvalidConfig(_)));
    assert_eq!(h.vault.state().unwrap().config.max_total_supply, u128::MAX);
    assert!(h.vault.take_events().unwrap().is_empty());
}

#[test]
fn test_new_rebalancer_takes_over() {
    let h = harness(VaultConfig::default());
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));
    let bot = Address::from("bot");

    h.vault.set_rebalancer(&h.governance, bot.clone()).unwrap();
    assert!(matches!(
        h.vault.rebalance(&h.keeper, 50).unwrap_err(),
        VaultError::Unauthorized(_)
    ));
    assert!(h.vault.rebalance(&bot, 50).is_ok());
}

#[test]
fn test_pause_gates_deposit_and_rebalance_only() {
    let h = harness(VaultConfig::default());
    let shares = h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));

    h.vault.pause_deposits(&h.governance).unwrap();
    h.vault.pause_rebalance(&h.governance).unwrap();
    assert!(h.vault.deposits_paused() && h.vault.rebalance_paused());

    assert_eq!(
        h.vault
            .deposit(&h.bob, TokenPair::new(100, 100), TokenPair::ZERO, &h.bob)
            .unwrap_err(),
        VaultError::Paused("deposit")
    );
    assert_eq!(
        h.vault.rebalance(&h.keeper, 50).unwrap_err(),
        VaultError::Paused("rebalance")
    );

    let receipt = h
        .vault
        .withdraw(&h.alice, shares / 2, TokenPair::ZERO, &h.alice)
        .unwrap();
    assert_eq!(receipt.amounts, TokenPair::new(DEPOSIT / 2, DEPOSIT / 2));

    h.vault.resume_deposits(&h.governance).unwrap();
    h.vault.resume_rebalance(&h.governance).unwrap();
    h.deposit(&h.bob, TokenPair::new(100, 100));
    assert!(h.vault.rebalance(&h.keeper, 50).is_ok());
}

#[test]
fn test_fees_accumulate_until_swept() {
    let h = harness(
        VaultConfig::default().with_protocol_fee_rate(Percentage::new(dec!(0.1)).unwrap()),
    );
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));
    h.deposit(&h.bob, TokenPair::new(DEPOSIT, DEPOSIT));
    h.vault.rebalance(&h.keeper, 50).unwrap();

    let mut last = TokenPair::ZERO;
    for tick in [-120, 60, -60, 0] {
        h.market
            .pool
            .trade_to(SqrtPrice::from_tick(tick).unwrap())
            .unwrap();
        h.vault.rebalance(&h.keeper, 50).unwrap();
        let fee = h.vault.state().unwrap().accrued_fee;
        assert!(fee.a >= last.a && fee.b >= last.b);
        last = fee;
    }
    assert!(last.a > 0 && last.b > 0);

    h.withdraw_all(&h.alice);
    let fee = h.vault.state().unwrap().accrued_fee;
    assert!(fee.a >= last.a && fee.b >= last.b);

    let swept = h.vault.sweep_fees(&h.governance, &h.treasury).unwrap();
    assert_eq!(swept, fee);
    assert_eq!(h.market.wallets.balance(&h.treasury), fee);
    assert_eq!(h.vault.state().unwrap().accrued_fee, TokenPair::ZERO);

    // Bob's claim is untouched by the sweep.
    let bob = h.withdraw_all(&h.bob);
    assert!(bob.a > DEPOSIT / 100 * 99 && bob.b > DEPOSIT / 100 * 99);
}

#[test]
fn test_emergency_unwind_moves_venue_to_idle() {
    let h = harness(
        VaultConfig::default().with_protocol_fee_rate(Percentage::new(dec!(0.1)).unwrap()),
    );
    h.deposit(&h.alice, TokenPair::new(DEPOSIT, DEPOSIT));
    h.vault.rebalance(&h.keeper, 50).unwrap();
    let range = h.vault.state().unwrap().range;
    let before = h.vault.total_value().unwrap();

    let amm = h.vault.emergency_unwind(&h.governance, Venue::Amm).unwrap();
    assert_eq!(amm.venue, Venue::Amm);
    assert_eq!(h.liquidity(), 0);
    let state = h.vault.state().unwrap();
    assert_eq!(state.range, range);
    assert_eq!(state.idle, amm.recovered);

    h.market
        .reserve_a
        .accrue_yield(Percentage::new(dec!(0.1)).unwrap())
        .unwrap();
    let reserve = h
        .vault
        .emergency_unwind(&h.governance, Venue::Reserve(Asset::A))
        .unwrap();
    assert!(reserve.fee.a > 0);
    let vault = Address::from("vault");
    assert_eq!(h.market.reserve_a.balance_of_shares(&vault), 0);
    let state = h.vault.state().unwrap();
    assert_eq!(state.reserve_deposited.a, 0);
    assert_eq!(state.accrued_fee, reserve.fee);

    let after = h.vault.total_value().unwrap();
    assert!(after.a > before.a);
    assert!(after.b + 2 >= before.b);

    let out = h.withdraw_all(&h.alice);
    assert_eq!(out, after);
}

#[test]
fn test_concurrent_deposits_serialize() {
    let h = harness(VaultConfig::default());
    h.deposit(&h.alice, TokenPair::new(1_000, 1_000));

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let vault = Arc::clone(&h.vault);
            let who = Address::new(format!("worker-{worker}"));
            h.market
                .wallets
                .fund(&who, TokenPair::new(DEPOSIT, DEPOSIT));
            thread::spawn(move || {
                let mut minted = 0;
                for _ in 0..10 {
                    minted += vault
                        .deposit(&who, TokenPair::new(100, 100), TokenPair::ZERO, &who)
                        .unwrap()
                        .shares;
                }
                minted
            })
        })
        .collect();

    let minted: u128 = handles.into_iter().map(|handle| handle.join().unwrap()).sum();
    assert_eq!(minted, 4_000);
    assert_eq!(h.vault.total_supply().unwrap(), 5_000);
    assert_eq!(h.vault.total_value().unwrap(), TokenPair::new(5_000, 5_000));

    let kinds = h.vault.take_events().unwrap();
    assert_eq!(
        kinds
            .iter()
            .filter(|event| event.event_type == VaultEventType::Deposit)
            .count(),
        41
    );
}
