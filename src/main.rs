//! Next-price perpetual futures simulation.
//!
//! Walks the accounting core through its lifecycle: two-phase orders, funding
//! accrual, liquidation, debt cap and the skew-aware fee schedule.

use perps_nextprice::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const ASSET: &str = "ETH";
const OWNER: AccountId = AccountId(1);
const FEE_SINK: AccountId = AccountId(2);
const ALICE: AccountId = AccountId(10);
const BOB: AccountId = AccountId(11);
const KEEPER: AccountId = AccountId(20);

type SimEngine = Engine<ManualOracle, InMemoryLedger>;

fn main() -> Result<(), EngineError> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    println!("Next-Price Perpetual Futures Simulation");
    println!("Single Asset, Two-Phase Orders, Skew Funding\n");

    scenario_1_two_phase_order()?;
    scenario_2_funding_accrual()?;
    scenario_3_liquidation()?;
    scenario_4_debt_cap()?;
    scenario_5_fee_schedule()?;

    info!("all scenarios completed");
    println!("\nAll simulations completed successfully.");
    Ok(())
}

// literals only; a negative value would turn into a close order
fn leverage(value: Decimal) -> Leverage {
    Leverage::new(value).unwrap_or_else(Leverage::zero)
}

fn setup_engine(params: MarketParams) -> Result<SimEngine, EngineError> {
    let mut collateral = InMemoryLedger::new();
    for account in [ALICE, BOB] {
        collateral.deposit(account, Quote::new(dec!(100000)));
    }

    let collaborators = Collaborators {
        oracle: ManualOracle::new().with_round(ASSET, dec!(100), RoundId(10)),
        collateral,
        fee_sink: FEE_SINK,
    };
    Engine::new(EngineConfig::default(), params, OWNER, collaborators)
}

fn print_position(engine: &SimEngine, account: AccountId) {
    match engine.position(account) {
        Some(position) => {
            let (remaining, _) = engine.remaining_margin(account);
            let (liq_price, _) = engine.liquidation_price(account, true);
            println!(
                "  {}: size {} @ ${}, margin ${}, remaining ${}, liq ${}",
                account, position.size, position.entry_price, position.margin, remaining, liq_price
            );
        }
        None => println!("  {}: no position", account),
    }
}

/// Submit in round 10, try to confirm in the same round, confirm in round 11.
fn scenario_1_two_phase_order() -> Result<(), EngineError> {
    println!("Scenario 1: Two-Phase Order\n");

    let mut engine = setup_engine(MarketParams::default())?;

    let receipt = engine.submit_order(ALICE, Quote::new(dec!(1000)), leverage(dec!(5)))?;
    println!(
        "  Alice submits 1000 @ {} in {}: fee ${}, escrow ${}",
        receipt.leverage, receipt.round_id, receipt.fee, receipt.escrow
    );

    if let Err(err) = engine.confirm_order(ALICE) {
        println!("  Confirm in the same round: {}", err);
    }

    let round = engine.oracle_mut().push_price(ASSET, dec!(110));
    println!("  Oracle moves to $110 in {}", round);

    if let ConfirmOutcome::Confirmed(confirmed) = engine.confirm_order(ALICE)? {
        println!("  Confirmed: size {} @ ${}", confirmed.size, confirmed.entry_price);
    }
    print_position(&engine, ALICE);

    let (long, short) = engine.market_sizes();
    println!("  Open interest: {} long, {} short\n", long, short);
    Ok(())
}

/// Longs dominate, an hour passes, funding accrues.
fn scenario_2_funding_accrual() -> Result<(), EngineError> {
    println!("Scenario 2: Funding Accrual\n");

    let mut engine = setup_engine(MarketParams::default())?;

    engine.submit_order(ALICE, Quote::new(dec!(3000)), leverage(dec!(4)))?;
    engine.submit_order(BOB, Quote::new(dec!(-1000)), leverage(dec!(4)))?;
    engine.oracle_mut().push_price(ASSET, dec!(100));
    engine.confirm_order(ALICE)?;
    engine.confirm_order(BOB)?;

    println!("  Proportional skew: {}", engine.proportional_skew());
    println!("  Funding rate: {} per second", engine.current_funding_rate());

    engine.advance_time(3_600_000);
    let (unrecorded, _) = engine.unrecorded_funding();
    println!("  At {}, unrecorded funding per unit: {}", engine.time(), unrecorded);

    engine.recompute_funding()?;
    println!("  Funding sequence length: {}", engine.funding_sequence_length());
    for account in [ALICE, BOB] {
        let (funding, _) = engine.accrued_funding(account);
        println!("  {} accrued funding: ${}", account, funding);
    }
    println!();
    Ok(())
}

/// Price falls through the liquidation price, a keeper liquidates.
fn scenario_3_liquidation() -> Result<(), EngineError> {
    println!("Scenario 3: Liquidation\n");

    let mut engine = setup_engine(MarketParams::default())?;

    engine.submit_order(ALICE, Quote::new(dec!(1000)), leverage(dec!(10)))?;
    engine.oracle_mut().push_price(ASSET, dec!(100));
    engine.confirm_order(ALICE)?;
    print_position(&engine, ALICE);

    for price in [dec!(96), dec!(92), dec!(90.1)] {
        engine.oracle_mut().push_price(ASSET, price);
        println!("  Price ${}: can liquidate = {}", price, engine.can_liquidate(ALICE));
    }

    let result = engine.liquidate_position(ALICE, KEEPER)?;
    println!(
        "  Liquidated {} @ ${} (liq price ${}), keeper reward ${}",
        result.size, result.price, result.liquidation_price, result.reward
    );
    println!("  Keeper balance: ${}", engine.collateral().balance_of(KEEPER));
    print_position(&engine, ALICE);
    println!();
    Ok(())
}

/// Orders that would push market debt past the cap are rejected.
fn scenario_4_debt_cap() -> Result<(), EngineError> {
    println!("Scenario 4: Market Debt Cap\n");

    let mut params = MarketParams::default();
    params.max_market_debt = Quote::new(dec!(5000));
    let mut engine = setup_engine(params)?;

    engine.submit_order(ALICE, Quote::new(dec!(3000)), leverage(dec!(2)))?;
    let (debt, _) = engine.market_debt();
    println!("  Debt after Alice's order: ${}", debt);

    match engine.submit_order(BOB, Quote::new(dec!(3000)), leverage(dec!(2))) {
        Ok(_) => println!("  Bob's order accepted"),
        Err(err) => println!("  Bob's order rejected: {}", err),
    }

    let (debt, _) = engine.market_debt();
    println!("  Debt unchanged: ${}", debt);
    println!("  Bob balance untouched: ${}\n", engine.collateral().balance_of(BOB));
    Ok(())
}

/// Orders against the skew pay less.
fn scenario_5_fee_schedule() -> Result<(), EngineError> {
    println!("Scenario 5: Skew-Aware Fees\n");

    let mut engine = setup_engine(MarketParams::default())?;

    engine.submit_order(ALICE, Quote::new(dec!(2000)), leverage(dec!(5)))?;
    engine.oracle_mut().push_price(ASSET, dec!(100));
    engine.confirm_order(ALICE)?;

    let lev = leverage(dec!(5));
    for margin in [dec!(1000), dec!(-1000), dec!(-3000)] {
        if let Some((fee, _)) = engine.order_fee(Quote::new(margin), lev) {
            println!("  Margin {} @ {}: fee ${}", margin, lev, fee);
        }
    }

    engine.set_exchange_fee(OWNER, dec!(0.001))?;
    if let Some((fee, _)) = engine.order_fee(Quote::new(dec!(1000)), lev) {
        println!("  After lowering the fee rate to 10 bps: ${}", fee);
    }

    if let Err(err) = engine.set_exchange_fee(BOB, dec!(0)) {
        println!("  Bob tries to zero the fee: {}", err);
    }
    Ok(())
}
