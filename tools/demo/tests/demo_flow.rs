//! Demo flow test
//!
//! Runs the walkthrough for each settlement path and checks final balances.

use contracts::config::EngineConfig;
use contracts::events::ContractEvent;
use trade_demo::{run, DemoOptions, Settlement};
use types::ids::Identity;
use types::numeric::Money;
use types::trade::TradeState;

fn balance(report: &trade_demo::DemoReport, account: &str) -> Money {
    report
        .balances
        .iter()
        .find(|b| b.account == Identity::new(account))
        .map(|b| b.balance)
        .unwrap()
}

#[test]
fn test_complete_path() {
    let options = DemoOptions::with_defaults(EngineConfig::new("owner"));
    let report = run(&options).unwrap();

    assert_eq!(report.trades.len(), 1);
    assert_eq!(report.trades[0].state, TradeState::Completed);
    assert_eq!(report.events.len(), 3);
    assert_eq!(balance(&report, "seller"), Money::from(102));
    assert_eq!(balance(&report, "buyer"), Money::from(98));
    assert_eq!(balance(&report, "owner"), Money::from(100));
}

#[test]
fn test_dispute_for_seller_path() {
    let options = DemoOptions {
        settlement: Settlement::Dispute { favor_seller: true },
        ..DemoOptions::with_defaults(EngineConfig::new("owner"))
    };
    let report = run(&options).unwrap();

    assert_eq!(report.trades[0].state, TradeState::ResolvedForSeller);
    assert!(matches!(
        report.events.last(),
        Some(ContractEvent::DisputeResolved(_))
    ));
    assert_eq!(balance(&report, "seller"), Money::from(102));
    assert_eq!(balance(&report, "buyer"), Money::from(98));
}

#[test]
fn test_dispute_for_buyer_path() {
    let options = DemoOptions {
        settlement: Settlement::Dispute {
            favor_seller: false,
        },
        ..DemoOptions::with_defaults(EngineConfig::new("owner"))
    };
    let report = run(&options).unwrap();

    assert_eq!(report.trades[0].state, TradeState::ResolvedForBuyer);
    assert_eq!(balance(&report, "seller"), Money::from(100));
    assert_eq!(balance(&report, "buyer"), Money::from(100));
}

#[test]
fn test_arbitrator_as_buyer_funded_once() {
    let options = DemoOptions {
        buyer: Identity::new("owner"),
        ..DemoOptions::with_defaults(EngineConfig::new("owner"))
    };
    let report = run(&options).unwrap();

    assert_eq!(report.trades[0].state, TradeState::Completed);
    assert_eq!(report.balances.len(), 2);
    assert_eq!(balance(&report, "seller"), Money::from(102));
    assert_eq!(balance(&report, "owner"), Money::from(98));
}

#[test]
fn test_underfunded_buyer_fails() {
    let options = DemoOptions {
        price: Money::from(500),
        ..DemoOptions::with_defaults(EngineConfig::new("owner"))
    };
    let err = run(&options).unwrap_err();
    assert!(err.to_string().contains("buyer accepts trade"));
}

#[test]
fn test_report_serializes() {
    let report = run(&DemoOptions::with_defaults(EngineConfig::new("owner"))).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["trades"][0]["state"], "COMPLETED");
    assert_eq!(json["trades"][0]["trade_id"], 0);
}
