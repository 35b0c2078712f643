use tally::parse::parse_text;
use tally::{Directive, Ledger, TxnFlag};

/// Parses `text`, renders it back to canonical form, re-parses that, and
/// checks the second pass reproduces the first byte for byte.
fn roundtrip(text: &str) -> Ledger {
    let (ledger, errors) = Ledger::from_text(text, "input");
    assert!(errors.is_empty(), "parse failed: {:?}", errors);
    let rendered = ledger.to_string();
    let (reparsed, errors) = Ledger::from_text(&rendered, "rendered");
    assert!(
        errors.is_empty(),
        "re-parse failed: {:?}\nrendered:\n{}",
        errors,
        rendered
    );
    assert_eq!(rendered, reparsed.to_string());
    ledger
}

#[test]
fn roundtrip_narration_only_txn() {
    let ledger = roundtrip("2015-03-20 * \"Dinner tickets\"\n");
    match &ledger.directives()[0] {
        Directive::Txn(txn) => {
            assert_eq!(txn.payee(), &None);
            assert_eq!(txn.narration(), "Dinner tickets");
        }
        other => panic!("expected txn, got {:?}", other),
    }
}

#[test]
fn roundtrip_payee_and_narration() {
    let ledger = roundtrip(
        "2015-03-20 * \"Outstanding in the Field dinner\" \"Dinner tickets\"\n\
         \x20 Income:Sheila -244.06 USD\n\
         \x20 Income:Caroline -488.12 USD\n\
         \x20 Expenses:Food:Restaurant\n",
    );
    match &ledger.directives()[0] {
        Directive::Txn(txn) => {
            assert_eq!(txn.flag(), TxnFlag::Char('*'));
            assert_eq!(txn.payee().as_deref(), Some("Outstanding in the Field dinner"));
            assert_eq!(txn.postings().len(), 3);
            assert_eq!(txn.postings()[2].amount, None);
        }
        other => panic!("expected txn, got {:?}", other),
    }
}

#[test]
fn roundtrip_unit_price() {
    roundtrip("2015-03-20 * \"transfer\"\n  Assets:Checking -400.00 USD @ 1.09 CAD\n");
}

#[test]
fn roundtrip_total_price() {
    roundtrip("2015-03-20 * \"transfer\"\n  Assets:Checking -400.00 USD @@ 436.01 CAD\n");
}

#[test]
fn roundtrip_cost_with_lot_date() {
    roundtrip("2015-03-20 * \"buy\"\n  Assets:Brokerage 10.00 USD {9.50 USD / 2015-01-01}\n");
}

#[test]
fn roundtrip_mixed_source() {
    let ledger = roundtrip(
        "begintag \"trip-boston\"\n\
         2015-01-01 open Assets:Checking USD, EUR \"FIFO\"\n\
         2015-01-02 pad Assets:Checking Equity:Opening\n\
         2015-01-03 check Assets:Checking 100.00 USD\n\
         2015-01-04 price AAPL 120.50 USD\n\
         2015-01-05 note Assets:Checking \"called the bank\"\n\
         2015-01-06 event \"address\" \"Boston\"\n\
         2015-01-07 location \"Boston\"\n\
         2015-03-20 = 2015-03-25 txn \"Check deposit\"\n\
         \x20 Assets:Checking 500.00 USD\n\
         \x20 Income:Consulting\n\
         2015-12-31 close Assets:Checking\n\
         endtag \"trip-boston\"\n",
    );
    assert_eq!(ledger.directives().len(), 11);
}

#[test]
fn errors_do_not_suppress_later_entries() {
    let (directives, errors) = parse_text(
        "2015-01-01 open Assets:Checking\n\
         2015-01-02 * \"broken\n\
         \x20 Assets:Checking 1 USD\n\
         bogus line\n\
         2015-01-03 * \"fine\"\n\
         \x20 Assets:Checking 2.00 USD\n\
         \x20 Income:Misc\n",
        "recovery.ledger",
    );
    assert_eq!(errors.len(), 2);
    let kinds: Vec<&str> = directives
        .iter()
        .map(|directive| match directive {
            Directive::Open(_) => "open",
            Directive::Txn(_) => "txn",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["open", "txn"]);
}

#[test]
fn diagnostics_carry_source_name_and_line() {
    let (_, errors) = parse_text("2015-13-40 open Assets:Cash\n", "bad.ledger");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].src.file.as_str(), "bad.ledger");
    assert_eq!(errors[0].src.start.line, 1);
    let shown = errors[0].to_string();
    assert!(shown.contains("bad.ledger:1:"), "display was {:?}", shown);
}
