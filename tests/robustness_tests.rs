use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_malformed_menu_rows_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let menu_path = dir.path().join("menu.csv");
    let mut wtr = csv::Writer::from_path(&menu_path).unwrap();
    wtr.write_record(["id", "name", "price", "category", "available"])
        .unwrap();

    // Valid item
    wtr.write_record(["burger", "Burger", "5.00", "mains", "true"])
        .unwrap();
    // Text in price field
    wtr.write_record(["soup", "Soup", "cheap", "mains", "true"])
        .unwrap();
    // Negative price
    wtr.write_record(["tea", "Tea", "-1.00", "drinks", "true"])
        .unwrap();
    // Not a boolean
    wtr.write_record(["cola", "Cola", "1.50", "drinks", "maybe"])
        .unwrap();
    // Valid item again
    wtr.write_record(["fries", "Fries", "2.50", "sides", ""])
        .unwrap();
    wtr.flush().unwrap();
    drop(wtr);

    let mut cmd = Command::new(cargo_bin!("selforder"));
    cmd.arg("--menu").arg(&menu_path).arg("menu");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("skipping menu row"))
        .stdout(predicate::str::contains("\"burger\""))
        .stdout(predicate::str::contains("\"fries\""))
        .stdout(predicate::str::contains("soup").not())
        .stdout(predicate::str::contains("cola").not());
}

#[test]
fn test_malformed_promotion_rows_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let promos_path = dir.path().join("promos.csv");
    std::fs::write(
        &promos_path,
        "promo_code,discount_percent,min_order_amount,valid_until,active\n\
         HUGE,150,0,2099-12-31,true\n\
         SOON,10,0,someday,true\n\
         FIVE,5,0,2099-12-31,true\n",
    )
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("selforder"));
    cmd.args(["--menu", "tests/fixtures/menu.csv"])
        .arg("--promos")
        .arg(&promos_path)
        .args(["tool", "get_promo", r#"{"promo_code": "five"}"#]);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("skipping promotion row"))
        .stdout(predicate::str::contains("\"applicable\": true"));
}
