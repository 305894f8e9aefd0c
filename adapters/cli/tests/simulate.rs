use std::process::Command;

use lane_defence_core::{Phase, SessionSnapshot};

fn lane_defence(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_lane-defence"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run lane-defence")
}

#[test]
fn simulate_prints_the_final_snapshot() {
    let output = lane_defence(&[
        "simulate",
        "--seconds",
        "10",
        "--starting-gold",
        "50",
        "--build",
        "0:barracks:2",
        "--build",
        "1:farm:13",
        "--compact",
    ]);
    assert!(output.status.success(), "simulate failed: {output:?}");

    let snapshot: SessionSnapshot =
        serde_json::from_slice(&output.stdout).expect("stdout is a snapshot");
    assert_eq!(snapshot.phase, Phase::InProgress);
    assert_eq!(snapshot.round, 10);
    assert_eq!(snapshot.grid.iter().flatten().count(), 2);
    assert_eq!(snapshot.units.len(), 1);
}

#[test]
fn catalog_lists_every_kind() {
    let output = lane_defence(&["catalog"]);
    assert!(output.status.success());

    let listing = String::from_utf8(output.stdout).expect("utf-8 listing");
    for id in [
        "mageTower",
        "barracks",
        "defenseWall",
        "farm",
        "repairStation",
        "castle",
        "warrior",
        "paladin",
    ] {
        assert!(listing.contains(id), "{id} missing from catalog");
    }
    for name in ["Mage Tower", "Repair Station", "Paladin"] {
        assert!(listing.contains(name), "{name} missing from catalog");
    }
}

#[test]
fn malformed_build_orders_fail_fast() {
    let output = lane_defence(&["simulate", "--build", "barracks"]);
    assert!(!output.status.success());
}
