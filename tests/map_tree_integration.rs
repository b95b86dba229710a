mod common;

use binsize::maptree::{self, parse_map, TrieNode, DEFAULT_SECTIONS};
use binsize::BinSizeError;
use common::read_sample;
use common::test_data::FIRMWARE_MAP;

fn sections(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_sample_map_sections() {
    let map = parse_map(&read_sample(FIRMWARE_MAP)).unwrap();
    let names: Vec<&str> = map.super_section_names().collect();
    assert_eq!(names, vec![".vector_table", ".flash", ".flash2", ".data", ".bss"]);

    let flash2 = map.super_section(".flash2").unwrap();
    let sizes: Vec<(&str, u64)> = flash2
        .iter()
        .map(|s| (s.name.as_str(), s.total_size()))
        .collect();
    assert_eq!(
        sizes,
        vec![(".rodata.nist256p1", 2048), (".text.tiny", 2), (".text.two_over_pi", 16)]
    );
}

#[test]
fn test_report_over_default_sections() {
    let report =
        maptree::map_tree_report(&read_sample(FIRMWARE_MAP), &sections(DEFAULT_SECTIONS)).unwrap();
    let lines: Vec<&str> = report.lines().collect();

    assert!(lines.contains(&".: 1318"));
    assert!(report.contains("*.text.small_helper: 6"));
    assert!(report.contains("*.data.#Rust#trezor_lib::ui: 8"));
    assert!(report.contains("#Rust#trezor_lib::protobuf::decode::Decoder: 1200"));
    // .flash2 was not asked for
    assert!(!report.contains("nist256p1"));
}

#[test]
fn test_tree_totals() {
    let tree = maptree::build_tree(&read_sample(FIRMWARE_MAP), &sections(&[".flash2"])).unwrap();
    assert_eq!(tree.total_size(), 0x812);
    match tree.get(".") {
        Some(node @ TrieNode::Branch(_)) => assert_eq!(node.total_size(), 0x812),
        other => panic!("expected a branch at the root, got {other:?}"),
    }
}

#[test]
fn test_unknown_section_is_an_error() {
    let err = maptree::map_tree_report(&read_sample(FIRMWARE_MAP), &sections(&[".ccmram"]))
        .unwrap_err();
    assert!(matches!(err, BinSizeError::MapFile(_)));
}

#[test]
fn test_text_without_banner_is_rejected() {
    assert!(matches!(
        parse_map(".flash 0x0 0x10\n"),
        Err(BinSizeError::MapFile(_))
    ));
}
