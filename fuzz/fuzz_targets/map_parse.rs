#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    if let Ok(map) = binsize::maptree::parse_map(&text) {
        let names: Vec<String> = map.super_section_names().map(str::to_string).collect();
        let _ = binsize::maptree::map_tree_report(&text, &names);
    }
});
