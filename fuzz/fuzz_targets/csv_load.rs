#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let csv = String::from_utf8_lossy(data);
    let loader = binsize::loaders::BloatyLoader::default();
    if let Ok(rows) = loader.parse_csv(&csv, None) {
        let _ = binsize::pipeline::stages::aggregate(rows);
    }
});
