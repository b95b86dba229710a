use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use std::fs;
use std::hint::black_box;

use binsize::loaders::BloatyLoader;
use binsize::maptree::map_tree_report;
use binsize::pipeline::stages::{add_basic_info, aggregate};
use binsize::{DataRow, SourceLayout};

/// Symbol shapes seen in real firmware, one per handler.
fn symbol_samples() -> Vec<&'static str> {
    vec![
        "trezor_lib::protobuf::decode::Decoder::decode_field::hab425281b2042fd5",
        "trezor_lib::ui::layout::obj::LayoutObj::obj_delete::h0000000000000001",
        "trezor_lib::util::try_or_raise::{{closure}}::h3333333333333333",
        "fun_data_apps_workflow_handlers__lt_module_gt__find_message_handler_module",
        "const_table_data_apps_base__lt_module_gt__handle_Initialize",
        "const_obj_storage_common__lt_module_gt__0",
        "nist256p1",
        "[section .flash]",
    ]
}

fn make_rows(repeat: usize) -> Vec<DataRow> {
    let samples = symbol_samples();
    samples
        .iter()
        .cycle()
        .take(samples.len() * repeat)
        .enumerate()
        .map(|(i, s)| DataRow::new(*s, ".flash", (i % 512) as u64))
        .collect()
}

fn bench_classification(c: &mut Criterion) {
    let mut group = c.benchmark_group("classification");
    let layout = SourceLayout::with_core_dir("samples/core");

    let rows = make_rows(250); // 2k rows
    group.throughput(Throughput::Elements(rows.len() as u64));
    group.bench_function("add_basic_info", |b| {
        b.iter_batched(
            || rows.clone(),
            |data| black_box(add_basic_info(data, &layout)),
            BatchSize::SmallInput,
        )
    });

    let classified = add_basic_info(rows.clone(), &layout);
    group.bench_function("aggregate", |b| {
        b.iter_batched(
            || classified.clone(),
            |data| black_box(aggregate(data)),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_inputs(c: &mut Criterion) {
    let mut group = c.benchmark_group("inputs");
    let loader = BloatyLoader::default();

    if let Ok(csv) = fs::read_to_string("samples/firmware/firmware.csv") {
        // Grow the capture so parsing dominates setup
        let body: String = csv.lines().skip(1).map(|l| format!("{l}\n")).collect();
        let header = csv.lines().next().unwrap_or_default();
        let big = format!("{header}\n{}", body.repeat(200));
        group.throughput(Throughput::Bytes(big.len() as u64));
        group.bench_function("parse_csv", |b| {
            b.iter(|| black_box(loader.parse_csv(&big, None)))
        });
    }

    if let Ok(map) = fs::read_to_string("samples/firmware/firmware.map") {
        let sections = vec![".flash".to_string(), ".data".to_string()];
        group.throughput(Throughput::Bytes(map.len() as u64));
        group.bench_function("map_tree", |b| {
            b.iter(|| black_box(map_tree_report(&map, &sections)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_classification, bench_inputs);
criterion_main!(benches);
