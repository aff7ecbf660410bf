// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for catalog construction, name resolution, and the
// full read-modify-commit cycle against the simulated spooler.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use spoolmedia_bridge::catalog::media_type_names;
use spoolmedia_bridge::{PrintBridge, SimPrinter, SimulatedSpooler};
use spoolmedia_core::BridgeConfig;

/// A printer with `count` media types named `Media 0` .. `Media n`.
fn printer_with_media(count: u32) -> SimPrinter {
    (0..count).fold(SimPrinter::new("Bench").global_media(1), |printer, i| {
        printer.media(&format!("Media {i}"), 256 + i)
    })
}

fn bench_catalog(c: &mut Criterion) {
    let sim = SimulatedSpooler::new().with_printer(printer_with_media(8));
    c.bench_function("media_type_names (8 entries)", |b| {
        b.iter(|| media_type_names(&sim, black_box("Bench"), ""))
    });

    let sim = SimulatedSpooler::new().with_printer(printer_with_media(128));
    c.bench_function("media_type_names (128 entries)", |b| {
        b.iter(|| media_type_names(&sim, black_box("Bench"), ""))
    });

    let catalog = media_type_names(&sim, "Bench", "").unwrap();
    c.bench_function("code_for (last of 128)", |b| {
        b.iter(|| catalog.code_for(black_box("Media 127")))
    });
}

fn bench_set_media_type(c: &mut Criterion) {
    let sim = SimulatedSpooler::new().with_printer(printer_with_media(16));
    let bridge = PrintBridge::new(&sim, BridgeConfig::default());

    c.bench_function("set_media_type (by code)", |b| {
        b.iter(|| bridge.set_media_type(black_box("Bench"), 260u32))
    });
    c.bench_function("set_media_type (by name)", |b| {
        b.iter(|| bridge.set_media_type(black_box("Bench"), "Media 4"))
    });
    c.bench_function("get_media_type", |b| {
        b.iter(|| bridge.get_media_type(black_box("Bench")))
    });
}

criterion_group!(benches, bench_catalog, bench_set_media_type);
criterion_main!(benches);
