use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use parceldesk::{
    core::store::MemoryBackend,
    persist::Backend,
    records::{PackageDraft, PackagePatch, PackageQuery, ResidentDraft},
    types::{PackageStatus, ResidentId},
    view::filter::{available_packages, recent_check_outs},
};

const RESIDENTS: u64 = 200;

fn seeded() -> (MemoryBackend, u64) {
    let mut backend = MemoryBackend::new();
    for i in 0..RESIDENTS {
        backend
            .insert_resident(ResidentDraft {
                name: format!("Resident {i}"),
                house_number: format!("H-{i}"),
                ..ResidentDraft::default()
            })
            .expect("resident");
    }
    let shelf = backend
        .insert_storage_location("Shelf-1".to_string())
        .expect("shelf")
        .id;
    (backend, shelf)
}

fn draft(i: u64, location: u64) -> PackageDraft {
    PackageDraft {
        package_id: format!("PKG-{i}"),
        description: None,
        color: None,
        size: None,
        notes: None,
        resident_id: i % RESIDENTS + 1,
        storage_location_id: location,
        checked_in_by: "Staff".to_string(),
    }
}

fn filled(n: u64) -> MemoryBackend {
    let (mut backend, shelf) = seeded();
    for i in 0..n {
        let pkg = backend.insert_package(draft(i, shelf)).expect("insert");
        if i % 3 == 0 {
            backend
                .update_package(pkg.id, PackagePatch::check_out(i, "Staff"), Some(PackageStatus::CheckedIn))
                .expect("check out");
        }
    }
    backend
}

fn bench_check_ins(c: &mut Criterion) {
    c.bench_function("check_in_20k", |b| {
        b.iter(|| {
            let (mut backend, shelf) = seeded();
            for i in 0..20_000u64 {
                let _ = backend.insert_package(draft(i, shelf)).expect("insert");
            }
        });
    });
}

fn bench_resident_select(c: &mut Criterion) {
    let backend = filled(20_000);
    c.bench_function("select_resident_checked_in", |b| {
        b.iter(|| {
            let _ = backend
                .packages(&PackageQuery {
                    status: Some(PackageStatus::CheckedIn),
                    resident_id: Some(42),
                    limit: None,
                })
                .expect("select");
        });
    });
}

fn bench_snapshot_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_filters");
    for n in [1_000u64, 10_000, 50_000] {
        let rows = filled(n).packages(&PackageQuery::default()).expect("select");
        let resident: ResidentId = 7;
        group.bench_with_input(BenchmarkId::new("available", n), &rows, |b, rows| {
            b.iter(|| available_packages(resident, rows));
        });
        group.bench_with_input(BenchmarkId::new("recent_check_outs", n), &rows, |b, rows| {
            b.iter(|| recent_check_outs(rows, 5));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_check_ins, bench_resident_select, bench_snapshot_filters);
criterion_main!(benches);
