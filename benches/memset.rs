use core::ffi::c_void;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::time::Duration;

unsafe extern "C" {
    #[link_name = "memset"]
    fn libc_memset(dest: *mut c_void, c: i32, n: usize) -> *mut c_void;
}

fn configure_group_for_len(
    group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>,
    len: usize,
) {
    if len >= 1 << 20 {
        group.sample_size(20);
        group.warm_up_time(Duration::from_millis(300));
        group.measurement_time(Duration::from_millis(900));
    } else {
        group.sample_size(40);
        group.warm_up_time(Duration::from_millis(200));
        group.measurement_time(Duration::from_millis(500));
    }
}

fn memset_benches(c: &mut Criterion) {
    let thresholds = &tunedmem::dispatch::runtime().thresholds;
    let mut sizes = vec![1usize, 8, 15, 16, 32, 63, 64, 65, 128, 255, 256, 257, 512, 1024, 4096, 65536];
    for cut in [thresholds.repstore_start, thresholds.nt_store_start] {
        if cut < 64 << 20 {
            sizes.extend([cut.saturating_sub(1), cut, cut + 1]);
        }
    }
    sizes.push(64 << 20);
    sizes.sort_unstable();
    sizes.dedup();

    let mut group = c.benchmark_group("memset");
    for len in sizes {
        for off in [0usize, 3] {
            let label = format!("size_{len}_off{off}");
            let mut buf = vec![0u8; len + 64];
            let dst = unsafe { buf.as_mut_ptr().add(off) };

            configure_group_for_len(&mut group, len);
            group.throughput(Throughput::Bytes(len as u64));

            group.bench_with_input(BenchmarkId::new("libc", &label), &len, |b, &n| {
                b.iter(|| unsafe {
                    libc_memset(black_box(dst.cast()), black_box(0x5A), black_box(n));
                    black_box(core::ptr::read_volatile(dst));
                });
            });
            group.bench_with_input(BenchmarkId::new("tunedmem", &label), &len, |b, &n| {
                b.iter(|| unsafe {
                    tunedmem::memset(black_box(dst), black_box(0x5A), black_box(n));
                    black_box(core::ptr::read_volatile(dst));
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, memset_benches);
criterion_main!(benches);
