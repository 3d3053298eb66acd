use core::ffi::c_char;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::time::Duration;

unsafe extern "C" {
    #[link_name = "strcmp"]
    fn libc_strcmp(s1: *const c_char, s2: *const c_char) -> i32;
    #[link_name = "strncmp"]
    fn libc_strncmp(s1: *const c_char, s2: *const c_char, n: usize) -> i32;
}

fn c_string(len: usize, pad: usize) -> Vec<u8> {
    let mut v = vec![b'#'; pad];
    v.extend((0..len).map(|i| b'a' + (i % 26) as u8));
    v.push(0);
    v
}

fn strcmp_benches(c: &mut Criterion) {
    let sizes = [8usize, 31, 64, 256, 1024, 4096, 65536];

    let mut group = c.benchmark_group("strcmp");
    group.sample_size(40);
    group.warm_up_time(Duration::from_millis(200));
    group.measurement_time(Duration::from_millis(500));

    for len in sizes {
        // Same and different misalignment between the operands.
        for (a_pad, b_pad) in [(0usize, 0usize), (3, 11)] {
            let label = format!("equal_size_{len}_a{a_pad}_b{b_pad}");
            let a = c_string(len, a_pad);
            let b = c_string(len, b_pad);
            let pa = unsafe { a.as_ptr().add(a_pad) };
            let pb = unsafe { b.as_ptr().add(b_pad) };

            group.throughput(Throughput::Bytes(len as u64));
            group.bench_with_input(BenchmarkId::new("libc", &label), &len, |bench, _| {
                bench.iter(|| unsafe { black_box(libc_strcmp(black_box(pa.cast()), black_box(pb.cast()))) });
            });
            group.bench_with_input(BenchmarkId::new("tunedmem", &label), &len, |bench, _| {
                bench.iter(|| unsafe { black_box(tunedmem::strcmp(black_box(pa), black_box(pb))) });
            });

            let n = len / 2;
            let label = format!("strncmp_half_size_{len}_a{a_pad}_b{b_pad}");
            group.bench_with_input(BenchmarkId::new("libc", &label), &n, |bench, &n| {
                bench.iter(|| unsafe { black_box(libc_strncmp(black_box(pa.cast()), black_box(pb.cast()), black_box(n))) });
            });
            group.bench_with_input(BenchmarkId::new("tunedmem", &label), &n, |bench, &n| {
                bench.iter(|| unsafe { black_box(tunedmem::strncmp(black_box(pa), black_box(pb), black_box(n))) });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, strcmp_benches);
criterion_main!(benches);
