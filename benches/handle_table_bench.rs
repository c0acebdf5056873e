use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use hostbridge::{Bridge, ExternalCall, FreedObject, Handle, HandleTable, HostValue, NativeRuntime};

struct EchoNative;

impl NativeRuntime for EchoNative {
    fn invoke_external_handler(&self, bridge: &mut Bridge, call: &ExternalCall<'_>) -> Handle {
        match call.arg(0) {
            Some(arg) => bridge.acquire(arg).unwrap(),
            None => bridge.create_undefined().unwrap(),
        }
    }

    fn notify_native_object_freed(&self, freed: &FreedObject) {
        black_box(freed);
    }
}

fn bench_ref_release_objects(c: &mut Criterion) {
    let mut group = c.benchmark_group("handles/ref_release_objects");

    for &size in &[100, 1_000, 10_000] {
        let values: Vec<HostValue> = (0..size).map(|_| HostValue::new_object()).collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &values, |b, values| {
            b.iter(|| {
                let mut table = HandleTable::new();
                let handles: Vec<Handle> = values
                    .iter()
                    .map(|value| table.ref_value(value).unwrap())
                    .collect();
                for handle in handles {
                    table.release(handle).unwrap();
                }
                black_box(table.live_count());
            });
        });
    }

    group.finish();
}

fn bench_primitive_dedup(c: &mut Criterion) {
    let mut group = c.benchmark_group("handles/primitive_dedup");

    for &size in &[100, 1_000, 10_000] {
        let mut table = HandleTable::new();
        for i in 0..size {
            table.ref_value(&HostValue::Number(i as f64)).unwrap();
        }

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &n| {
            b.iter(|| {
                for i in 0..n {
                    black_box(table.find(&HostValue::Number(i as f64)));
                }
            });
        });
    }

    group.finish();
}

fn bench_external_call(c: &mut Criterion) {
    let mut group = c.benchmark_group("trampoline/external_call");

    for &argc in &[0usize, 3, 16] {
        let mut bridge = Bridge::new(Rc::new(EchoNative));
        let function = bridge.create_external_function(0x1).unwrap();
        let function = bridge.resolve(function).unwrap().clone();
        let args: Vec<HostValue> = (0..argc).map(|i| HostValue::Number(i as f64)).collect();
        let this = HostValue::new_object();

        group.bench_with_input(BenchmarkId::from_parameter(argc), &args, |b, args| {
            b.iter(|| {
                black_box(bridge.call(&function, &this, args).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_ref_release_objects,
    bench_primitive_dedup,
    bench_external_call
);
criterion_main!(benches);
