#![allow(dead_code)]

use criterion::{criterion_group, criterion_main, Criterion};
use graft::{Container, ContainerBuilder, Import, Inject, Key, Lifecycle};
use std::sync::Arc;

struct A(Arc<B>, Arc<C>);
struct B(i32);
struct C(Arc<CA>);
struct CA(Arc<CAA>);
struct CAA(Arc<CAAA>);
struct CAAA(Arc<CAAAA>);
struct CAAAA(Arc<CAAAAA>);
struct CAAAAA;

#[inline]
fn builder_with_chain(lifecycle: Lifecycle) -> ContainerBuilder {
    let mut builder = ContainerBuilder::new();
    builder.provide(lifecycle, || Ok(CAAAAA)).unwrap();
    builder.provide(lifecycle, |Inject(caaaaa): Inject<CAAAAA>| Ok(CAAAA(caaaaa))).unwrap();
    builder.provide(lifecycle, |Inject(caaaa): Inject<CAAAA>| Ok(CAAA(caaaa))).unwrap();
    builder.provide(lifecycle, |Inject(caaa): Inject<CAAA>| Ok(CAA(caaa))).unwrap();
    builder.provide(lifecycle, |Inject(caa): Inject<CAA>| Ok(CA(caa))).unwrap();
    builder.provide(lifecycle, |Inject(ca): Inject<CA>| Ok(C(ca))).unwrap();
    builder.provide(lifecycle, || Ok(B(2))).unwrap();
    builder
        .provide(lifecycle, |Inject(b): Inject<B>, Inject(c): Inject<C>| Ok(A(b, c)))
        .unwrap();
    builder
}

/// `depth` aliases, each pointing at the previous one.
#[inline]
fn builder_with_deep_chain(depth: usize) -> ContainerBuilder {
    let mut builder = ContainerBuilder::new();
    builder.instance(B(1)).unwrap();
    let mut previous = Key::of::<B>();
    for index in 0..depth {
        let key = Key::named::<B>(index.to_string());
        builder.alias(key.clone(), previous).unwrap();
        previous = key;
    }
    builder
}

#[inline]
fn container_get(container: &Container) {
    let _ = container.get::<A>().unwrap();
}

#[inline]
fn container_import(source: &Container) {
    let mut builder = ContainerBuilder::new();
    builder.import(Import::container(source)).unwrap();
    let _ = builder.build().unwrap();
}

fn criterion_benchmark(c: &mut Criterion) {
    let container_prototype = builder_with_chain(Lifecycle::Prototype).build().unwrap();
    let container_lazy = builder_with_chain(Lifecycle::LazySingleton).build().unwrap();
    let container_deep = builder_with_deep_chain(1_000).build().unwrap();
    let deep_key = Key::named::<B>("999");

    c.bench_function("container_build", |b| {
        b.iter(|| builder_with_chain(Lifecycle::Prototype).build().unwrap())
    })
    .bench_function("container_build_eager", |b| {
        b.iter(|| builder_with_chain(Lifecycle::EagerSingleton).build().unwrap())
    })
    .bench_function("container_build_deep_chain", |b| {
        b.iter(|| builder_with_deep_chain(1_000).build().unwrap())
    })
    .bench_function("container_get", |b| b.iter(|| container_get(&container_prototype)))
    .bench_function("container_get_singleton", |b| b.iter(|| container_get(&container_lazy)))
    .bench_function("container_resolve_deep_chain", |b| {
        b.iter(|| container_deep.resolve(&deep_key).unwrap())
    })
    .bench_function("container_import", |b| b.iter(|| container_import(&container_lazy)));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
