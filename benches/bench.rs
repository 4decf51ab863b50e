use criterion::{black_box, criterion_group, criterion_main, Criterion};

use oopta::{
    analysis::{
        constprop,
        pointer::{self, Options, Selector},
    },
    ir::{CallKind, Type},
    Order, Program, ProgramBuilder, ProgramDef,
};

// ------------------------------------------------------------------
// Helpers

/// `n` subclasses of `Base`, each overriding `Base next(Base)` to allocate
/// and return the next one. `main` passes one of each to `link` on a fresh
/// `Holder`, so every selector has receivers and call sites to split.
fn chain(n: usize) -> Program {
    let mut b = ProgramBuilder::new();
    let base = b.class("Base");
    b.set_abstract(base);
    let holder = b.class("Holder");
    let slot = b.field(holder, "slot", Type::Class(base));
    let total = b.static_field(holder, "total", Type::Int);

    let next = b.abstract_method(base, "Base next(Base)", Type::Class(base));
    b.param(next, "prev", Type::Class(base));
    let classes: Vec<_> = (0..n).map(|i| b.subclass(&format!("K{i}"), base)).collect();
    for (i, class) in classes.iter().enumerate() {
        let m = b.method(*class, "Base next(Base)", Type::Class(base));
        let prev = b.param(m, "prev", Type::Class(base));
        let out = b.var(m, "out", Type::Class(base));
        let succ = classes[(i + 1) % n];
        b.alloc(m, out, Type::Class(succ));
        b.copy(m, out, prev);
        b.ret(m, Some(out));
    }

    // Holder.link(Base) stores into and reads back from its slot
    let link = b.method(holder, "Base link(Base)", Type::Class(base));
    let this = b.this(link).unwrap();
    let arg = b.param(link, "arg", Type::Class(base));
    let got = b.var(link, "got", Type::Class(base));
    let res = b.var(link, "res", Type::Class(base));
    b.store_field(link, Some(this), slot, arg);
    b.load_field(link, got, Some(this), slot);
    b.call(link, CallKind::Virtual, Some(res), Some(got), next, vec![arg]);
    b.ret(link, Some(res));

    let main = b.static_method(holder, "void main()", Type::Void);
    let one = b.var(main, "one", Type::Int);
    let sum = b.var(main, "sum", Type::Int);
    b.literal(main, one, 1);
    b.literal(main, sum, 0);
    for (i, class) in classes.iter().enumerate() {
        let h = b.var(main, &format!("h{i}"), Type::Class(holder));
        let k = b.var(main, &format!("k{i}"), Type::Class(base));
        let r = b.var(main, &format!("r{i}"), Type::Class(base));
        b.alloc(main, h, Type::Class(holder));
        b.alloc(main, k, Type::Class(*class));
        b.call(main, CallKind::Virtual, Some(r), Some(h), link, vec![k]);
        b.binary(main, sum, oopta::ir::BinaryOp::Add, sum, one);
    }
    b.store_field(main, None, total, sum);
    b.ret(main, None);
    b.build(main).unwrap()
}

fn shapes() -> Program {
    let json = std::fs::read_to_string("tests/pointer/shapes.json")
        .unwrap_or_else(|e| panic!("couldn't read tests/pointer/shapes.json: {e}"));
    let def: ProgramDef =
        serde_json::from_str(&json).unwrap_or_else(|e| panic!("bad program JSON: {e}"));
    Program::new(def).unwrap_or_else(|e| panic!("{e}"))
}

fn opts(selector: Selector, k: usize) -> Options {
    Options {
        selector,
        k,
        order: Order::Fifo,
        ..Options::default()
    }
}

// ------------------------------------------------------------------

pub fn shapes_ci(c: &mut Criterion) {
    let p = shapes();
    let o = opts(Selector::Insensitive, 0);
    c.bench_function("pointer::analysis(shapes-ci)", |b| {
        b.iter(|| pointer::analysis(black_box(&p), &o))
    });
}

pub fn chain_ci(c: &mut Criterion) {
    let p = chain(64);
    let o = opts(Selector::Insensitive, 0);
    c.bench_function("pointer::analysis(chain-ci)", |b| {
        b.iter(|| pointer::analysis(black_box(&p), &o))
    });
}

pub fn chain_1call(c: &mut Criterion) {
    let p = chain(64);
    let o = opts(Selector::CallSite, 1);
    c.bench_function("pointer::analysis(chain-1call)", |b| {
        b.iter(|| pointer::analysis(black_box(&p), &o))
    });
}

pub fn chain_2obj(c: &mut Criterion) {
    let p = chain(64);
    let o = opts(Selector::Object, 2);
    c.bench_function("pointer::analysis(chain-2obj)", |b| {
        b.iter(|| pointer::analysis(black_box(&p), &o))
    });
}

pub fn chain_2type(c: &mut Criterion) {
    let p = chain(64);
    let o = opts(Selector::Type, 2);
    c.bench_function("pointer::analysis(chain-2type)", |b| {
        b.iter(|| pointer::analysis(black_box(&p), &o))
    });
}

pub fn chain_constprop(c: &mut Criterion) {
    let p = chain(64);
    let pta = pointer::analysis(&p, &opts(Selector::Insensitive, 0));
    c.bench_function("constprop::inter_constant_propagation(chain)", |b| {
        b.iter(|| constprop::inter_constant_propagation(black_box(&p), &pta))
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = shapes_ci, chain_ci, chain_1call, chain_2obj, chain_2type, chain_constprop
}
criterion_main!(benches);
