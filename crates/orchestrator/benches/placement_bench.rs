use criterion::{Criterion, criterion_group, criterion_main};
use domain::{CustomerId, Money, OrderLine, PaymentMethodToken};
use order_store::InMemoryOrderStore;
use orchestrator::{InMemoryNotifier, InMemoryPaymentProcessor, OrderOrchestrator};
use stock_ledger::InMemoryStockLedger;

fn lines(count: usize) -> Vec<OrderLine> {
    (0..count)
        .map(|i| {
            OrderLine::new(
                format!("SKU-{i:03}"),
                "Bench item",
                1,
                Money::from_cents(999),
            )
            .unwrap()
        })
        .collect()
}

fn bench_place_order(c: &mut Criterion, name: &str, line_count: usize) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let orchestrator = OrderOrchestrator::new(
        InMemoryStockLedger::new(),
        InMemoryPaymentProcessor::new(),
        InMemoryOrderStore::new(),
        InMemoryNotifier::new(),
    );
    rt.block_on(async {
        for i in 0..line_count {
            orchestrator
                .ledger()
                .set_stock(format!("SKU-{i:03}"), u32::MAX)
                .await;
        }
    });
    let token = PaymentMethodToken::new("tok_bench");

    c.bench_function(name, |b| {
        b.to_async(&rt).iter(|| async {
            orchestrator
                .place_order(CustomerId::new(), &token, lines(line_count))
                .await
                .unwrap();
        });
    });
}

fn bench_single_line(c: &mut Criterion) {
    bench_place_order(c, "placement/single_line", 1);
}

fn bench_ten_lines(c: &mut Criterion) {
    bench_place_order(c, "placement/ten_lines", 10);
}

criterion_group!(benches, bench_single_line, bench_ten_lines);
criterion_main!(benches);
