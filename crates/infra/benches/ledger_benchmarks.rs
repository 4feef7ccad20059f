use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;

use stockflow_core::{TenantId, UserId};
use stockflow_infra::workflows::CreateStockEntry;
use stockflow_infra::{InventoryService, InventoryStore};
use stockflow_inventory::{
    DocumentStatus, MovementDirection, MovementRequest, NewStockEntryItem, ProductId, Quantity,
    SourceDocument, StockEntryItemId, UnitPrice,
};

fn setup(products: usize) -> (InventoryService, TenantId, Vec<ProductId>) {
    let service = InventoryService::new(Arc::new(InventoryStore::default()));
    let tenant_id = TenantId::new();
    let product_ids: Vec<ProductId> = (0..products)
        .map(|i| {
            let product_id = ProductId::generate();
            service
                .store()
                .register_product(
                    tenant_id,
                    product_id,
                    format!("Product {i}"),
                    Quantity::units(0),
                )
                .unwrap();
            product_id
        })
        .collect();
    (service, tenant_id, product_ids)
}

/// One thousandth of a unit, so long runs stay far below the balance ceiling.
fn smallest_quantity() -> Quantity {
    Quantity::new(Decimal::new(1, 3)).unwrap()
}

fn inbound(tenant_id: TenantId, product_id: ProductId, user_id: UserId) -> MovementRequest {
    MovementRequest {
        tenant_id,
        product_id,
        direction: MovementDirection::In,
        quantity: smallest_quantity(),
        source: SourceDocument::StockEntryItem(StockEntryItemId::generate()),
        user_id,
        unit_price: None,
        notes: None,
    }
}

fn bench_record_movement_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_movement_latency");
    group.sample_size(1000);

    group.bench_function("single_product", |b| {
        let (service, tenant_id, products) = setup(1);
        let user_id = UserId::new();
        b.iter(|| {
            black_box(
                service
                    .record_movement(inbound(tenant_id, products[0], user_id))
                    .unwrap(),
            );
        });
    });

    group.finish();
}

fn bench_stock_entry_completion(c: &mut Criterion) {
    let mut group = c.benchmark_group("stock_entry_completion");

    for item_count in [1usize, 10, 100] {
        group.throughput(Throughput::Elements(item_count as u64));
        group.bench_with_input(
            BenchmarkId::new("completed_on_create", item_count),
            &item_count,
            |b, &size| {
                let (service, tenant_id, products) = setup(size);
                let user_id = UserId::new();
                let unit_price = UnitPrice::new(Decimal::new(1250, 2)).unwrap();

                b.iter(|| {
                    let items = products
                        .iter()
                        .map(|product_id| NewStockEntryItem {
                            product_id: *product_id,
                            quantity: smallest_quantity(),
                            unit_price,
                            expiration_date: None,
                        })
                        .collect();
                    let cmd = CreateStockEntry {
                        status: DocumentStatus::Completed,
                        ..CreateStockEntry::draft(tenant_id, user_id, items)
                    };
                    black_box(service.create_stock_entry(cmd).unwrap());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_record_movement_latency,
    bench_stock_entry_completion
);
criterion_main!(benches);
