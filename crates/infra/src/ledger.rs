//! Ledger writer: the only code path that changes a product's balance.
//!
//! Each call locks the product row, re-reads the balance, applies the movement
//! rule, writes the new balance back and appends the movement carrying the
//! resulting balance as `new_stock`. The balance write and the ledger append
//! become visible together when the enclosing transaction commits.

use chrono::Utc;

use stockflow_inventory::{
    InventoryError, InventoryResult, MovementRequest, StockMovement, StockMovementId,
};

use crate::store::Transaction;

pub fn record_movement(
    tx: &mut Transaction<'_>,
    request: MovementRequest,
) -> InventoryResult<StockMovement> {
    request.validate()?;

    let tenant_id = request.tenant_id;
    let product_id = request.product_id;
    let balance = tx.lock_product(tenant_id, product_id)?;

    let recorded = StockMovement::record(StockMovementId::generate(), request, balance, Utc::now());
    let movement = match recorded {
        Ok(movement) => movement,
        Err(
            err @ (InventoryError::InsufficientStock { .. }
            | InventoryError::BalanceOverflow { .. }),
        ) => {
            tracing::warn!(
                tenant_id = %tenant_id,
                product_id = %product_id,
                error = %err,
                "stock movement rejected"
            );
            return Err(err);
        }
        Err(err) => return Err(err),
    };

    tx.write_balance(tenant_id, product_id, movement.new_stock())?;
    tracing::debug!(
        tx = ?tx.id(),
        tenant_id = %tenant_id,
        product_id = %product_id,
        direction = %movement.direction(),
        quantity = %movement.quantity(),
        new_stock = %movement.new_stock(),
        source = %movement.source(),
        "stock movement recorded"
    );
    tx.append_movement(movement.clone());

    Ok(movement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use stockflow_core::{TenantId, UserId};
    use rust_decimal::Decimal;
    use stockflow_inventory::{
        MAX_QUANTITY, MovementDirection, ProductId, Quantity, SourceDocument,
        StockAdjustmentItemId,
    };

    use crate::store::InventoryStore;

    fn setup() -> (InventoryStore, TenantId, ProductId) {
        let store = InventoryStore::default();
        let tenant = TenantId::new();
        let product = ProductId::generate();
        store
            .register_product(tenant, product, "Widget", Quantity::units(10))
            .unwrap();
        (store, tenant, product)
    }

    fn request(
        tenant: TenantId,
        product: ProductId,
        direction: MovementDirection,
        quantity: Quantity,
    ) -> MovementRequest {
        MovementRequest {
            tenant_id: tenant,
            product_id: product,
            direction,
            quantity,
            source: SourceDocument::StockAdjustmentItem(StockAdjustmentItemId::generate()),
            user_id: UserId::new(),
            unit_price: None,
            notes: Some("cycle count".to_string()),
        }
    }

    #[test]
    fn movements_chain_their_snapshots_within_a_transaction() {
        let (store, tenant, product) = setup();
        let mut tx = store.begin();

        let first = record_movement(
            &mut tx,
            request(tenant, product, MovementDirection::In, Quantity::units(3)),
        )
        .unwrap();
        let second = record_movement(
            &mut tx,
            request(tenant, product, MovementDirection::Out, Quantity::units(5)),
        )
        .unwrap();
        tx.commit().unwrap();

        assert_eq!(first.new_stock(), dec!(13));
        assert_eq!(second.new_stock(), dec!(8));
        assert_eq!(second.previous_stock(), first.new_stock());
        assert_eq!(store.balance(tenant, product).unwrap(), dec!(8));
        let committed: Vec<_> = store
            .movements_for_product(tenant, product)
            .unwrap()
            .iter()
            .map(|m| m.id())
            .collect();
        assert_eq!(committed, vec![first.id(), second.id()]);
    }

    #[test]
    fn zero_quantity_fails_before_touching_the_row() {
        let (store, tenant, product) = setup();
        let mut tx = store.begin();
        let err = record_movement(
            &mut tx,
            request(tenant, product, MovementDirection::In, Quantity::units(0)),
        )
        .unwrap_err();

        assert!(matches!(err, InventoryError::InvalidQuantity(_)));
        assert!(tx.pending_movements().is_empty());
        drop(tx);
        assert_eq!(store.balance(tenant, product).unwrap(), dec!(10));
    }

    #[test]
    fn insufficient_stock_leaves_no_pending_write() {
        let (store, tenant, product) = setup();
        let mut tx = store.begin();
        let err = record_movement(
            &mut tx,
            request(tenant, product, MovementDirection::Out, Quantity::units(11)),
        )
        .unwrap_err();

        assert!(matches!(err, InventoryError::InsufficientStock { .. }));
        assert!(tx.pending_movements().is_empty());
        tx.commit().unwrap();
        assert_eq!(store.balance(tenant, product).unwrap(), dec!(10));
    }

    #[test]
    fn out_of_range_quantity_is_rejected_at_construction() {
        assert!(matches!(
            Quantity::new(Decimal::MAX),
            Err(InventoryError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn in_movement_past_the_largest_balance_is_an_error_not_a_panic() {
        let (store, tenant, product) = setup();
        let mut tx = store.begin();
        let err = record_movement(
            &mut tx,
            request(tenant, product, MovementDirection::In, Quantity::new(MAX_QUANTITY).unwrap()),
        )
        .unwrap_err();

        assert_eq!(
            err,
            InventoryError::BalanceOverflow {
                product,
                available: dec!(10),
                requested: MAX_QUANTITY,
            }
        );
        assert!(tx.pending_movements().is_empty());
        drop(tx);
        assert_eq!(store.balance(tenant, product).unwrap(), dec!(10));
    }
}
