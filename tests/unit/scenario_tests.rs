//! End-to-end scenarios through the public API.

#[cfg(test)]
mod tests {
    use orderdesk::ledger::{Customer, CustomerId, LedgerError, MemoryStore, NewItem};
    use orderdesk::service::{OrderService, ServiceConfig, ServiceError};
    use rust_decimal::Decimal;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_two_racing_orders_for_five_units() {
        let store = MemoryStore::new();
        let a = store.register_customer("A", "1 First St", "555-0001");
        let b = store.register_customer("B", "2 Second St", "555-0002");
        let service = Arc::new(OrderService::new(store, ServiceConfig::default()));
        let item = service
            .add_item(NewItem::new("Item 1", "Label", Decimal::new(1000, 2), 5))
            .unwrap();
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [a, b]
            .into_iter()
            .map(|customer| {
                let service = Arc::clone(&service);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    service.place_order(item, 3, customer)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let wins = results.iter().filter(|r| r.is_ok()).count();
        let losses = results
            .iter()
            .filter(|r| {
                matches!(
                    r,
                    Err(ServiceError::Ledger(LedgerError::InsufficientInventory { .. }))
                )
            })
            .count();
        assert_eq!((wins, losses), (1, 1));
        assert_eq!(service.item(item).unwrap().quantity, 2);
        assert_eq!(service.ledger().store().all_orders().len(), 1);
    }

    #[test]
    fn test_empty_history_then_patch() {
        let store = MemoryStore::new();
        store.insert_customer(Customer {
            id: CustomerId(42),
            full_name: "Forty Two".to_string(),
            address: "42 Answer Rd".to_string(),
            phone: "555-0042".to_string(),
        });
        let service = OrderService::new(store, ServiceConfig::default());
        let item = service
            .add_item(NewItem::new("Item", "Label", Decimal::new(500, 2), 10))
            .unwrap();

        assert_eq!(service.get_order_history(CustomerId(42)), Ok(Vec::new()));
        let key = "orders:customer:42:last10";
        let empty: Vec<serde_json::Value> =
            serde_json::from_slice(&service.cache().get(key).unwrap()).unwrap();
        assert!(empty.is_empty());

        let order = service.place_order(item, 1, CustomerId(42)).unwrap();
        let patched: Vec<serde_json::Value> =
            serde_json::from_slice(&service.cache().get(key).unwrap()).unwrap();

        assert_eq!(patched.len(), 1);
        assert_eq!(patched[0]["id"], order.0);
        assert_eq!(service.ledger().store().history_reads(), 1);
    }

    #[test]
    fn test_catalog_flow() {
        let store = MemoryStore::new();
        let customer = store.register_customer("Dexter", "10 Cedar St", "555-0110");
        let service = OrderService::new(store, ServiceConfig::default());
        let first = service
            .add_item(NewItem::new("Go", "Dexter Gordon", Decimal::new(2100, 2), 2))
            .unwrap();
        service
            .add_item(NewItem::new("Our Man in Paris", "Dexter Gordon", Decimal::new(2300, 2), 2))
            .unwrap();

        assert_eq!(service.catalog_by_label("Dexter Gordon").unwrap().len(), 2);
        service.place_order(first, 2, customer).unwrap();
        assert_eq!(service.check_availability(first, 1), Ok(false));

        let catalog = service.catalog().unwrap();
        assert_eq!(catalog[0].quantity, 0);
        assert_eq!(catalog[1].quantity, 2);
        assert_eq!(catalog[0].price, Decimal::new(2100, 2));
    }
}
