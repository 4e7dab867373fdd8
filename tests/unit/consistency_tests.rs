//! Inventory and order consistency under concurrent PlaceOrder calls.

#[cfg(test)]
mod tests {
    use orderdesk::ledger::{CustomerId, ItemId, LedgerError, MemoryStore, NewItem};
    use orderdesk::service::{OrderService, ServiceConfig, ServiceError};
    use orderdesk::sync::BoundedTaskPool;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn setup(
        quantity: u32,
        customer_count: usize,
    ) -> (Arc<OrderService<MemoryStore>>, ItemId, Vec<CustomerId>) {
        let store = MemoryStore::new();
        let customers = (0..customer_count)
            .map(|i| store.register_customer(&format!("Customer {i}"), "7 Elm St", "555-0107"))
            .collect();
        let service = OrderService::new(store, ServiceConfig::default());
        let item = service
            .add_item(NewItem::new("Giant Steps", "John Coltrane", Decimal::new(2250, 2), quantity))
            .unwrap();
        (Arc::new(service), item, customers)
    }

    #[test]
    fn test_inventory_never_negative_under_contention() {
        let (service, item, customers) = setup(37, 6);
        let pool = BoundedTaskPool::new(8, 16).unwrap();

        for i in 0..120usize {
            let service = Arc::clone(&service);
            let customer = customers[i % customers.len()];
            let quantity = 1 + (i % 4) as u32;
            pool.submit(move || {
                let before = service.item(item).unwrap().quantity;
                let result = service.place_order(item, quantity, customer);
                let after = service.item(item).unwrap().quantity;
                assert!(after <= 37 && before <= 37);
                result.map(|_| quantity)
            })
            .unwrap();
        }
        let results = pool.drain().unwrap();

        let sold: u32 = results.iter().filter_map(|r| r.as_ref().ok()).sum();
        let remaining = service.item(item).unwrap().quantity;
        assert_eq!(sold + remaining, 37);
        assert!(remaining < 4);
        assert!(results.iter().all(|r| match r {
            Ok(_) => true,
            Err(ServiceError::Ledger(LedgerError::InsufficientInventory { .. })) => true,
            Err(_) => false,
        }));
    }

    #[test]
    fn test_success_visible_failure_invisible() {
        let (service, item, customers) = setup(4, 2);
        let (a, b) = (customers[0], customers[1]);

        let order = service.place_order(item, 3, a).unwrap();
        assert!(service.place_order(item, 3, b).is_err());

        assert_eq!(service.check_availability(item, 1), Ok(true));
        assert_eq!(service.check_availability(item, 2), Ok(false));
        assert_eq!(service.get_order_history(a).unwrap()[0].id, order);
        assert!(service.get_order_history(b).unwrap().is_empty());

        let orders = service.ledger().store().all_orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].quantity, 3);
    }

    #[test]
    fn test_failed_commit_keeps_both_writes_out() {
        let (service, item, customers) = setup(10, 1);
        service.ledger().store().fail_next_commit();

        assert!(service.place_order(item, 2, customers[0]).is_err());
        assert_eq!(service.item(item).unwrap().quantity, 10);
        assert!(service.ledger().store().all_orders().is_empty());

        service.place_order(item, 2, customers[0]).unwrap();
        assert_eq!(service.item(item).unwrap().quantity, 8);
        assert_eq!(service.ledger().store().all_orders().len(), 1);
    }

    #[test]
    fn test_order_ids_unique_and_increasing() {
        let (service, item, customers) = setup(1_000, 4);
        let pool = BoundedTaskPool::new(4, 8).unwrap();
        for i in 0..200usize {
            let service = Arc::clone(&service);
            let customer = customers[i % 4];
            pool.submit(move || service.place_order(item, 1, customer).unwrap())
                .unwrap();
        }
        let mut ids = pool.drain().unwrap();
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 200);
        assert_eq!(service.item(item).unwrap().quantity, 800);
    }
}
