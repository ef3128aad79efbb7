use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::domain::{Customer, CustomerId, Order, OrderId};
use super::repository::{CustomerDirectory, OrderRepository, RepositoryError};

/// Process-local order store backing the API service and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryOrderRepository {
    records: Arc<Mutex<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderRepository {
    pub fn len(&self) -> usize {
        self.records.lock().expect("order store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn insert(&self, order: Order) -> Result<Order, RepositoryError> {
        let mut guard = self.records.lock().expect("order store poisoned");
        if guard.contains_key(&order.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    fn update(&self, order: Order) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("order store poisoned");
        match guard.get_mut(&order.id) {
            Some(slot) => {
                *slot = order;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let guard = self.records.lock().expect("order store poisoned");
        Ok(guard.get(id).cloned())
    }

    fn all(&self) -> Result<Vec<Order>, RepositoryError> {
        let guard = self.records.lock().expect("order store poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryCustomerDirectory {
    customers: Arc<Mutex<HashMap<CustomerId, Customer>>>,
}

impl CustomerDirectory for InMemoryCustomerDirectory {
    fn insert(&self, customer: Customer) -> Result<Customer, RepositoryError> {
        let mut guard = self.customers.lock().expect("customer store poisoned");
        let duplicate_national_id = customer.national_id.as_ref().map_or(false, |id| {
            guard
                .values()
                .any(|existing| existing.national_id.as_ref() == Some(id))
        });
        if guard.contains_key(&customer.id) || duplicate_national_id {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(customer.id.clone(), customer.clone());
        Ok(customer)
    }

    fn fetch(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let guard = self.customers.lock().expect("customer store poisoned");
        Ok(guard.get(id).cloned())
    }

    fn search(&self, term: &str, limit: usize) -> Result<Vec<Customer>, RepositoryError> {
        let guard = self.customers.lock().expect("customer store poisoned");
        let mut matches: Vec<Customer> = guard
            .values()
            .filter(|customer| customer.matches(term))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        matches.truncate(limit);
        Ok(matches)
    }
}
