//! In-memory storage backend
//!
//! Default storage when the backend is built without PostgreSQL support.
//! Data is lost on restart.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::RwLock;
use tracing::info;

use workload_trust_core::{Order, OrderStatus};

use super::{OrderStore, StorageError};

/// In-memory order store implementation
#[derive(Debug, Default)]
pub struct MemoryStore {
    orders: RwLock<Vec<Order>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given orders
    pub fn with_orders(orders: Vec<Order>) -> Self {
        Self {
            orders: RwLock::new(orders),
        }
    }

    /// Create a store holding the three demo orders
    pub fn seeded() -> Self {
        let now = Utc::now();
        Self::with_orders(vec![
            Order::new(
                1,
                "Laptop order for engineering team",
                OrderStatus::Completed,
                now - Duration::days(2),
            ),
            Order::new(
                2,
                "Office supplies restock",
                OrderStatus::Processing,
                now - Duration::days(1),
            ),
            Order::new(3, "Conference room equipment", OrderStatus::Pending, now),
        ])
    }

    pub fn insert(&self, order: Order) {
        let mut orders = self.orders.write().unwrap_or_else(|e| e.into_inner());
        info!(id = order.id, status = %order.status, "Inserting order");
        orders.push(order);
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    fn endpoint(&self) -> &str {
        "memory"
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StorageError> {
        let orders = self.orders.read().unwrap_or_else(|e| e.into_inner());
        let mut listed = orders.clone();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
