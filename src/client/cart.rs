use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::domain::{CatalogItem, Menu, OrderingError, OrderingResult, resolve_price};

pub use crate::domain::order::MAX_QUANTITY;

/// Merge key of a cart line. The price point is the one actually resolved, so
/// "no selection" and "explicit default" land on the same line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    pub item_id: Uuid,
    pub price_point_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Catalog snapshot taken when the line was last added to.
    pub item: CatalogItem,
    pub quantity: i32,
    pub price_point_id: Option<Uuid>,
    pub unit_price: i64,
    pub label: Option<String>,
}

impl CartLine {
    pub fn key(&self) -> LineKey {
        LineKey {
            item_id: self.item.id,
            price_point_id: self.price_point_id,
        }
    }

    pub fn line_total(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }
}

/// What to do when an item from another restaurant is added to a non-empty cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RestaurantSwitchPolicy {
    #[default]
    Reject,
    ClearAndRebind,
}

/// Serializable cart state, published after every successful mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub restaurant_id: Option<Uuid>,
    pub lines: Vec<CartLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    pub key: LineKey,
    /// Quantity of the line after the addition.
    pub quantity: i32,
    /// The cart was emptied to switch restaurants.
    pub cart_cleared: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepriceReport {
    pub repriced: Vec<LineKey>,
    pub removed: Vec<LineKey>,
}

impl RepriceReport {
    pub fn is_unchanged(&self) -> bool {
        self.repriced.is_empty() && self.removed.is_empty()
    }
}

/// Client-held cart bound to a single restaurant.
///
/// Every operation validates fully before touching state, so a failed call
/// leaves the cart exactly as it was.
#[derive(Debug)]
pub struct CartStore {
    restaurant_id: Option<Uuid>,
    lines: Vec<CartLine>,
    policy: RestaurantSwitchPolicy,
    snapshots: watch::Sender<CartSnapshot>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    pub fn new() -> Self {
        Self::with_policy(RestaurantSwitchPolicy::default())
    }

    pub fn with_policy(policy: RestaurantSwitchPolicy) -> Self {
        let (snapshots, _) = watch::channel(CartSnapshot::default());
        Self {
            restaurant_id: None,
            lines: Vec::new(),
            policy,
            snapshots,
        }
    }

    /// Adopt a persisted snapshot after checking the cart invariants.
    pub fn restore(snapshot: CartSnapshot, policy: RestaurantSwitchPolicy) -> OrderingResult<Self> {
        validate_snapshot(&snapshot)?;
        let (snapshots, _) = watch::channel(snapshot.clone());
        Ok(Self {
            restaurant_id: snapshot.restaurant_id,
            lines: snapshot.lines,
            policy,
            snapshots,
        })
    }

    pub fn policy(&self) -> RestaurantSwitchPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: RestaurantSwitchPolicy) {
        self.policy = policy;
    }

    pub fn restaurant_id(&self) -> Option<Uuid> {
        self.restaurant_id
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, key: LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.key() == key)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|line| i64::from(line.quantity)).sum()
    }

    pub fn total(&self) -> i64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            restaurant_id: self.restaurant_id,
            lines: self.lines.clone(),
        }
    }

    /// Receiver that observes the snapshot after each mutation.
    pub fn watch(&self) -> watch::Receiver<CartSnapshot> {
        self.snapshots.subscribe()
    }

    /// Target `restaurant_id`. Returns `true` when existing lines were dropped
    /// because they belonged to another restaurant.
    pub fn bind_restaurant(&mut self, restaurant_id: Uuid) -> bool {
        if self.restaurant_id == Some(restaurant_id) {
            return false;
        }
        let cleared = !self.lines.is_empty();
        if cleared {
            tracing::debug!(
                from = ?self.restaurant_id,
                to = %restaurant_id,
                dropped = self.lines.len(),
                "cart cleared to switch restaurant"
            );
        }
        self.lines.clear();
        self.restaurant_id = Some(restaurant_id);
        self.publish();
        cleared
    }

    pub fn add_item(
        &mut self,
        item: &CatalogItem,
        quantity: i64,
        price_point_id: Option<Uuid>,
    ) -> OrderingResult<AddOutcome> {
        let quantity = validate_quantity(quantity)?;
        if !item.available {
            return Err(OrderingError::ItemUnavailable(format!(
                "{} is not available right now",
                item.name
            )));
        }
        let resolved = resolve_price(item, price_point_id)?;
        let key = LineKey {
            item_id: item.id,
            price_point_id: resolved.price_point_id,
        };

        let switching = match self.restaurant_id {
            Some(bound) if bound != item.restaurant_id && !self.lines.is_empty() => {
                if self.policy == RestaurantSwitchPolicy::Reject {
                    return Err(OrderingError::RestaurantMismatch(format!(
                        "cart holds items from restaurant {}, {} belongs to {}",
                        bound, item.name, item.restaurant_id
                    )));
                }
                true
            }
            _ => false,
        };

        let existing = if switching {
            0
        } else {
            self.line(key).map(|line| i64::from(line.quantity)).unwrap_or(0)
        };
        let merged = existing + quantity;
        if merged > MAX_QUANTITY {
            return Err(OrderingError::InvalidQuantity(format!(
                "line quantity {merged} exceeds maximum {MAX_QUANTITY}"
            )));
        }
        let merged = merged as i32;

        let cart_cleared = if switching {
            self.lines.clear();
            true
        } else {
            false
        };
        self.restaurant_id = Some(item.restaurant_id);

        match self.lines.iter_mut().find(|line| line.key() == key) {
            Some(line) => {
                line.item = item.clone();
                line.quantity = merged;
                line.unit_price = resolved.unit_price;
                line.label = resolved.label;
            }
            None => self.lines.push(CartLine {
                item: item.clone(),
                quantity: merged,
                price_point_id: resolved.price_point_id,
                unit_price: resolved.unit_price,
                label: resolved.label,
            }),
        }

        tracing::debug!(item_id = %item.id, quantity = merged, cart_cleared, "cart line added");
        self.publish();
        Ok(AddOutcome {
            key,
            quantity: merged,
            cart_cleared,
        })
    }

    /// Set a line's quantity; zero removes the line.
    pub fn update_quantity(&mut self, key: LineKey, quantity: i64) -> OrderingResult<()> {
        if quantity < 0 {
            return Err(OrderingError::InvalidQuantity(format!(
                "quantity must not be negative, got {quantity}"
            )));
        }
        if quantity == 0 {
            if !self.remove_line(key) {
                return Err(missing_line(key));
            }
            return Ok(());
        }
        let quantity = validate_quantity(quantity)?;
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.key() == key)
            .ok_or_else(|| missing_line(key))?;
        line.quantity = quantity as i32;
        tracing::debug!(item_id = %key.item_id, quantity, "cart line quantity updated");
        self.publish();
        Ok(())
    }

    pub fn remove_line(&mut self, key: LineKey) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.key() != key);
        let removed = self.lines.len() != before;
        if removed {
            tracing::debug!(item_id = %key.item_id, "cart line removed");
            self.publish();
        }
        removed
    }

    /// Empty the cart. The restaurant binding is kept.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.publish();
    }

    /// Reconcile lines with a freshly fetched menu of the bound restaurant.
    ///
    /// Lines whose item or price point disappeared, or whose item became
    /// unavailable, are removed; the rest take the menu's current price.
    pub fn reprice(&mut self, menu: &Menu) -> OrderingResult<RepriceReport> {
        if self.restaurant_id.is_some_and(|bound| bound != menu.restaurant_id) {
            return Err(OrderingError::RestaurantMismatch(format!(
                "menu belongs to restaurant {}",
                menu.restaurant_id
            )));
        }

        let mut report = RepriceReport::default();
        let mut next = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            let key = line.key();
            let fresh = match menu.find_item(line.item.id).filter(|item| item.available) {
                Some(item) => item,
                None => {
                    report.removed.push(key);
                    continue;
                }
            };
            let resolved = match resolve_price(fresh, line.price_point_id) {
                Ok(resolved) => resolved,
                Err(OrderingError::InvalidSelection(_)) => {
                    report.removed.push(key);
                    continue;
                }
                Err(err) => return Err(err),
            };
            if resolved.unit_price != line.unit_price || resolved.label != line.label {
                report.repriced.push(key);
            }
            next.push(CartLine {
                item: fresh.clone(),
                quantity: line.quantity,
                price_point_id: line.price_point_id,
                unit_price: resolved.unit_price,
                label: resolved.label,
            });
        }

        if !report.is_unchanged() {
            tracing::debug!(
                repriced = report.repriced.len(),
                removed = report.removed.len(),
                "cart repriced against menu"
            );
        }
        self.lines = next;
        self.publish();
        Ok(report)
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}

/// Convert a UI-supplied number into a line quantity.
pub fn quantity_from_input(value: f64) -> OrderingResult<i64> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(OrderingError::InvalidQuantity(format!(
            "quantity must be a whole number, got {value}"
        )));
    }
    validate_quantity(value as i64)
}

fn validate_quantity(quantity: i64) -> OrderingResult<i64> {
    if quantity <= 0 {
        return Err(OrderingError::InvalidQuantity(format!(
            "quantity must be positive, got {quantity}"
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(OrderingError::InvalidQuantity(format!(
            "quantity {quantity} exceeds maximum {MAX_QUANTITY}"
        )));
    }
    Ok(quantity)
}

fn missing_line(key: LineKey) -> OrderingError {
    OrderingError::ValidationFailure(format!("no cart line for item {}", key.item_id))
}

fn validate_snapshot(snapshot: &CartSnapshot) -> OrderingResult<()> {
    if snapshot.lines.is_empty() {
        return Ok(());
    }
    let restaurant_id = snapshot.restaurant_id.ok_or_else(|| {
        OrderingError::ValidationFailure("cart snapshot has lines but no restaurant".into())
    })?;
    let mut keys = HashSet::new();
    for line in &snapshot.lines {
        if line.item.restaurant_id != restaurant_id {
            return Err(OrderingError::RestaurantMismatch(format!(
                "snapshot line {} belongs to restaurant {}",
                line.item.id, line.item.restaurant_id
            )));
        }
        validate_quantity(i64::from(line.quantity))?;
        if line.unit_price < 0 {
            return Err(OrderingError::InvalidCatalog(format!(
                "snapshot line {} has negative price",
                line.item.id
            )));
        }
        if !keys.insert(line.key()) {
            return Err(OrderingError::ValidationFailure(format!(
                "snapshot has duplicate lines for item {}",
                line.item.id
            )));
        }
    }
    Ok(())
}
