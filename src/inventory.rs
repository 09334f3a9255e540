use serde::{Deserialize, Serialize};

use crate::error::ConversionError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLevel {
    pub name: String,
    pub count: u64,
}

/// Named non-negative counters, iterated in declaration order followed by
/// any names first written at runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    entries: Vec<ResourceLevel>,
}

impl ResourceCounts {
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut counts = Self::default();
        for name in names {
            let name = name.into();
            if counts.position(&name).is_none() {
                counts.entries.push(ResourceLevel { name, count: 0 });
            }
        }
        counts
    }

    pub fn get(&self, name: &str) -> u64 {
        self.position(name)
            .map(|index| self.entries[index].count)
            .unwrap_or(0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn add(&mut self, name: &str, amount: u64) {
        if amount == 0 {
            return;
        }
        let index = self.position_or_insert(name);
        let entry = &mut self.entries[index];
        entry.count = entry.count.saturating_add(amount);
    }

    pub fn subtract(&mut self, name: &str, amount: u64) -> Result<(), ConversionError> {
        let available = self.get(name);
        if amount > available {
            return Err(ConversionError::InvariantViolation {
                resource: name.to_string(),
                requested: amount,
                available,
            });
        }
        if amount == 0 {
            return Ok(());
        }
        if let Some(index) = self.position(name) {
            self.entries[index].count = available - amount;
        }
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.count))
    }

    pub fn levels(&self) -> Vec<ResourceLevel> {
        self.entries.clone()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name == name)
    }

    fn position_or_insert(&mut self, name: &str) -> usize {
        match self.position(name) {
            Some(index) => index,
            None => {
                self.entries.push(ResourceLevel {
                    name: name.to_string(),
                    count: 0,
                });
                self.entries.len() - 1
            }
        }
    }
}

/// The habitat's stores: waste, products, and the power/water reserves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    pub(crate) waste: ResourceCounts,
    pub(crate) products: ResourceCounts,
    power: u64,
    water: u64,
}

impl Inventory {
    pub fn new(waste: ResourceCounts, products: ResourceCounts, power: u64, water: u64) -> Self {
        Self {
            waste,
            products,
            power,
            water,
        }
    }

    pub fn waste(&self, resource: &str) -> u64 {
        self.waste.get(resource)
    }

    pub fn product(&self, resource: &str) -> u64 {
        self.products.get(resource)
    }

    pub fn add_waste(&mut self, resource: &str, amount: u64) {
        self.waste.add(resource, amount);
    }

    pub fn add_product(&mut self, resource: &str, amount: u64) {
        self.products.add(resource, amount);
    }

    pub fn subtract_waste(&mut self, resource: &str, amount: u64) -> Result<(), ConversionError> {
        self.waste.subtract(resource, amount)
    }

    pub fn waste_counts(&self) -> &ResourceCounts {
        &self.waste
    }

    pub fn product_counts(&self) -> &ResourceCounts {
        &self.products
    }

    pub fn power(&self) -> u64 {
        self.power
    }

    pub fn water(&self) -> u64 {
        self.water
    }

    pub fn spend_power(&mut self, amount: u64) -> Result<(), ConversionError> {
        self.power = checked_spend("power", self.power, amount)?;
        Ok(())
    }

    pub fn spend_water(&mut self, amount: u64) -> Result<(), ConversionError> {
        self.water = checked_spend("water", self.water, amount)?;
        Ok(())
    }

    /// Pulls power and water into their `[floor, ceiling]` bands.
    pub(crate) fn settle_reserves(&mut self, power: (u64, u64), water: (u64, u64)) {
        self.power = self.power.max(power.0).min(power.1);
        self.water = self.water.max(water.0).min(water.1);
    }
}

fn checked_spend(resource: &str, available: u64, amount: u64) -> Result<u64, ConversionError> {
    available
        .checked_sub(amount)
        .ok_or_else(|| ConversionError::InvariantViolation {
            resource: resource.to_string(),
            requested: amount,
            available,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory() -> Inventory {
        Inventory::new(
            ResourceCounts::with_names(["fabric", "packaging", "eva", "foam"]),
            ResourceCounts::with_names(["insulation"]),
            100,
            100,
        )
    }

    #[test]
    fn unknown_names_read_zero_and_are_created_on_write() {
        let mut inv = inventory();
        assert_eq!(inv.product("composites"), 0);
        assert!(!inv.product_counts().contains("composites"));
        inv.add_product("composites", 2);
        assert_eq!(inv.product("composites"), 2);
        let names: Vec<_> = inv.product_counts().names().collect();
        assert_eq!(names, vec!["insulation", "composites"]);
    }

    #[test]
    fn zero_add_does_not_create_entry() {
        let mut inv = inventory();
        inv.add_waste("regolith", 0);
        assert!(!inv.waste_counts().contains("regolith"));
    }

    #[test]
    fn over_subtraction_is_rejected_without_mutation() {
        let mut inv = inventory();
        inv.add_waste("fabric", 2);
        let err = inv.subtract_waste("fabric", 3).unwrap_err();
        assert_eq!(
            err,
            ConversionError::InvariantViolation {
                resource: "fabric".into(),
                requested: 3,
                available: 2,
            }
        );
        assert_eq!(inv.waste("fabric"), 2);
        inv.subtract_waste("fabric", 2).unwrap();
        assert_eq!(inv.waste("fabric"), 0);
    }

    #[test]
    fn reserves_cannot_go_negative() {
        let mut inv = inventory();
        inv.spend_power(95).unwrap();
        assert!(inv.spend_power(6).is_err());
        assert_eq!(inv.power(), 5);
        inv.spend_water(100).unwrap();
        assert_eq!(inv.water(), 0);
    }

    #[test]
    fn settle_clamps_into_band() {
        let mut inv = inventory();
        inv.spend_power(50).unwrap();
        inv.settle_reserves((95, 100), (90, 100));
        assert_eq!(inv.power(), 95);
        assert_eq!(inv.water(), 100);
    }
}
