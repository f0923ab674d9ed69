/// Maintenance tracker: Entity Store
///
/// One owned, append-only container per collection. Records keep their
/// position for the life of the store; nothing is ever removed.
///
/// A key index (key -> positions, in insertion order) replaces linear
/// scans. Identifier collections have one position per key; materials are
/// keyed by their order and may share a key.

use std::collections::BTreeMap;

use crate::arithmetic::{grown_capacity, next_id};
use crate::domain::{Asset, Department, Material, Order, Technician};
use crate::error::CapacityError;

/// Records that can be indexed by an integer key.
///
/// The key of a stored record must not change after insertion.
pub trait Keyed {
    /// Collection name used in messages.
    const COLLECTION: &'static str;

    fn key(&self) -> i32;
}

impl Keyed for Department {
    const COLLECTION: &'static str = "departments";
    fn key(&self) -> i32 {
        self.id
    }
}

impl Keyed for Asset {
    const COLLECTION: &'static str = "assets";
    fn key(&self) -> i32 {
        self.id
    }
}

impl Keyed for Technician {
    const COLLECTION: &'static str = "technicians";
    fn key(&self) -> i32 {
        self.id
    }
}

impl Keyed for Order {
    const COLLECTION: &'static str = "orders";
    fn key(&self) -> i32 {
        self.id
    }
}

impl Keyed for Material {
    const COLLECTION: &'static str = "materials";
    fn key(&self) -> i32 {
        self.order_id
    }
}

#[derive(Debug, PartialEq)]
pub struct Store<T> {
    records: Vec<T>,
    index: BTreeMap<i32, Vec<usize>>,
    growth_step: usize,
}

/// Copies keep the capacity already grown, so a scratch state cloned for
/// one operation grows in the same steps as the committed one.
impl<T: Clone> Clone for Store<T> {
    fn clone(&self) -> Self {
        let mut records = Vec::with_capacity(self.records.capacity());
        records.extend_from_slice(&self.records);
        Self {
            records,
            index: self.index.clone(),
            growth_step: self.growth_step,
        }
    }
}

impl<T: Keyed> Store<T> {
    pub fn new(growth_step: usize) -> Self {
        Self {
            records: Vec::new(),
            index: BTreeMap::new(),
            growth_step,
        }
    }

    /// Build a store around records loaded from elsewhere, in their order.
    pub fn from_records(records: Vec<T>, growth_step: usize) -> Self {
        let mut index: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        for (pos, record) in records.iter().enumerate() {
            index.entry(record.key()).or_default().push(pos);
        }
        Self {
            records,
            index,
            growth_step,
        }
    }

    /// Append a record, growing capacity by one step when full.
    ///
    /// On allocation failure the store is left exactly as it was.
    pub fn insert(&mut self, record: T) -> Result<usize, CapacityError> {
        let len = self.records.len();
        if len == self.records.capacity() {
            let exhausted = CapacityError {
                collection: T::COLLECTION,
                len,
            };
            let target = grown_capacity(self.records.capacity(), self.growth_step)
                .ok_or_else(|| exhausted.clone())?;
            self.records
                .try_reserve_exact(target - len)
                .map_err(|_| exhausted)?;
        }
        let pos = len;
        self.index.entry(record.key()).or_default().push(pos);
        self.records.push(record);
        Ok(pos)
    }

    /// Every position stored under `key`, oldest first.
    pub fn positions(&self, key: i32) -> &[usize] {
        self.index.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First position under `key` whose record satisfies `accept`.
    pub fn find_where<F>(&self, key: i32, accept: F) -> Option<usize>
    where
        F: Fn(&T) -> bool,
    {
        self.positions(key)
            .iter()
            .copied()
            .find(|&pos| accept(&self.records[pos]))
    }

    pub fn find(&self, key: i32) -> Option<usize> {
        self.positions(key).first().copied()
    }

    pub fn max_key(&self) -> Option<i32> {
        self.index.keys().next_back().copied()
    }

    /// Identifier for the next record: largest key + 1, or `first_id`.
    ///
    /// Fails once the largest key is `i32::MAX` rather than reuse it.
    pub fn next_id(&self, first_id: i32) -> Result<i32, CapacityError> {
        next_id(self.max_key(), first_id).ok_or(CapacityError {
            collection: T::COLLECTION,
            len: self.records.len(),
        })
    }

    pub fn get(&self, pos: usize) -> Option<&T> {
        self.records.get(pos)
    }

    /// Mutable access by position. Callers must not change the key.
    pub fn get_mut(&mut self, pos: usize) -> Option<&mut T> {
        self.records.get_mut(pos)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.records.capacity()
    }

    /// Keys stored at more than one position.
    pub fn duplicate_keys(&self) -> Vec<i32> {
        self.index
            .iter()
            .filter(|(_, positions)| positions.len() > 1)
            .map(|(key, _)| *key)
            .collect()
    }
}

impl<'a, T> IntoIterator for &'a Store<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(order_id: i32, name: &str) -> Material {
        Material {
            name: Some(name.to_string()),
            unit_cost: 1.0,
            quantity: 1,
            order_id,
        }
    }

    #[test]
    fn test_empty_store_hands_out_first_id() {
        let store: Store<Material> = Store::new(5);
        assert_eq!(store.next_id(10), Ok(10));
        assert_eq!(store.find(10), None);
        assert!(store.positions(10).is_empty());
    }

    #[test]
    fn test_capacity_grows_in_steps() {
        let mut store = Store::new(5);
        store.insert(material(1, "a")).unwrap();
        assert!(store.capacity() >= 5);
        for i in 0..5 {
            store.insert(material(2, &format!("m{}", i))).unwrap();
        }
        assert_eq!(store.len(), 6);
        assert!(store.capacity() >= 10);
    }

    #[test]
    fn test_shared_keys_keep_insertion_order() {
        let mut store = Store::new(5);
        store.insert(material(20, "first")).unwrap();
        store.insert(material(21, "other")).unwrap();
        store.insert(material(20, "second")).unwrap();
        assert_eq!(store.positions(20), &[0, 2]);
        assert_eq!(store.duplicate_keys(), vec![20]);
        let pos = store
            .find_where(20, |m| m.name.as_deref() == Some("second"))
            .unwrap();
        assert_eq!(pos, 2);
    }

    #[test]
    fn test_from_records_rebuilds_index() {
        let store = Store::from_records(vec![material(12, "x"), material(30, "y")], 5);
        assert_eq!(store.find(30), Some(1));
        assert_eq!(store.max_key(), Some(30));
        assert_eq!(store.next_id(10), Ok(31));
    }

    #[test]
    fn test_no_identifier_past_max() {
        let store = Store::from_records(vec![material(i32::MAX, "last")], 5);
        assert_eq!(
            store.next_id(10),
            Err(CapacityError { collection: "materials", len: 1 })
        );
    }

    #[test]
    fn test_clone_keeps_grown_capacity() {
        let mut store = Store::new(5);
        store.insert(material(1, "a")).unwrap();
        let grown = store.capacity();
        assert!(grown >= 5);

        let mut copy = store.clone();
        assert_eq!(copy, store);
        assert!(copy.capacity() >= grown);
        for i in 0..4 {
            copy.insert(material(2, &format!("m{}", i))).unwrap();
        }
        assert_eq!(copy.len(), 5);
        assert!(copy.capacity() >= grown);
    }
}
