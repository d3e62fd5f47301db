//! Display store
//!
//! A keyed container of readings that overlay panels read from. A
//! composition root owns one [`DisplayStore`] and hands typed
//! [`Publisher`] handles to the fixtures that write into it.
//!
//! Only changes are recorded: writing the value a key already holds does
//! not bump its revision.

use crate::error::{CitySimError, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// A displayed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    /// Numeric readout
    Number(f64),
    /// On/off indicator
    Flag(bool),
    /// Free-form label
    Text(String),
}

impl Reading {
    /// Name of the variant, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Reading::Number(_) => "number",
            Reading::Flag(_) => "flag",
            Reading::Text(_) => "text",
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Number(v) => write!(f, "{:.2}", v),
            Reading::Flag(b) => write!(f, "{}", if *b { "on" } else { "off" }),
            Reading::Text(s) => f.write_str(s),
        }
    }
}

/// Types that can be stored as a [`Reading`].
pub trait StoreValue: Sized {
    /// Variant name
    const KIND: &'static str;

    /// Wrap into a reading
    fn into_reading(self) -> Reading;

    /// Unwrap from a reading of the matching variant
    fn from_reading(reading: &Reading) -> Option<Self>;
}

impl StoreValue for f64 {
    const KIND: &'static str = "number";

    fn into_reading(self) -> Reading {
        Reading::Number(self)
    }

    fn from_reading(reading: &Reading) -> Option<Self> {
        match reading {
            Reading::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl StoreValue for bool {
    const KIND: &'static str = "flag";

    fn into_reading(self) -> Reading {
        Reading::Flag(self)
    }

    fn from_reading(reading: &Reading) -> Option<Self> {
        match reading {
            Reading::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl StoreValue for String {
    const KIND: &'static str = "text";

    fn into_reading(self) -> Reading {
        Reading::Text(self)
    }

    fn from_reading(reading: &Reading) -> Option<Self> {
        match reading {
            Reading::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Slot {
    reading: Reading,
    revision: u64,
}

#[derive(Debug, Default)]
struct StoreInner {
    slots: BTreeMap<String, Slot>,
    revision: u64,
}

/// Serializable view of the store at one revision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Store-wide revision
    pub revision: u64,
    /// Readings by key
    pub readings: BTreeMap<String, Reading>,
}

impl StoreSnapshot {
    /// Numeric reading for a key
    pub fn number(&self, key: &str) -> Option<f64> {
        self.readings.get(key).and_then(f64::from_reading)
    }

    /// Flag reading for a key
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.readings.get(key).and_then(bool::from_reading)
    }
}

/// Shared, single-threaded store of display readings.
///
/// Cloning yields another handle onto the same readings.
#[derive(Debug, Clone, Default)]
pub struct DisplayStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl DisplayStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed write handle bound to one key
    pub fn publisher<T: StoreValue>(&self, key: impl Into<String>) -> Publisher<T> {
        Publisher {
            key: key.into(),
            store: self.clone(),
            _marker: PhantomData,
        }
    }

    /// Write a value; returns true when the stored reading changed
    pub fn set<T: StoreValue>(&self, key: &str, value: T) -> bool {
        let reading = value.into_reading();
        let mut inner = self.inner.borrow_mut();

        if let Some(slot) = inner.slots.get(key) {
            if slot.reading == reading {
                return false;
            }
        }

        inner.revision += 1;
        let revision = inner.revision;
        inner
            .slots
            .insert(key.to_string(), Slot { reading, revision });
        true
    }

    /// Typed read; errors when the key holds another type
    pub fn get<T: StoreValue>(&self, key: &str) -> Result<Option<T>> {
        let inner = self.inner.borrow();
        match inner.slots.get(key) {
            None => Ok(None),
            Some(slot) => T::from_reading(&slot.reading).map(Some).ok_or_else(|| {
                CitySimError::KeyTypeMismatch {
                    key: key.to_string(),
                    expected: T::KIND,
                    actual: slot.reading.kind(),
                }
            }),
        }
    }

    /// Untyped read
    pub fn reading(&self, key: &str) -> Option<Reading> {
        self.inner
            .borrow()
            .slots
            .get(key)
            .map(|slot| slot.reading.clone())
    }

    /// Numeric reading, `None` when absent or not a number
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).ok().flatten()
    }

    /// Flag reading, `None` when absent or not a flag
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).ok().flatten()
    }

    /// Text reading, `None` when absent or not text
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).ok().flatten()
    }

    /// Store-wide revision, bumped on every change
    pub fn revision(&self) -> u64 {
        self.inner.borrow().revision
    }

    /// Revision at which a key last changed
    pub fn key_revision(&self, key: &str) -> Option<u64> {
        self.inner.borrow().slots.get(key).map(|slot| slot.revision)
    }

    /// Remove a key; returns the reading it held
    pub fn remove(&self, key: &str) -> Option<Reading> {
        let mut inner = self.inner.borrow_mut();
        let removed = inner.slots.remove(key)?;
        inner.revision += 1;
        Some(removed.reading)
    }

    /// All keys, in order
    pub fn keys(&self) -> Vec<String> {
        self.inner.borrow().slots.keys().cloned().collect()
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.inner.borrow().slots.len()
    }

    /// Check if the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().slots.is_empty()
    }

    /// Copy every reading
    pub fn snapshot(&self) -> StoreSnapshot {
        let inner = self.inner.borrow();
        StoreSnapshot {
            revision: inner.revision,
            readings: inner
                .slots
                .iter()
                .map(|(key, slot)| (key.clone(), slot.reading.clone()))
                .collect(),
        }
    }
}

/// Typed write handle for one store key.
pub struct Publisher<T> {
    key: String,
    store: DisplayStore,
    _marker: PhantomData<fn(T)>,
}

impl<T: StoreValue> Publisher<T> {
    /// Publish a value; returns true when the reading changed
    pub fn publish(&self, value: T) -> bool {
        self.store.set(&self.key, value)
    }

    /// Key this handle writes
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<T> Clone for Publisher<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            store: self.store.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Publisher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher").field("key", &self.key).finish()
    }
}
