//! Fixed-capacity vectors used as equation state and model scratch storage.

use crate::config::{MAX_EQUATIONS, MAX_STORAGE};
use crate::traits::StateScalar;
use std::ops::{Index, IndexMut};

/// A vector of `MAX_EQUATIONS` components. Only the leading `num_equations`
/// entries of an equation state are meaningful; the rest stay zeroed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector<T: StateScalar> {
    values: [T; MAX_EQUATIONS],
}

impl<T: StateScalar> StateVector<T> {
    pub fn zeros() -> Self {
        Self {
            values: [T::zero(); MAX_EQUATIONS],
        }
    }

    pub fn from_slice(values: &[T]) -> Self {
        let mut vector = Self::zeros();
        let len = values.len().min(MAX_EQUATIONS);
        vector.values[..len].copy_from_slice(&values[..len]);
        vector
    }

    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.values
    }
}

impl<T: StateScalar> Default for StateVector<T> {
    fn default() -> Self {
        Self::zeros()
    }
}

impl<T: StateScalar> Index<usize> for StateVector<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.values[index]
    }
}

impl<T: StateScalar> IndexMut<usize> for StateVector<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.values[index]
    }
}

/// Scratch slots a model fills during one pass and reads back in a later one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelStorage<T: StateScalar> {
    slots: [T; MAX_STORAGE],
}

impl<T: StateScalar> ModelStorage<T> {
    pub fn new() -> Self {
        Self {
            slots: [T::zero(); MAX_STORAGE],
        }
    }

    #[inline]
    pub fn get(&self, slot: usize) -> T {
        self.slots[slot]
    }

    #[inline]
    pub fn set(&mut self, slot: usize, value: T) {
        self.slots[slot] = value;
    }
}

impl<T: StateScalar> Default for ModelStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn from_slice_copies_prefix_and_zeroes_tail() {
        let vector = StateVector::from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(&vector.as_slice()[..3], &[1.0, 2.0, 3.0]);
        assert!(vector.as_slice()[3..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn from_slice_truncates_to_capacity() {
        let long = vec![1.0; MAX_EQUATIONS + 5];
        let vector = StateVector::from_slice(&long);
        assert_eq!(vector.as_slice().len(), MAX_EQUATIONS);
    }

    #[test]
    fn storage_round_trips_complex_slot() {
        let mut storage = ModelStorage::<Complex64>::new();
        storage.set(3, Complex64::new(1.5, -2.0));
        assert_eq!(storage.get(3), Complex64::new(1.5, -2.0));
        assert_eq!(storage.get(2), Complex64::new(0.0, 0.0));
    }
}
