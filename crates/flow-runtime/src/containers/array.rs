//! Growable indexed array
//!
//! Capacity doubles when full, so a run of pushes reallocates a logarithmic
//! number of times.

const MIN_CAPACITY: usize = 4;

#[derive(Debug, Clone)]
pub struct DynamicArray<T> {
    items: Vec<T>,
}

impl<T> Default for DynamicArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DynamicArray<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    fn grow_if_full(&mut self) {
        if self.items.len() == self.items.capacity() {
            let target = (self.items.capacity() * 2).max(MIN_CAPACITY);
            self.items.reserve_exact(target - self.items.len());
        }
    }

    pub fn get_item(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn push(&mut self, value: T) {
        self.grow_if_full();
        self.items.push(value);
    }

    /// Place `value` at `index`.
    ///
    /// With `overwrite` the item at `index` is replaced and returned;
    /// otherwise later items shift right. `index == len` appends in both
    /// modes. Any larger index leaves the array untouched and hands the
    /// value back as `Err`.
    pub fn insert_at(&mut self, value: T, index: usize, overwrite: bool) -> Result<Option<T>, T> {
        let len = self.items.len();
        if index > len {
            return Err(value);
        }
        if index == len {
            self.push(value);
            return Ok(None);
        }
        if overwrite {
            Ok(Some(std::mem::replace(&mut self.items[index], value)))
        } else {
            self.grow_if_full();
            self.items.insert(index, value);
            Ok(None)
        }
    }

    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T> FromIterator<T> for DynamicArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = DynamicArray::new();
        for item in iter {
            array.push(item);
        }
        array
    }
}
