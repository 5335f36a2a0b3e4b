//! Monotonic handle-keyed heap.

use std::collections::HashMap;

use crate::error::MemoryError;
use crate::value::Value;

/// A heap allocation table: handles are assigned sequentially and never
/// reused, so a freed handle can still be detected and reported instead of
/// aliasing a later allocation.
#[derive(Debug, Clone, Default)]
pub struct Heap {
    content: HashMap<u64, Value>,
    next_handle: u64,
}

impl Heap {
    /// An empty heap.
    pub fn new() -> Self {
        Heap {
            content: HashMap::new(),
            next_handle: 0,
        }
    }

    /// Allocate a region holding `value`, returning its handle.
    pub fn alloc(&mut self, value: Value) -> u64 {
        let handle = self.next_handle;
        self.content.insert(handle, value);
        self.next_handle += 1;
        handle
    }

    /// Free the region identified by `handle`.
    pub fn free(&mut self, handle: u64) -> Result<(), MemoryError> {
        self.content.remove(&handle).map(|_| ()).ok_or(MemoryError::HeapUseAfterFree(handle))
    }

    /// The value stored at `handle`.
    pub fn get(&self, handle: u64) -> Result<Value, MemoryError> {
        self.content.get(&handle).copied().ok_or(MemoryError::HeapUseAfterFree(handle))
    }

    /// Overwrite the value stored at `handle`.
    pub fn set(&mut self, handle: u64, value: Value) -> Result<(), MemoryError> {
        if !self.content.contains_key(&handle) {
            return Err(MemoryError::HeapUseAfterFree(handle));
        }
        self.content.insert(handle, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_get_set_and_free_round_trip() {
        let mut heap = Heap::new();
        let handle = heap.alloc(Value::Int(1));
        assert_eq!(heap.get(handle).unwrap(), Value::Int(1));
        heap.set(handle, Value::Int(2)).unwrap();
        assert_eq!(heap.get(handle).unwrap(), Value::Int(2));

        let other = heap.alloc(Value::Int(400));
        assert_eq!(heap.get(other).unwrap(), Value::Int(400));
        assert_eq!(heap.get(handle).unwrap(), Value::Int(2));

        heap.free(handle).unwrap();
        assert_eq!(heap.get(other).unwrap(), Value::Int(400));
        assert!(heap.get(handle).is_err());
    }

    #[test]
    fn handles_are_never_reused() {
        let mut heap = Heap::new();
        let a = heap.alloc(Value::Int(1));
        heap.free(a).unwrap();
        let b = heap.alloc(Value::Int(2));
        assert_ne!(a, b);
    }
}
