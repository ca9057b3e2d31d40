//! Index-addressed texture storage with slot reuse.

/// Vector of slots addressed by [`TextureId`](crate::TextureId) indices.
///
/// Released slots go on a free list and are handed out again by the next
/// insert, so recreating a target on every resize keeps the slot count
/// bounded by the peak number of live textures. An index stays valid until
/// its slot is released; after that it may name a newer texture.
#[derive(Debug)]
pub struct TextureSlots<T> {
    items: Vec<Option<T>>,
    free: Vec<u32>,
}

impl<T> Default for TextureSlots<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> TextureSlots<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `item`, reusing the most recently released slot if there is one.
    pub fn insert(&mut self, item: T) -> u32 {
        match self.free.pop() {
            Some(index) => {
                self.items[index as usize] = Some(item);
                index
            }
            None => {
                self.items.push(Some(item));
                self.items.len() as u32 - 1
            }
        }
    }

    /// Empty the slot at `index`; it becomes available to the next insert.
    pub fn remove(&mut self, index: u32) -> Option<T> {
        let item = self.items.get_mut(index as usize)?.take()?;
        self.free.push(index);
        Some(item)
    }

    /// The live item at `index`.
    pub fn get(&self, index: u32) -> Option<&T> {
        self.items.get(index as usize)?.as_ref()
    }

    /// Whether `index` was ever handed out, live or released.
    pub fn is_issued(&self, index: u32) -> bool {
        (index as usize) < self.items.len()
    }

    /// Number of slots allocated so far.
    pub fn capacity(&self) -> usize {
        self.items.len()
    }

    /// Number of live items.
    pub fn live(&self) -> usize {
        self.items.len() - self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_released_slot_is_reused() {
        let mut slots = TextureSlots::new();
        let a = slots.insert("a");
        let b = slots.insert("b");
        assert_eq!(slots.remove(a), Some("a"));
        assert_eq!(slots.get(a), None);
        assert!(slots.is_issued(a));

        let c = slots.insert("c");
        assert_eq!(c, a);
        assert_eq!(slots.get(c), Some(&"c"));
        assert_eq!(slots.get(b), Some(&"b"));
        assert_eq!(slots.capacity(), 2);
    }

    #[test]
    fn test_repeated_recreation_keeps_capacity_bounded() {
        let mut slots = TextureSlots::new();
        slots.insert("fallback");
        let mut attachments: Vec<u32> = (0..4).map(|_| slots.insert("attachment")).collect();
        for _ in 0..50 {
            for index in attachments.drain(..) {
                slots.remove(index);
            }
            attachments = (0..4).map(|_| slots.insert("attachment")).collect();
        }
        assert_eq!(slots.capacity(), 5);
        assert_eq!(slots.live(), 5);
    }

    #[test]
    fn test_double_remove_does_not_duplicate_free_slot() {
        let mut slots = TextureSlots::new();
        let a = slots.insert(1);
        assert_eq!(slots.remove(a), Some(1));
        assert_eq!(slots.remove(a), None);
        assert_eq!(slots.remove(7), None);
        assert_ne!(slots.insert(2), slots.insert(3));
        assert!(!slots.is_issued(7));
    }
}
