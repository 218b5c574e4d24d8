//! Stable binary max-heap.
//!
//! Items surface by descending [`Prioritized::priority`]; items with equal
//! priority surface in the order they were pushed.

use std::cmp::Ordering;

/// Anything that can be ordered by the [`StablePriorityQueue`].
///
/// Higher values are popped first. Negative, zero and duplicate values are
/// all valid.
pub trait Prioritized {
    fn priority(&self) -> i64;
}

impl Prioritized for i64 {
    fn priority(&self) -> i64 {
        *self
    }
}

fn parent_index(index: usize) -> usize {
    (index - 1) / 2
}

fn left_child_index(index: usize) -> usize {
    index * 2 + 1
}

fn right_child_index(index: usize) -> usize {
    index * 2 + 2
}

/// Priority queue with a FIFO tiebreak on equal priorities.
///
/// Each entry is stored alongside the insertion sequence it received on
/// [`push`](Self::push). The sequence counter only ever grows, so an entry
/// pushed later can never overtake an earlier entry of the same priority.
#[derive(Debug)]
pub struct StablePriorityQueue<T> {
    heap: Vec<(T, u64)>,
    next_seq: u64,
}

impl<T> Default for StablePriorityQueue<T> {
    fn default() -> Self {
        Self {
            heap: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<T: Prioritized> StablePriorityQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item. O(log n).
    pub fn push(&mut self, item: T) {
        self.heap.push((item, self.next_seq));
        self.next_seq += 1;

        let mut index = self.heap.len() - 1;
        while index > 0 {
            let parent = parent_index(index);
            if !self.has_higher_priority(index, parent) {
                break;
            }
            self.heap.swap(index, parent);
            index = parent;
        }
    }

    /// Remove the highest-priority, earliest-inserted item. O(log n).
    ///
    /// Returns `None` when the queue is empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.heap.is_empty() {
            return None;
        }

        let (item, _) = self.heap.swap_remove(0);

        let len = self.heap.len();
        let mut index = 0;
        loop {
            let left = left_child_index(index);
            let right = right_child_index(index);
            if left >= len {
                break;
            }

            // Pick the higher-priority child; the right one only exists sometimes.
            let child = if right < len && self.has_higher_priority(right, left) {
                right
            } else {
                left
            };

            if !self.has_higher_priority(child, index) {
                break;
            }
            self.heap.swap(index, child);
            index = child;
        }

        Some(item)
    }

    /// The item the next [`pop`](Self::pop) would return.
    pub fn peek(&self) -> Option<&T> {
        self.heap.first().map(|(item, _)| item)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    fn compare(&self, a: usize, b: usize) -> Ordering {
        let (a_item, a_seq) = &self.heap[a];
        let (b_item, b_seq) = &self.heap[b];
        a_item
            .priority()
            .cmp(&b_item.priority())
            // Lower sequence wins, hence the reversed comparison.
            .then_with(|| b_seq.cmp(a_seq))
    }

    fn has_higher_priority(&self, a: usize, b: usize) -> bool {
        self.compare(a, b) == Ordering::Greater
    }
}
