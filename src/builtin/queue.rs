use crate::base::behavior::*;
use crate::base::module::{IsModule, ModuleBase};
use std::collections::VecDeque;

#[derive(Debug)]
pub struct QueueState<T, const N: usize> {
    pub storage: VecDeque<T>,
    max_size: usize,
}

impl<T, const N: usize> Default for QueueState<T, N> {
    fn default() -> Self {
        Self {
            storage: VecDeque::new(),
            max_size: N,
        }
    }
}

/// A bounded FIFO. `try_enq` refuses entries beyond the capacity, which is
/// what backpressures the producer.
#[derive(Debug)]
pub struct Queue<T, const N: usize> {
    base: ModuleBase<QueueState<T, N>, ()>,
}

impl<T, const N: usize> Default for Queue<T, N> {
    fn default() -> Self {
        Queue {
            base: ModuleBase::default(),
        }
    }
}

impl<T, const N: usize> ModuleBehaviors for Queue<T, N> {
    fn tick_one(&mut self) {}

    fn reset(&mut self) {
        self.state_mut().storage.clear();
    }
}

impl<T, const N: usize> IsModule for Queue<T, N> {
    type StateType = QueueState<T, N>;
    type ConfigType = ();

    fn base(&mut self) -> &mut ModuleBase<QueueState<T, N>, ()> {
        &mut self.base
    }

    fn base_ref(&self) -> &ModuleBase<QueueState<T, N>, ()> {
        &self.base
    }
}

impl<T, const N: usize> Queue<T, N> {
    pub fn try_enq(&mut self, data: T) -> bool {
        if !self.can_enq() {
            return false;
        }
        self.state_mut().storage.push_back(data);
        true
    }

    pub fn try_deq(&mut self) -> Option<T> {
        self.state_mut().storage.pop_front()
    }

    pub fn can_enq(&self) -> bool {
        self.state().storage.len() < self.state().max_size
    }

    pub fn len(&self) -> usize {
        self.state().storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().storage.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.state().storage.iter()
    }

    pub fn resize(&mut self, size: usize) {
        self.state_mut().max_size = size;
    }
}
