//! Observable ordered collection.
//!
//! `CallbackList` wraps a `Vec` and hands `(old, new)` contents to a
//! registered callback after every effective mutation. The world uses it
//! for live views over `is_a`, equivalence sets and property values, so
//! editing the view runs the matching propagation path.

use std::fmt;
use std::ops::Deref;

use crate::Result;

type Callback<'a, T> = Box<dyn FnMut(&[T], &[T]) -> Result<()> + 'a>;

pub struct CallbackList<'a, T> {
    items: Vec<T>,
    callback: Callback<'a, T>,
}

impl<'a, T: Clone + PartialEq> CallbackList<'a, T> {
    pub fn new<F>(items: Vec<T>, callback: F) -> Self
    where
        F: FnMut(&[T], &[T]) -> Result<()> + 'a,
    {
        Self { items, callback: Box::new(callback) }
    }

    pub fn push(&mut self, item: T) -> Result<()> {
        self.mutate(|v| v.push(item))
    }

    pub fn insert(&mut self, index: usize, item: T) -> Result<()> {
        self.mutate(|v| v.insert(index.min(v.len()), item))
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) -> Result<()> {
        self.mutate(|v| v.extend(items))
    }

    /// Remove the first occurrence. Returns whether anything was removed.
    pub fn remove(&mut self, item: &T) -> Result<bool> {
        let Some(pos) = self.items.iter().position(|x| x == item) else {
            return Ok(false);
        };
        self.mutate(|v| {
            v.remove(pos);
        })?;
        Ok(true)
    }

    pub fn pop(&mut self) -> Result<Option<T>> {
        let last = self.items.last().cloned();
        if last.is_some() {
            self.mutate(|v| {
                v.pop();
            })?;
        }
        Ok(last)
    }

    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) -> Result<()> {
        self.mutate(|v| v.retain(keep))
    }

    pub fn clear(&mut self) -> Result<()> {
        self.mutate(Vec::clear)
    }

    /// Replace the whole content.
    pub fn reinit(&mut self, items: impl IntoIterator<Item = T>) -> Result<()> {
        let items: Vec<T> = items.into_iter().collect();
        self.mutate(|v| *v = items)
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    fn mutate(&mut self, f: impl FnOnce(&mut Vec<T>)) -> Result<()> {
        let old = self.items.clone();
        f(&mut self.items);
        if old == self.items {
            return Ok(());
        }
        (self.callback)(&old, &self.items)
    }
}

impl<T> Deref for CallbackList<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T: fmt::Debug> fmt::Debug for CallbackList<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_callback_receives_old_and_new() {
        let seen = RefCell::new(Vec::new());
        let mut list = CallbackList::new(vec![1, 2], |old: &[i32], new: &[i32]| {
            seen.borrow_mut().push((old.to_vec(), new.to_vec()));
            Ok(())
        });
        list.push(3).unwrap();
        list.remove(&1).unwrap();
        drop(list);

        assert_eq!(
            seen.into_inner(),
            vec![(vec![1, 2], vec![1, 2, 3]), (vec![1, 2, 3], vec![2, 3])]
        );
    }

    #[test]
    fn test_no_callback_when_unchanged() {
        let calls = RefCell::new(0);
        let mut list = CallbackList::new(vec![1], |_: &[i32], _: &[i32]| {
            *calls.borrow_mut() += 1;
            Ok(())
        });
        assert!(!list.remove(&9).unwrap());
        list.reinit(vec![1]).unwrap();
        list.retain(|_| true).unwrap();
        drop(list);
        assert_eq!(calls.into_inner(), 0);
    }

    #[test]
    fn test_callback_error_propagates() {
        let mut list = CallbackList::new(Vec::<i32>::new(), |_: &[i32], _: &[i32]| {
            Err(crate::Error::StorageError("offline".into()))
        });
        assert!(list.push(1).is_err());
        assert_eq!(&*list, &[1]);
    }
}
