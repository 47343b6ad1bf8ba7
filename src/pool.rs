//! Pools, freelists and small-buffer arrays with fallible growth.
//!
//! Everything in here hands out indices instead of references, and every
//! heap allocation is charged against a [`Budget`] and made with
//! `try_reserve_exact`, so that running out of memory is reported as
//! [`Error::NoMemory`] instead of aborting. Charges are refunded on drop.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use arrayvec::ArrayVec;

use crate::Error;

/// A shared allocation budget, in bytes.
///
/// Cloning a budget shares it: all the pools and arrays created from clones
/// of the same budget draw from the same allowance, and hand their bytes back
/// when they're dropped. The default budget is unlimited.
#[derive(Clone, Debug, Default)]
pub struct Budget {
    remaining: Option<Arc<AtomicUsize>>,
}

impl Budget {
    /// A budget that never runs out.
    pub fn unlimited() -> Self {
        Budget { remaining: None }
    }

    /// A budget that allows `bytes` bytes of heap growth in total.
    pub fn new(bytes: usize) -> Self {
        Budget {
            remaining: Some(Arc::new(AtomicUsize::new(bytes))),
        }
    }

    /// How many bytes are left, or `None` if the budget is unlimited.
    pub fn remaining(&self) -> Option<usize> {
        self.remaining.as_ref().map(|r| r.load(Ordering::Relaxed))
    }

    /// Takes `bytes` out of the budget.
    pub fn charge(&self, bytes: usize) -> Result<(), Error> {
        let Some(remaining) = &self.remaining else {
            return Ok(());
        };
        remaining
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |r| r.checked_sub(bytes))
            .map(|_| ())
            .map_err(|r| {
                log::debug!("memory budget exhausted: wanted {bytes} bytes, {r} left");
                Error::NoMemory
            })
    }

    /// Puts `bytes` back into the budget.
    pub fn refund(&self, bytes: usize) {
        if let Some(remaining) = &self.remaining {
            remaining.fetch_add(bytes, Ordering::Relaxed);
        }
    }
}

/// A `Vec` whose growth is charged to a [`Budget`].
///
/// Every allocation is made with `try_reserve_exact`, and the bytes charged
/// for it go back to the budget when the vector is dropped, so a budget
/// bounds the memory held at any one time rather than the total ever
/// allocated.
pub struct TryVec<T> {
    vec: Vec<T>,
    charged: usize,
    budget: Budget,
}

impl<T> TryVec<T> {
    /// Creates an empty vector that charges `budget` when it grows.
    pub fn new(budget: Budget) -> Self {
        TryVec {
            vec: Vec::new(),
            charged: 0,
            budget,
        }
    }

    /// Creates a vector with room for `cap` elements.
    pub fn with_capacity(cap: usize, budget: Budget) -> Result<Self, Error> {
        let mut ret = TryVec::new(budget);
        ret.try_reserve(cap)?;
        Ok(ret)
    }

    /// Makes room for `additional` more elements.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), Error> {
        let needed = self.vec.len().saturating_add(additional);
        if needed <= self.vec.capacity() {
            return Ok(());
        }
        let bytes = (needed - self.vec.capacity()).saturating_mul(std::mem::size_of::<T>());
        self.budget.charge(bytes)?;
        match self.vec.try_reserve_exact(additional) {
            Ok(()) => {
                self.charged += bytes;
                Ok(())
            }
            Err(_) => {
                self.budget.refund(bytes);
                Err(Error::NoMemory)
            }
        }
    }

    /// Appends an element, doubling the capacity if it's full.
    pub fn try_push(&mut self, val: T) -> Result<(), Error> {
        if self.vec.len() == self.vec.capacity() {
            self.try_reserve(self.vec.capacity().max(4))?;
        }
        self.vec.push(val);
        Ok(())
    }

    /// Appends a copy of every element of `vals`.
    pub fn try_extend_from_slice(&mut self, vals: &[T]) -> Result<(), Error>
    where
        T: Clone,
    {
        self.try_reserve(vals.len())?;
        self.vec.extend_from_slice(vals);
        Ok(())
    }

    /// Grows or shrinks the vector to `len` elements, filling with `val`.
    pub fn try_resize(&mut self, len: usize, val: T) -> Result<(), Error>
    where
        T: Clone,
    {
        self.try_reserve(len.saturating_sub(self.vec.len()))?;
        self.vec.resize(len, val);
        Ok(())
    }

    /// Removes everything, keeping the allocation.
    pub fn clear(&mut self) {
        self.vec.clear();
    }

    /// Keeps the first `len` elements.
    pub fn truncate(&mut self, len: usize) {
        self.vec.truncate(len);
    }

    /// Keeps only the elements for which `f` returns true.
    pub fn retain(&mut self, f: impl FnMut(&T) -> bool) {
        self.vec.retain(f);
    }

    /// Removes the last element.
    pub fn pop(&mut self) -> Option<T> {
        self.vec.pop()
    }

    /// Removes an element, putting the last one in its place.
    pub fn swap_remove(&mut self, idx: usize) -> T {
        self.vec.swap_remove(idx)
    }

    /// The number of elements there's room for without growing.
    pub fn capacity(&self) -> usize {
        self.vec.capacity()
    }

    /// The number of bytes this vector has taken out of its budget.
    pub fn charged(&self) -> usize {
        self.charged
    }

    /// The budget this vector charges.
    pub fn budget(&self) -> &Budget {
        &self.budget
    }
}

impl<T> Drop for TryVec<T> {
    fn drop(&mut self) {
        self.budget.refund(self.charged);
    }
}

impl<T: Clone> Clone for TryVec<T> {
    /// Clones the elements, charging the copy to the same budget.
    ///
    /// `Clone` can't fail, so if the budget is exhausted the copy is made
    /// anyway and left uncharged.
    fn clone(&self) -> Self {
        let bytes = self.vec.len().saturating_mul(std::mem::size_of::<T>());
        let charged = if self.budget.charge(bytes).is_ok() {
            bytes
        } else {
            0
        };
        let mut vec = Vec::with_capacity(self.vec.len());
        vec.extend_from_slice(&self.vec);
        TryVec {
            vec,
            charged,
            budget: self.budget.clone(),
        }
    }
}

impl<T> std::ops::Deref for TryVec<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.vec
    }
}

impl<T> std::ops::DerefMut for TryVec<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.vec
    }
}

impl<'a, T> IntoIterator for &'a TryVec<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.vec.iter()
    }
}

impl<T: PartialEq> PartialEq for TryVec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.vec == other.vec
    }
}

impl<T: Eq> Eq for TryVec<T> {}

impl<T: std::fmt::Debug> std::fmt::Debug for TryVec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.vec.iter()).finish()
    }
}

/// An index into a [`Pool`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolIdx(pub u32);

impl std::fmt::Debug for PoolIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "p_{}", self.0)
    }
}

/// A bump allocator for values of a single type.
///
/// The first `N` values live in an array embedded in the pool itself, so
/// small workloads never touch the heap. After that, values go into chunks
/// whose capacity doubles each time. [`Pool::reset`] forgets all values but
/// keeps the chunks around for reuse; dropping the pool releases everything
/// and refunds its budget.
///
/// Values are never freed individually (see [`Freelist`] for that).
#[derive(Debug)]
pub struct Pool<T, const N: usize> {
    embedded: ArrayVec<T, N>,
    chunks: TryVec<TryVec<T>>,
    /// The number of chunks that currently hold values. Chunks after this are
    /// empty and waiting to be reused.
    used_chunks: usize,
    len: usize,
    budget: Budget,
}

impl<T, const N: usize> Default for Pool<T, N> {
    fn default() -> Self {
        Self::new(Budget::unlimited())
    }
}

impl<T, const N: usize> Pool<T, N> {
    /// Creates an empty pool, charging heap growth to `budget`.
    pub fn new(budget: Budget) -> Self {
        assert!(N > 0, "pools need some embedded storage");
        Pool {
            embedded: ArrayVec::new(),
            chunks: TryVec::new(budget.clone()),
            used_chunks: 0,
            len: 0,
            budget,
        }
    }

    /// The number of values allocated since the last reset.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Has nothing been allocated since the last reset?
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The capacity of the `k`th heap chunk.
    fn chunk_capacity(k: usize) -> usize {
        N << (k + 1)
    }

    /// Finds the chunk and slot of a (non-embedded) index.
    ///
    /// Chunk `k` holds `2N * 2^k` values and starts `2N * (2^k - 1)` values
    /// after the end of the embedded array.
    fn locate(idx: usize) -> (usize, usize) {
        let offset = idx - N;
        let q = offset / (2 * N) + 1;
        let k = (usize::BITS - 1 - q.leading_zeros()) as usize;
        let start = 2 * N * ((1 << k) - 1);
        (k, offset - start)
    }

    /// Allocates a new value, returning its index.
    pub fn alloc(&mut self, val: T) -> Result<PoolIdx, Error> {
        let idx = self.len;
        let Ok(ret) = u32::try_from(idx) else {
            return Err(Error::NoMemory);
        };
        if idx < N {
            self.embedded.push(val);
        } else {
            let (k, slot) = Self::locate(idx);
            if slot == 0 {
                debug_assert_eq!(k, self.used_chunks);
                if k == self.chunks.len() {
                    let cap = Self::chunk_capacity(k);
                    log::trace!("growing pool to {} chunks of up to {cap} values", k + 1);
                    let chunk = TryVec::with_capacity(cap, self.budget.clone())?;
                    self.chunks.try_push(chunk)?;
                }
                self.used_chunks += 1;
            }
            // The chunk was created with room for all of its values.
            self.chunks[k].try_push(val)?;
        }
        self.len += 1;
        Ok(PoolIdx(ret))
    }

    /// Forgets every value, keeping the heap chunks for reuse.
    pub fn reset(&mut self) {
        self.embedded.clear();
        for chunk in &mut self.chunks[..self.used_chunks] {
            chunk.clear();
        }
        self.used_chunks = 0;
        self.len = 0;
    }

    /// The number of heap chunks owned by this pool, in use or not.
    pub fn num_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// The budget this pool charges.
    pub fn budget(&self) -> &Budget {
        &self.budget
    }
}

impl<T, const N: usize> std::ops::Index<PoolIdx> for Pool<T, N> {
    type Output = T;

    fn index(&self, idx: PoolIdx) -> &T {
        let idx = idx.0 as usize;
        debug_assert!(idx < self.len);
        if idx < N {
            &self.embedded[idx]
        } else {
            let (k, slot) = Self::locate(idx);
            &self.chunks[k][slot]
        }
    }
}

impl<T, const N: usize> std::ops::IndexMut<PoolIdx> for Pool<T, N> {
    fn index_mut(&mut self, idx: PoolIdx) -> &mut T {
        let idx = idx.0 as usize;
        debug_assert!(idx < self.len);
        if idx < N {
            &mut self.embedded[idx]
        } else {
            let (k, slot) = Self::locate(idx);
            &mut self.chunks[k][slot]
        }
    }
}

#[derive(Debug)]
enum Slot<T> {
    Used(T),
    Free(Option<PoolIdx>),
}

/// A [`Pool`] whose values can be freed and reused one at a time.
///
/// Freed slots are threaded onto an intrusive free list, so freeing and
/// reallocating never touches the heap.
#[derive(Debug)]
pub struct Freelist<T, const N: usize> {
    pool: Pool<Slot<T>, N>,
    free: Option<PoolIdx>,
    live: usize,
}

impl<T, const N: usize> Default for Freelist<T, N> {
    fn default() -> Self {
        Self::new(Budget::unlimited())
    }
}

impl<T, const N: usize> Freelist<T, N> {
    /// Creates an empty freelist, charging heap growth to `budget`.
    pub fn new(budget: Budget) -> Self {
        Freelist {
            pool: Pool::new(budget),
            free: None,
            live: 0,
        }
    }

    /// The number of values that are allocated and not yet freed.
    pub fn live(&self) -> usize {
        self.live
    }

    /// Allocates a value, reusing a freed slot if there is one.
    pub fn alloc(&mut self, val: T) -> Result<PoolIdx, Error> {
        let idx = match self.free {
            Some(idx) => {
                let Slot::Free(next) = self.pool[idx] else {
                    unreachable!("free list points at a live slot");
                };
                self.free = next;
                self.pool[idx] = Slot::Used(val);
                idx
            }
            None => self.pool.alloc(Slot::Used(val))?,
        };
        self.live += 1;
        Ok(idx)
    }

    /// Frees a value, returning it.
    ///
    /// Panics if `idx` was already freed.
    pub fn free(&mut self, idx: PoolIdx) -> T {
        let slot = std::mem::replace(&mut self.pool[idx], Slot::Free(self.free));
        self.free = Some(idx);
        self.live -= 1;
        match slot {
            Slot::Used(val) => val,
            Slot::Free(_) => panic!("double free of {idx:?}"),
        }
    }

    /// Frees everything at once.
    pub fn reset(&mut self) {
        self.pool.reset();
        self.free = None;
        self.live = 0;
    }
}

impl<T, const N: usize> std::ops::Index<PoolIdx> for Freelist<T, N> {
    type Output = T;

    fn index(&self, idx: PoolIdx) -> &T {
        match &self.pool[idx] {
            Slot::Used(val) => val,
            Slot::Free(_) => panic!("use after free of {idx:?}"),
        }
    }
}

impl<T, const N: usize> std::ops::IndexMut<PoolIdx> for Freelist<T, N> {
    fn index_mut(&mut self, idx: PoolIdx) -> &mut T {
        match &mut self.pool[idx] {
            Slot::Used(val) => val,
            Slot::Free(_) => panic!("use after free of {idx:?}"),
        }
    }
}

#[derive(Clone, Debug)]
enum Storage<T, const N: usize> {
    Embedded(ArrayVec<T, N>),
    Heap(TryVec<T>),
}

/// A growable array that starts out in embedded storage.
///
/// Once the `N` embedded slots are full, the contents move to the heap, and
/// from then on the capacity is multiplied by the array's growth factor
/// whenever it runs out.
#[derive(Clone, Debug)]
pub struct Growable<T, const N: usize> {
    storage: Storage<T, N>,
    growth: usize,
}

impl<T, const N: usize> Growable<T, N> {
    /// Creates an empty array that multiplies its capacity by `growth` (at
    /// least 2) when it fills up.
    pub fn new(growth: usize) -> Self {
        Growable {
            storage: Storage::Embedded(ArrayVec::new()),
            growth: growth.max(2),
        }
    }

    /// Appends a value, moving to (or growing) heap storage if necessary.
    ///
    /// The heap storage is charged to the `budget` that was passed when the
    /// array spilled, and refunded when the array is dropped.
    pub fn try_push(&mut self, val: T, budget: &Budget) -> Result<(), Error> {
        match &mut self.storage {
            Storage::Embedded(inline) => {
                if let Err(e) = inline.try_push(val) {
                    let mut heap = TryVec::with_capacity(N.max(1) * self.growth, budget.clone())?;
                    for v in inline.drain(..) {
                        heap.try_push(v)?;
                    }
                    heap.try_push(e.element())?;
                    self.storage = Storage::Heap(heap);
                }
            }
            Storage::Heap(heap) => {
                if heap.len() == heap.capacity() {
                    let additional = heap.capacity().max(1) * (self.growth - 1);
                    heap.try_reserve(additional)?;
                }
                heap.try_push(val)?;
            }
        }
        Ok(())
    }

    /// Removes everything, keeping any heap storage.
    pub fn clear(&mut self) {
        match &mut self.storage {
            Storage::Embedded(inline) => inline.clear(),
            Storage::Heap(heap) => heap.clear(),
        }
    }

    /// Has the array spilled onto the heap?
    pub fn is_spilled(&self) -> bool {
        matches!(self.storage, Storage::Heap(_))
    }

    /// The elements, as a slice.
    pub fn as_slice(&self) -> &[T] {
        match &self.storage {
            Storage::Embedded(inline) => inline.as_slice(),
            Storage::Heap(heap) => &heap[..],
        }
    }

    /// The elements, as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match &mut self.storage {
            Storage::Embedded(inline) => inline.as_mut_slice(),
            Storage::Heap(heap) => &mut heap[..],
        }
    }
}

impl<T, const N: usize> std::ops::Deref for Growable<T, N> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, const N: usize> std::ops::DerefMut for Growable<T, N> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn pool_locates_across_chunks() {
        let mut pool: Pool<usize, 3> = Pool::default();
        let idxs: Vec<_> = (0..100).map(|i| pool.alloc(i).unwrap()).collect();
        for (i, idx) in idxs.iter().enumerate() {
            assert_eq!(pool[*idx], i);
        }
        // 3 embedded, then chunks of 6, 12, 24, 48 and 96.
        assert_eq!(pool.num_chunks(), 5);
        pool[idxs[50]] = 1000;
        assert_eq!(pool[idxs[50]], 1000);
    }

    #[test]
    fn pool_reset_reuses_chunks() {
        let mut pool: Pool<u64, 4> = Pool::new(Budget::new(10_000));
        for i in 0..40 {
            pool.alloc(i).unwrap();
        }
        let chunks = pool.num_chunks();
        let remaining = pool.budget().remaining();
        pool.reset();
        assert!(pool.is_empty());
        for i in 0..40 {
            pool.alloc(i).unwrap();
        }
        assert_eq!(pool.num_chunks(), chunks);
        assert_eq!(pool.budget().remaining(), remaining);
    }

    #[test]
    fn embedded_allocations_are_free() {
        let mut pool: Pool<u64, 8> = Pool::new(Budget::new(0));
        for i in 0..8 {
            pool.alloc(i).unwrap();
        }
        assert_matches!(pool.alloc(8), Err(Error::NoMemory));
    }

    #[test]
    fn budget_is_shared() {
        let budget = Budget::new(100);
        let other = budget.clone();
        budget.charge(60).unwrap();
        assert_eq!(other.remaining(), Some(40));
        assert_matches!(other.charge(41), Err(Error::NoMemory));
        assert_eq!(budget.remaining(), Some(40));
        assert_eq!(Budget::unlimited().remaining(), None);
    }

    #[test]
    fn freelist_reuses_slots() {
        let mut list: Freelist<&str, 2> = Freelist::default();
        let a = list.alloc("a").unwrap();
        let b = list.alloc("b").unwrap();
        let c = list.alloc("c").unwrap();
        assert_eq!(list.free(b), "b");
        let d = list.alloc("d").unwrap();
        assert_eq!(d, b);
        assert_eq!(list[a], "a");
        assert_eq!(list[c], "c");
        assert_eq!(list[d], "d");
        assert_eq!(list.live(), 3);
    }

    #[test]
    #[should_panic]
    fn freelist_double_free() {
        let mut list: Freelist<u8, 2> = Freelist::default();
        let a = list.alloc(1).unwrap();
        list.free(a);
        list.free(a);
    }

    #[test]
    fn growable_spills() {
        let budget = Budget::unlimited();
        let mut arr: Growable<u32, 4> = Growable::new(4);
        for i in 0..4 {
            arr.try_push(i, &budget).unwrap();
        }
        assert!(!arr.is_spilled());
        arr.try_push(4, &budget).unwrap();
        assert!(arr.is_spilled());
        for i in 5..100 {
            arr.try_push(i, &budget).unwrap();
        }
        assert_eq!(arr.len(), 100);
        assert!(arr.iter().copied().eq(0..100));
    }

    #[test]
    fn growable_respects_budget() {
        let budget = Budget::new(4 * 4 * 4);
        let mut arr: Growable<u32, 4> = Growable::new(4);
        for i in 0..16 {
            arr.try_push(i, &budget).unwrap();
        }
        // The first spill reserved exactly 16 slots, using up the budget.
        assert_matches!(arr.try_push(100, &budget), Err(Error::NoMemory));
        assert_eq!(arr.len(), 16);
        drop(arr);
        assert_eq!(budget.remaining(), Some(64));
    }

    #[test]
    fn try_vec_refunds() {
        let budget = Budget::new(1000);
        let mut vec = TryVec::new(budget.clone());
        for i in 0..10u64 {
            vec.try_push(i).unwrap();
        }
        // Capacity went 4, 8, 16.
        assert_eq!(vec.charged(), 128);
        assert_eq!(budget.remaining(), Some(1000 - 128));
        let copy = vec.clone();
        assert_eq!(copy, vec);
        assert_eq!(budget.remaining(), Some(1000 - 128 - 80));
        drop(vec);
        drop(copy);
        assert_eq!(budget.remaining(), Some(1000));

        let mut big = TryVec::<u64>::new(budget.clone());
        assert_matches!(big.try_reserve(200), Err(Error::NoMemory));
        assert_eq!(big.charged(), 0);
        assert_eq!(budget.remaining(), Some(1000));
    }

    #[test]
    fn dropped_pools_refund() {
        let budget = Budget::new(10_000);
        for _ in 0..100 {
            let mut list: Freelist<u64, 4> = Freelist::new(budget.clone());
            for i in 0..50 {
                list.alloc(i).unwrap();
            }
            assert!(budget.remaining() < Some(10_000));
        }
        assert_eq!(budget.remaining(), Some(10_000));
    }
}
