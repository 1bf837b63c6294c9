//! Identity allocation for new villas.

use villa_id::{IdError, VillaId};

/// Next id after the largest of `existing`, or [`VillaId::FIRST`] when empty.
///
/// Fails only when the largest id is `i64::MAX`.
pub fn next_id<I>(existing: I) -> Result<VillaId, IdError>
where
    I: IntoIterator<Item = VillaId>,
{
    match existing.into_iter().max() {
        Some(max) => max.next(),
        None => Ok(VillaId::FIRST),
    }
}

/// Allocator that never hands out an id twice.
///
/// `next_id` alone would reissue the id of the most recently created villa
/// once it is deleted. The allocator remembers the highest id it has issued
/// and allocates above both that mark and the current contents.
///
/// Not synchronized: callers hold it under the same lock as the collection
/// they allocate for.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    last_issued: Option<VillaId>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id for a collection holding `existing`.
    pub fn allocate<I>(&mut self, existing: I) -> Result<VillaId, IdError>
    where
        I: IntoIterator<Item = VillaId>,
    {
        let id = next_id(existing.into_iter().chain(self.last_issued))?;
        self.last_issued = Some(id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: i64) -> VillaId {
        VillaId::new(raw).unwrap()
    }

    #[test]
    fn test_next_id_empty_is_one() {
        assert_eq!(next_id(std::iter::empty()).unwrap(), VillaId::FIRST);
    }

    #[test]
    fn test_next_id_is_max_plus_one() {
        assert_eq!(next_id([id(3), id(1), id(7)]).unwrap(), id(8));
    }

    #[test]
    fn test_next_id_does_not_fill_gaps() {
        assert_eq!(next_id([id(1), id(5)]).unwrap(), id(6));
    }

    #[test]
    fn test_next_id_after_max_is_exhausted() {
        assert_eq!(
            next_id([id(1), id(i64::MAX)]),
            Err(IdError::Exhausted(i64::MAX))
        );
    }

    #[test]
    fn test_allocator_sequence() {
        let mut allocator = IdAllocator::new();
        assert_eq!(allocator.allocate(std::iter::empty()).unwrap(), id(1));
        assert_eq!(allocator.allocate([id(1)]).unwrap(), id(2));
        assert_eq!(allocator.allocate([id(1), id(2)]).unwrap(), id(3));
    }

    #[test]
    fn test_allocator_does_not_reuse_deleted_max() {
        let mut allocator = IdAllocator::new();
        let first = allocator.allocate(std::iter::empty()).unwrap();
        // The villa holding `first` was deleted; the collection is empty again.
        let second = allocator.allocate(std::iter::empty()).unwrap();
        assert_eq!(first, id(1));
        assert_eq!(second, id(2));
    }

    #[test]
    fn test_allocator_respects_preloaded_ids() {
        let mut allocator = IdAllocator::new();
        assert_eq!(allocator.allocate([id(1), id(2)]).unwrap(), id(3));
    }

    #[test]
    fn test_failed_allocation_keeps_mark() {
        let mut allocator = IdAllocator::new();
        assert!(allocator.allocate([id(i64::MAX)]).is_err());
        assert_eq!(allocator.allocate(std::iter::empty()).unwrap(), id(1));
    }
}
