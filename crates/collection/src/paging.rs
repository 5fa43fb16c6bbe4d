use crate::CollectionError;

pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub index: usize,
    pub page_count: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

/// Cuts the visible window out of an ordered sequence.
///
/// An index past the end is not corrected; it yields an empty window with
/// `has_next == false`.
pub fn slice<T>(
    items: &[T],
    page_size: usize,
    page_index: usize,
) -> Result<Page<'_, T>, CollectionError> {
    let page_count = page_count(items.len(), page_size)?;
    let start = page_index.saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    Ok(Page {
        items: &items[start..end],
        index: page_index,
        page_count,
        has_prev: page_index > 0,
        has_next: page_index.saturating_add(1) < page_count,
    })
}

pub fn page_count(total: usize, page_size: usize) -> Result<usize, CollectionError> {
    validate_page_size(page_size)?;
    Ok(total.div_ceil(page_size))
}

/// Page index that keeps the first visible row in view after a size change.
pub fn rebase_index(
    page_index: usize,
    old_size: usize,
    new_size: usize,
) -> Result<usize, CollectionError> {
    validate_page_size(old_size)?;
    validate_page_size(new_size)?;
    Ok(page_index.saturating_mul(old_size) / new_size)
}

pub fn validate_page_size(page_size: usize) -> Result<(), CollectionError> {
    if page_size == 0 {
        return Err(CollectionError::configuration("page size must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{page_count, rebase_index, slice};
    use crate::CollectionError;

    #[test]
    fn first_page_of_many() {
        let items: Vec<u32> = (0..25).collect();
        let page = slice(&items, 10, 0).unwrap();
        assert_eq!(page.items.len(), 10);
        assert!(page.has_next);
        assert!(!page.has_prev);
        assert_eq!(page.page_count, 3);
    }

    #[test]
    fn last_page_is_partial() {
        let items: Vec<u32> = (0..25).collect();
        let page = slice(&items, 10, 2).unwrap();
        assert_eq!(page.items, &[20, 21, 22, 23, 24]);
        assert!(!page.has_next);
        assert!(page.has_prev);
    }

    #[test]
    fn index_past_the_end_is_empty() {
        let items: Vec<u32> = (0..5).collect();
        let page = slice(&items, 10, 3).unwrap();
        assert!(page.items.is_empty());
        assert!(page.has_prev);
        assert!(!page.has_next);
    }

    #[test]
    fn empty_sequence_has_no_pages() {
        let items: Vec<u32> = Vec::new();
        let page = slice(&items, 10, 0).unwrap();
        assert_eq!(page.page_count, 0);
        assert!(!page.has_next);
        assert!(!page.has_prev);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let items = [1, 2, 3];
        assert!(matches!(
            slice(&items, 0, 0),
            Err(CollectionError::Configuration(_))
        ));
        assert!(page_count(3, 0).is_err());
        assert!(rebase_index(1, 10, 0).is_err());
    }

    #[test]
    fn page_size_change_keeps_start_offset() {
        assert_eq!(rebase_index(2, 10, 25).unwrap(), 0);
        assert_eq!(rebase_index(3, 10, 25).unwrap(), 1);
        assert_eq!(rebase_index(1, 100, 10).unwrap(), 10);
        assert_eq!(rebase_index(0, 100, 7).unwrap(), 0);
    }
}
