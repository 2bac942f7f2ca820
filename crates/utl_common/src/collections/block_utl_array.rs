use core::{
    alloc::Layout,
    mem,
    ptr::{self, NonNull},
};
use std::alloc;
use utl_logging::{log_verbose, log_warning};

use crate::LOG_CAT;
use super::{ArrayError, imp::utl_array::{ArrayBuffer, GenericUtlArray, InitBuffer}};

/// Size in bytes a page of block storage aims for when no explicit grow size is given.
pub const BLOCK_PAGE_BYTES: usize = 4096;

/// Storage that allocates same-size pages on demand.
///
/// Growing only ever appends pages, so the elements in existing pages are never moved by a grow. The page length is
/// always a power of 2, turning the logical index into a page index and an offset with a shift and a mask.
pub struct BlockBuffer<T> {
    pages      : Vec<NonNull<T>>,
    page_len   : usize,
    page_shift : u32,
    grow_size  : usize,
}

impl<T> BlockBuffer<T> {
    const IS_ZST: bool = mem::size_of::<T>() == 0;

    pub fn new(grow_size: usize) -> Self {
        let page_len = Self::calc_page_len(grow_size);
        Self { pages: Vec::new(), page_len, page_shift: page_len.trailing_zeros(), grow_size }
    }

    /// Number of elements in a single page.
    pub fn page_len(&self) -> usize {
        self.page_len
    }

    fn calc_page_len(grow_size: usize) -> usize {
        if grow_size == 0 {
            let len = (BLOCK_PAGE_BYTES / mem::size_of::<T>().max(1)).max(1);
            // Round down to a power of 2
            1 << (usize::BITS - 1 - len.leading_zeros())
        } else {
            grow_size.checked_next_power_of_two().unwrap_or(1 << (usize::BITS - 1))
        }
    }

    fn page_layout(&self) -> Result<Layout, ArrayError> {
        Layout::array::<T>(self.page_len).map_err(|_| ArrayError::CapacityOverflow)
    }

    /// Allocate pages until there is room for `capacity` elements, either all pages get allocated, or none do.
    fn alloc_pages_for(&mut self, capacity: usize) -> Result<usize, ArrayError> {
        if Self::IS_ZST || capacity <= self.capacity() {
            return Ok(self.capacity());
        }

        // The pages together can't address more bytes than a single allocation could
        Layout::array::<T>(capacity).map_err(|_| ArrayError::CapacityOverflow)?;

        let layout = self.page_layout()?;
        let num_pages = capacity.div_ceil(self.page_len);
        let old_pages = self.pages.len();
        if self.pages.try_reserve(num_pages - old_pages).is_err() {
            let table_layout = Layout::array::<NonNull<T>>(num_pages).map_err(|_| ArrayError::CapacityOverflow)?;
            return Err(ArrayError::AllocError(table_layout));
        }

        while self.pages.len() < num_pages {
            match NonNull::new(unsafe { alloc::alloc(layout) }.cast::<T>()) {
                Some(page) => self.pages.push(page),
                None => {
                    self.release_pages(old_pages);
                    return Err(ArrayError::AllocError(layout));
                },
            }
        }

        log_verbose!(LOG_CAT, "Allocated {} page(s) of {} elements, {} page(s) in use", num_pages - old_pages, self.page_len, num_pages);
        Ok(self.capacity())
    }

    /// Release every page past the first `keep` pages.
    fn release_pages(&mut self, keep: usize) {
        if self.pages.len() <= keep {
            return;
        }

        // Pages only exist when the layout is valid
        if let Ok(layout) = self.page_layout() {
            let released = self.pages.len() - keep;
            for page in self.pages.drain(keep..) {
                unsafe { alloc::dealloc(page.as_ptr().cast(), layout) };
            }
            log_verbose!(LOG_CAT, "Released {} page(s) of {} elements", released, self.page_len);
        }
    }
}

unsafe impl<T> ArrayBuffer<T> for BlockBuffer<T> {
    const CONTIGUOUS: bool = false;

    fn capacity(&self) -> usize {
        if Self::IS_ZST {
            usize::MAX
        } else {
            self.pages.len() * self.page_len
        }
    }

    fn grow_size(&self) -> usize {
        self.grow_size
    }

    fn set_grow_size(&mut self, grow_size: usize) {
        if self.pages.is_empty() {
            self.grow_size = grow_size;
            self.page_len = Self::calc_page_len(grow_size);
            self.page_shift = self.page_len.trailing_zeros();
        } else {
            log_warning!(LOG_CAT, "Cannot change the page length of block storage with {} page(s) allocated, ignoring grow size {}", self.pages.len(), grow_size);
        }
    }

    fn try_grow(&mut self, num: usize) -> Result<usize, ArrayError> {
        if Self::IS_ZST {
            return Err(ArrayError::CapacityOverflow);
        }

        let required = self.capacity().checked_add(num).ok_or(ArrayError::CapacityOverflow)?;
        if required > isize::MAX as usize {
            return Err(ArrayError::CapacityOverflow);
        }
        self.alloc_pages_for(required)
    }

    fn try_ensure_capacity(&mut self, capacity: usize) -> Result<usize, ArrayError> {
        if !Self::IS_ZST && capacity > isize::MAX as usize {
            return Err(ArrayError::CapacityOverflow);
        }
        self.alloc_pages_for(capacity)
    }

    fn purge(&mut self) {
        self.release_pages(0);
        self.pages = Vec::new();
    }

    fn purge_to(&mut self, keep: usize) {
        self.release_pages(keep.div_ceil(self.page_len));
    }

    fn base(&self) -> Option<NonNull<T>> {
        None
    }

    fn segment_count(&self) -> usize {
        self.pages.len()
    }

    unsafe fn slot(&self, index: usize) -> *const T {
        if Self::IS_ZST {
            return NonNull::dangling().as_ptr();
        }
        self.pages.get_unchecked(index >> self.page_shift).as_ptr().add(index & (self.page_len - 1))
    }

    unsafe fn slot_mut(&mut self, index: usize) -> *mut T {
        if Self::IS_ZST {
            return NonNull::dangling().as_ptr();
        }
        self.pages.get_unchecked(index >> self.page_shift).as_ptr().add(index & (self.page_len - 1))
    }

    unsafe fn relocate(&mut self, src: usize, dst: usize, count: usize) {
        if Self::IS_ZST || count == 0 || src == dst {
            return;
        }

        // Move in runs that never cross a page boundary on either side
        let mask = self.page_len - 1;
        if dst > src {
            let mut remaining = count;
            while remaining > 0 {
                let src_end = src + remaining;
                let dst_end = dst + remaining;
                let run = remaining.min(((src_end - 1) & mask) + 1).min(((dst_end - 1) & mask) + 1);

                let s = self.slot_mut(src_end - run);
                let d = self.slot_mut(dst_end - run);
                ptr::copy(s, d, run);
                remaining -= run;
            }
        } else {
            let mut done = 0;
            while done < count {
                let s_idx = src + done;
                let d_idx = dst + done;
                let run = (count - done).min(self.page_len - (s_idx & mask)).min(self.page_len - (d_idx & mask));

                let s = self.slot_mut(s_idx);
                let d = self.slot_mut(d_idx);
                ptr::copy(s, d, run);
                done += run;
            }
        }
    }
}

impl<T> InitBuffer<T> for BlockBuffer<T> {
    fn with_grow_size(grow_size: usize) -> Self {
        Self::new(grow_size)
    }
}

impl<T> Drop for BlockBuffer<T> {
    fn drop(&mut self) {
        self.release_pages(0);
    }
}

// The buffer uniquely owns its pages
unsafe impl<T: Send> Send for BlockBuffer<T> {}
unsafe impl<T: Sync> Sync for BlockBuffer<T> {}

//------------------------------------------------------------------------------------------------------------------------------

/// Growable array that stores its elements in same-size pages.
///
/// The grow size is the page length, rounded up to a power of 2. When the grow size is 0, pages are sized to fill
/// [`BLOCK_PAGE_BYTES`]. The storage is never contiguous, so [`base`](GenericUtlArray::base) and
/// [`as_slice`](GenericUtlArray::as_slice) return `None`.
pub type BlockUtlArray<T> = GenericUtlArray<T, BlockBuffer<T>>;
