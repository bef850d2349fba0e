//! Best-fit heap with segment splitting and full coalescing
//!
//! The heap region is a fixed byte array carved into contiguous segments. Each
//! segment is described by a record in an arena (addressed by [`SegmentId`]) that
//! stores the byte offset of its header, its payload length, a free flag and the
//! link to the next segment in address order. Header bytes are accounted for
//! inside the region exactly as if they were stored in place:
//!
//! ```text
//! offset 0
//! | hdr | payload (length) | hdr | payload (length) | ... | hdr | payload |
//!       ^ address returned by alloc
//! ```
//!
//! # Invariants
//!
//! - The sum of `SEGMENT_HEADER_SIZE + length` over the list equals the capacity.
//! - Segments are linked in strictly increasing offset order.
//! - After every [`Heap::free`], no two neighbouring segments are both free.
//!
//! Records that disappear while coalescing are kept on a vacant list and reused
//! by the next split.

use super::Address;
use crate::kernel::constants::{
    HEAP_ADDRESS_START, HEAP_ALIGN, MIN_SPLIT_PAYLOAD, SEGMENT_HEADER_SIZE,
};
use crate::kernel::errors::{KernelError, KernelResult};
use log::trace;

/// Index of a segment record in the arena
pub type SegmentId = usize;

/// A segment record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub offset: usize, // Header position inside the region
    pub length: usize, // Payload bytes, header excluded
    pub is_free: bool,
    pub link: Option<SegmentId>,
}

/// Public view of a segment, in address order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentInfo {
    pub address: Address, // Payload address
    pub offset: usize,
    pub length: usize,
    pub is_free: bool,
}

/// The heap region
#[derive(Debug, Clone)]
pub struct Heap {
    data: Box<[u8]>,
    segments: Vec<Segment>,
    head: SegmentId,
    vacant: Vec<SegmentId>,
}

impl Heap {
    pub fn new(capacity: usize) -> Self {
        let mut heap = Heap {
            data: vec![0; capacity].into_boxed_slice(),
            segments: Vec::new(),
            head: 0,
            vacant: Vec::new(),
        };
        heap.init();
        heap
    }

    /// Install a single free segment spanning the whole region
    pub fn init(&mut self) {
        self.segments.clear();
        self.vacant.clear();
        self.segments.push(Segment {
            offset: 0,
            length: self.data.len().saturating_sub(SEGMENT_HEADER_SIZE),
            is_free: true,
            link: None,
        });
        self.head = 0;
    }

    /// Allocate `size` bytes (rounded up to 4) from the smallest free segment that fits
    pub fn alloc(&mut self, size: usize) -> KernelResult<Address> {
        if size == 0 {
            return Err(KernelError::ZeroSizeAllocation);
        }

        let size = align_up(size).ok_or(KernelError::HeapExhausted { requested: size })?;
        let best = self
            .best_fit(size)
            .ok_or(KernelError::HeapExhausted { requested: size })?;

        let chosen = self.segments[best];
        if chosen.length >= size + SEGMENT_HEADER_SIZE + MIN_SPLIT_PAYLOAD {
            let remainder = Segment {
                offset: chosen.offset + SEGMENT_HEADER_SIZE + size,
                length: chosen.length - size - SEGMENT_HEADER_SIZE,
                is_free: true,
                link: chosen.link,
            };
            let split = self.insert_record(remainder);

            let seg = &mut self.segments[best];
            seg.length = size;
            seg.link = Some(split);
            trace!(
                "heap: split segment at +{:#x}, {} bytes left over",
                chosen.offset,
                remainder.length
            );
        }

        self.segments[best].is_free = false;
        Ok(self.payload_address(best))
    }

    /// Release a block returned by [`Heap::alloc`]
    ///
    /// `None` is a no-op. Any address that is not the payload of an in-use
    /// segment (including a block that was already freed) is rejected without
    /// touching the segment list.
    pub fn free(&mut self, ptr: Option<Address>) -> KernelResult<()> {
        let Some(addr) = ptr else {
            return Ok(());
        };

        let id = self
            .find_in_use(addr)
            .ok_or(KernelError::InvalidFree { address: addr })?;
        self.segments[id].is_free = true;
        self.coalesce();
        Ok(())
    }

    /// Merge every run of neighbouring free segments, walking the whole list
    fn coalesce(&mut self) {
        let mut node = Some(self.head);
        while let Some(id) = node {
            let Some(next) = self.segments[id].link else {
                break;
            };

            if self.segments[id].is_free && self.segments[next].is_free {
                let absorbed = self.segments[next];
                let seg = &mut self.segments[id];
                seg.length += SEGMENT_HEADER_SIZE + absorbed.length;
                seg.link = absorbed.link;
                self.vacant.push(next);
                trace!("heap: merged segment at +{:#x}", absorbed.offset);
                // stay on `id`, the new neighbour may be free too
            } else {
                node = Some(next);
            }
        }
    }

    fn best_fit(&self, size: usize) -> Option<SegmentId> {
        let mut best: Option<SegmentId> = None;
        for id in self.chain() {
            let seg = &self.segments[id];
            if !seg.is_free || seg.length < size {
                continue;
            }
            if best.map_or(true, |b| seg.length < self.segments[b].length) {
                best = Some(id);
            }
            if seg.length == size {
                break;
            }
        }
        best
    }

    fn insert_record(&mut self, segment: Segment) -> SegmentId {
        match self.vacant.pop() {
            Some(id) => {
                self.segments[id] = segment;
                id
            }
            None => {
                self.segments.push(segment);
                self.segments.len() - 1
            }
        }
    }

    fn find_in_use(&self, addr: Address) -> Option<SegmentId> {
        self.chain()
            .find(|&id| !self.segments[id].is_free && self.payload_address(id) == addr)
    }

    fn payload_address(&self, id: SegmentId) -> Address {
        HEAP_ADDRESS_START + (self.segments[id].offset + SEGMENT_HEADER_SIZE) as u64
    }

    /// Segment ids in address order
    fn chain(&self) -> Chain<'_> {
        Chain {
            segments: &self.segments,
            next: Some(self.head),
        }
    }

    /// All segments in address order
    pub fn segments(&self) -> impl Iterator<Item = SegmentInfo> + '_ {
        self.chain().map(move |id| {
            let seg = &self.segments[id];
            SegmentInfo {
                address: self.payload_address(id),
                offset: seg.offset,
                length: seg.length,
                is_free: seg.is_free,
            }
        })
    }

    pub fn segment_count(&self) -> usize {
        self.chain().count()
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Sum of header size plus length over every segment; always equals the capacity
    pub fn accounted_bytes(&self) -> usize {
        self.segments()
            .map(|s| SEGMENT_HEADER_SIZE + s.length)
            .sum()
    }

    /// Payload bytes held by free segments
    pub fn free_bytes(&self) -> usize {
        self.segments()
            .filter(|s| s.is_free)
            .map(|s| s.length)
            .sum()
    }

    /// Payload bytes handed out
    pub fn used_bytes(&self) -> usize {
        self.segments()
            .filter(|s| !s.is_free)
            .map(|s| s.length)
            .sum()
    }

    /// Largest request that would currently succeed
    pub fn largest_free(&self) -> usize {
        self.segments()
            .filter(|s| s.is_free)
            .map(|s| s.length)
            .max()
            .unwrap_or(0)
    }

    /// Payload size of the in-use block at `addr`
    pub fn block_size(&self, addr: Address) -> Option<usize> {
        self.find_in_use(addr).map(|id| self.segments[id].length)
    }

    pub fn is_allocated(&self, addr: Address) -> bool {
        self.find_in_use(addr).is_some()
    }

    /// Write bytes inside a single in-use block
    pub fn write_bytes(&mut self, addr: Address, bytes: &[u8]) -> KernelResult<()> {
        let offset = self.data_offset(addr, bytes.len())?;
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Read bytes inside a single in-use block
    pub fn read_bytes(&self, addr: Address, len: usize) -> KernelResult<&[u8]> {
        let offset = self.data_offset(addr, len)?;
        Ok(&self.data[offset..offset + len])
    }

    fn data_offset(&self, addr: Address, len: usize) -> KernelResult<usize> {
        self.segments()
            .filter(|s| !s.is_free)
            .find(|s| {
                let end = s.address + s.length as u64;
                addr >= s.address && addr.saturating_add(len as u64) <= end
            })
            .map(|s| s.offset + SEGMENT_HEADER_SIZE + (addr - s.address) as usize)
            .ok_or(KernelError::OutOfBounds { address: addr, len })
    }
}

struct Chain<'a> {
    segments: &'a [Segment],
    next: Option<SegmentId>,
}

impl Iterator for Chain<'_> {
    type Item = SegmentId;

    fn next(&mut self) -> Option<SegmentId> {
        let id = self.next?;
        self.next = self.segments[id].link;
        Some(id)
    }
}

fn align_up(size: usize) -> Option<usize> {
    size.checked_add(HEAP_ALIGN - 1)
        .map(|v| v & !(HEAP_ALIGN - 1))
}
