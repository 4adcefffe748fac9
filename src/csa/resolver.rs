//! Batch address resolution
//!
//! A batch binds its addressing mode once, at construction. Every lookup after
//! that goes through `resolve`/`resolve_mut` without the caller branching on
//! the mode.

use crate::types::{Addressing, Real};

/// Read-only side of a batch (the `A` operands)
#[derive(Debug, Clone)]
pub enum BatchRef<'a> {
    /// All elements in one allocation, `offset` apart
    Strided { data: &'a [Real], offset: usize },
    /// One slice per element
    Indirect { elements: Vec<&'a [Real]> },
}

/// Mutable side of a batch (the `B` operands)
#[derive(Debug)]
pub enum BatchMut<'a> {
    /// All elements in one allocation, `offset` apart
    Strided { data: &'a mut [Real], offset: usize },
    /// One slice per element, pairwise disjoint by construction
    Indirect { elements: Vec<&'a mut [Real]> },
}

impl<'a> BatchRef<'a> {
    pub fn strided(data: &'a [Real], offset: usize) -> Self {
        BatchRef::Strided { data, offset }
    }

    pub fn indirect(elements: Vec<&'a [Real]>) -> Self {
        BatchRef::Indirect { elements }
    }

    /// Indirect batch over `count` chunks of `data`, `offset` apart
    pub fn indirect_from_chunks(data: &'a [Real], offset: usize, count: usize) -> Self {
        let elements = (0..count).map(|index| &data[index * offset..]).collect();
        BatchRef::Indirect { elements }
    }

    pub fn addressing(&self) -> Addressing {
        match self {
            BatchRef::Strided { .. } => Addressing::Strided,
            BatchRef::Indirect { .. } => Addressing::Indirect,
        }
    }

    /// Storage of element `index`, starting at its base
    #[inline]
    pub fn resolve(&self, index: usize) -> &'a [Real] {
        match *self {
            BatchRef::Strided { data, offset } => &data[index * offset..],
            BatchRef::Indirect { ref elements } => elements[index],
        }
    }
}

impl<'a> BatchMut<'a> {
    pub fn strided(data: &'a mut [Real], offset: usize) -> Self {
        BatchMut::Strided { data, offset }
    }

    pub fn indirect(elements: Vec<&'a mut [Real]>) -> Self {
        BatchMut::Indirect { elements }
    }

    /// Indirect batch over the first `count` chunks of `data`.
    ///
    /// `offset` must be non-zero; the chunks are disjoint.
    pub fn indirect_from_chunks(data: &'a mut [Real], offset: usize, count: usize) -> Self {
        let elements = data.chunks_mut(offset).take(count).collect();
        BatchMut::Indirect { elements }
    }

    pub fn addressing(&self) -> Addressing {
        match self {
            BatchMut::Strided { .. } => Addressing::Strided,
            BatchMut::Indirect { .. } => Addressing::Indirect,
        }
    }

    /// Mutable storage of element `index`, starting at its base
    #[inline]
    pub fn resolve_mut(&mut self, index: usize) -> &mut [Real] {
        match self {
            BatchMut::Strided { data, offset } => &mut data[index * *offset..],
            BatchMut::Indirect { elements } => &mut *elements[index],
        }
    }
}

/// Offset-based resolver used by device kernels, where every batch lives in
/// one flat buffer and an element's base is an index into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceAddressing {
    /// Element `i` starts `first + i * offset` values into its buffer
    Strided {
        first_a: usize,
        first_b: usize,
        offset_a: usize,
        offset_b: usize,
    },
    /// Per-element base indices into the A and B buffers
    Indirect { bases_a: Vec<u32>, bases_b: Vec<u32> },
}

impl DeviceAddressing {
    /// Strided addressing with blocks at the start of every slot
    pub fn strided(offset_a: usize, offset_b: usize) -> Self {
        DeviceAddressing::Strided {
            first_a: 0,
            first_b: 0,
            offset_a,
            offset_b,
        }
    }

    pub fn addressing(&self) -> Addressing {
        match self {
            DeviceAddressing::Strided { .. } => Addressing::Strided,
            DeviceAddressing::Indirect { .. } => Addressing::Indirect,
        }
    }

    /// Base indices of the A and B operands of element `index`
    #[inline]
    pub fn resolve(&self, index: usize) -> (usize, usize) {
        match self {
            DeviceAddressing::Strided {
                first_a,
                first_b,
                offset_a,
                offset_b,
            } => (first_a + index * offset_a, first_b + index * offset_b),
            DeviceAddressing::Indirect { bases_a, bases_b } => {
                (bases_a[index] as usize, bases_b[index] as usize)
            }
        }
    }
}
