// file: src/pipeline/batcher.rs
// description: groups data rows into fixed-size, order-preserving batches
// reference: slice chunking over borrowed rows

use crate::models::DataRow;
use std::iter::FusedIterator;
use std::num::NonZeroUsize;
use std::slice::Chunks;

/// A contiguous view of rows sent to the oracle in one round-trip.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    index: usize,
    offset: usize,
    rows: &'a [DataRow],
}

impl<'a> Batch<'a> {
    pub fn new(index: usize, offset: usize, rows: &'a [DataRow]) -> Self {
        Self {
            index,
            offset,
            rows,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Position of the first row within the document, zero based.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn rows(&self) -> &'a [DataRow] {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Field count of the batch, taken from its first row.
    pub fn width(&self) -> usize {
        self.rows.first().map(DataRow::len).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Batcher {
    size: NonZeroUsize,
}

impl Batcher {
    pub fn new(size: NonZeroUsize) -> Self {
        Self { size }
    }

    pub fn size(&self) -> usize {
        self.size.get()
    }

    pub fn batch<'a>(&self, rows: &'a [DataRow]) -> Batches<'a> {
        Batches {
            chunks: rows.chunks(self.size.get()),
            size: self.size.get(),
            next_index: 0,
        }
    }

    pub fn batch_count(&self, rows: usize) -> usize {
        rows.div_ceil(self.size.get())
    }
}

/// One-pass iterator over the batches of a row slice.
#[derive(Debug)]
pub struct Batches<'a> {
    chunks: Chunks<'a, DataRow>,
    size: usize,
    next_index: usize,
}

impl<'a> Iterator for Batches<'a> {
    type Item = Batch<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rows = self.chunks.next()?;
        let index = self.next_index;
        self.next_index += 1;
        Some(Batch::new(index, index * self.size, rows))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for Batches<'_> {}

impl FusedIterator for Batches<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(count: usize) -> Vec<DataRow> {
        (0..count)
            .map(|i| DataRow::from(vec![format!("name{}", i), format!("user{}@example.com", i)]))
            .collect()
    }

    fn batcher(size: usize) -> Batcher {
        Batcher::new(NonZeroUsize::new(size).unwrap())
    }

    #[test]
    fn test_batch_coverage() {
        for total in 0..40 {
            for size in 1..12 {
                let data = rows(total);
                let batches: Vec<Batch<'_>> = batcher(size).batch(&data).collect();

                assert_eq!(batches.len(), total.div_ceil(size));
                assert_eq!(batches.iter().map(Batch::len).sum::<usize>(), total);
                assert!(batches.iter().all(|b| !b.is_empty()));

                let short = batches.iter().filter(|b| b.len() < size).count();
                assert!(short <= 1);
                if let Some((last, init)) = batches.split_last() {
                    assert!(init.iter().all(|b| b.len() == size));
                    let expected_last = if total % size == 0 { size } else { total % size };
                    assert_eq!(last.len(), expected_last);
                }
            }
        }
    }

    #[test]
    fn test_batches_preserve_order() {
        let data = rows(7);
        let flattened: Vec<&DataRow> = batcher(3)
            .batch(&data)
            .flat_map(|b| b.rows().iter())
            .collect();

        assert_eq!(flattened, data.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_batch_index_and_offset() {
        let data = rows(5);
        let batches: Vec<Batch<'_>> = batcher(2).batch(&data).collect();

        assert_eq!(
            batches.iter().map(|b| (b.index(), b.offset())).collect::<Vec<_>>(),
            vec![(0, 0), (1, 2), (2, 4)]
        );
        assert_eq!(batches[0].width(), 2);
    }

    #[test]
    fn test_empty_rows_yield_no_batches() {
        let data: Vec<DataRow> = Vec::new();
        let mut batches = batcher(4).batch(&data);

        assert_eq!(batches.len(), 0);
        assert!(batches.next().is_none());
        assert_eq!(batcher(4).batch_count(0), 0);
    }

    #[test]
    fn test_exact_size() {
        let data = rows(10);
        let batches = batcher(3).batch(&data);
        assert_eq!(batches.len(), 4);
        assert_eq!(batcher(3).batch_count(10), 4);
    }
}
