//! Planning of the execution block ranges to dump.

use std::fmt;

use crate::error::DumpError;

/// An inclusive range of execution block numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    /// The first block
    pub start: u64,
    /// The last block, inclusive
    pub end: u64,
}

impl BlockRange {
    /// Creates the range `[start, end]`.
    ///
    /// # Errors
    /// Returns [`DumpError::InvalidConfig`] if `start > end`.
    pub fn new(start: u64, end: u64) -> Result<Self, DumpError> {
        if start > end {
            return Err(DumpError::InvalidConfig(format!(
                "block range start {start} is after its end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// The number of blocks in the range.
    #[must_use]
    pub const fn block_count(&self) -> u64 {
        (self.end - self.start).saturating_add(1)
    }

    /// The name of the file the range is dumped to.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("execution_blocks_{}_{}.json", self.start, self.end)
    }

    /// Splits the range into consecutive chunks of at most `size` blocks.
    pub fn chunks(&self, size: u64) -> impl Iterator<Item = Self> {
        let end = self.end;
        let size = size.max(1);
        let step = usize::try_from(size).unwrap_or(usize::MAX);
        (self.start..=end).step_by(step).map(move |start| Self {
            start,
            end: start.saturating_add(size - 1).min(end),
        })
    }
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Plans the block ranges between the finalized execution blocks of consecutive periods.
///
/// `numbers` are the block numbers of consecutive periods, oldest first. The first range spans
/// `numbers[0]..=numbers[1]`, each following one starts right after the end of the previous.
///
/// # Errors
/// Returns [`DumpError::Decode`] if `numbers` is not strictly ascending.
pub fn plan_block_ranges(numbers: &[u64]) -> Result<Vec<BlockRange>, DumpError> {
    if let Some(pair) = numbers.windows(2).find(|pair| pair[0] >= pair[1]) {
        return Err(DumpError::decode(
            "finalized execution blocks",
            format!("block numbers are not ascending: {} then {}", pair[0], pair[1]),
        ));
    }

    Ok(numbers
        .windows(2)
        .enumerate()
        .map(|(i, pair)| BlockRange {
            start: if i == 0 { pair[0] } else { pair[0] + 1 },
            end: pair[1],
        })
        .collect())
}

/// The blocks within `window` of `anchor`, clipped at block 0.
#[must_use]
pub const fn surrounding_window(anchor: u64, window: u64) -> BlockRange {
    BlockRange {
        start: anchor.saturating_sub(window),
        end: anchor.saturating_add(window),
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_plan_block_ranges() {
        assert_eq!(
            vec![
                BlockRange { start: 100, end: 200 },
                BlockRange { start: 201, end: 350 },
            ],
            plan_block_ranges(&[100, 200, 350]).unwrap()
        );
        assert!(plan_block_ranges(&[100]).unwrap().is_empty());
        assert!(plan_block_ranges(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_plan_rejects_unordered_numbers() {
        assert!(matches!(
            plan_block_ranges(&[200, 100, 350]),
            Err(DumpError::Decode { .. })
        ));
        assert!(plan_block_ranges(&[100, 100]).is_err());
    }

    #[rstest]
    #[case(100, 50, 50, 150)]
    #[case(10, 50, 0, 60)]
    #[case(0, 0, 0, 0)]
    #[case(u64::MAX - 1, 5, u64::MAX - 6, u64::MAX)]
    fn test_surrounding_window(
        #[case] anchor: u64,
        #[case] window: u64,
        #[case] start: u64,
        #[case] end: u64,
    ) {
        assert_eq!(BlockRange { start, end }, surrounding_window(anchor, window));
    }

    #[test]
    fn test_block_range() {
        let range = BlockRange::new(100, 109).unwrap();
        assert_eq!(10, range.block_count());
        assert_eq!("execution_blocks_100_109.json", range.file_name());
        assert_eq!("100..=109", range.to_string());
        assert!(BlockRange::new(5, 4).is_err());
        assert_eq!(1, BlockRange::new(4, 4).unwrap().block_count());
    }

    #[test]
    fn test_chunks() {
        let chunks: Vec<_> = BlockRange::new(100, 109).unwrap().chunks(4).collect();
        assert_eq!(
            vec![
                BlockRange { start: 100, end: 103 },
                BlockRange { start: 104, end: 107 },
                BlockRange { start: 108, end: 109 },
            ],
            chunks
        );
    }
}
