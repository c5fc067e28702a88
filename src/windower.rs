use crate::{error::ToeholdError, sequence::Sequence};

/// A fixed-length slice of a [`Sequence`] and its start offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window<'a> {
    offset: usize,
    bases: &'a str,
}

impl<'a> Window<'a> {
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline(always)]
    pub fn bases(&self) -> &'a str {
        self.bases
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}

/// Every window of length `window`, one per start offset `0..=len - window`.
pub fn split_windows(sequence: &Sequence, window: usize) -> Result<Vec<Window<'_>>, ToeholdError> {
    let bases = sequence.as_str();
    if window == 0 || window > bases.len() {
        return Err(ToeholdError::InvalidWindow {
            window,
            sequence_length: bases.len(),
        });
    }
    // Sequences are ASCII, so byte offsets are base offsets
    Ok((0..=bases.len() - window)
        .map(|offset| Window {
            offset,
            bases: &bases[offset..offset + window],
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_count_and_offsets() {
        let seq = Sequence::new("AUGCGAUCGAUCGAUGCUAC").unwrap();
        for window in 1..=seq.len() {
            let windows = split_windows(&seq, window).unwrap();
            assert_eq!(windows.len(), seq.len() - window + 1);
            for w in &windows {
                assert_eq!(w.len(), window);
                assert_eq!(w.bases(), &seq.as_str()[w.offset()..w.offset() + window]);
            }
        }
    }

    #[test]
    fn test_window_of_full_length() {
        let seq = Sequence::new("ACGU").unwrap();
        let windows = split_windows(&seq, 4).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].offset(), 0);
        assert_eq!(windows[0].bases(), "ACGU");
    }

    #[test]
    fn test_invalid_windows() {
        let seq = Sequence::new("ACGU").unwrap();
        assert_eq!(
            split_windows(&seq, 0),
            Err(ToeholdError::InvalidWindow {
                window: 0,
                sequence_length: 4
            })
        );
        assert!(split_windows(&seq, 5).is_err());
    }
}
