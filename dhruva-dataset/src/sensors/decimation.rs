//! Keep-one-out-of-k cloud decimation.
//!
//! Clouds arrive at the sensor rate; only every k-th one becomes a scan.
//! Surviving clouds are assigned consecutive scan indices starting at 0.
//!
//! ```text
//! k = 3
//! position:  0  1  2  3  4  5  6  7  8  9
//! kept:      ✓        ✓        ✓        ✓
//! index:     0        1        2        3
//! ```

/// Counts incoming clouds and hands out scan indices to the survivors.
#[derive(Debug, Clone)]
pub struct Decimator {
    keep_one_out_of: usize,
    position: usize,
    next_index: usize,
}

impl Decimator {
    /// Create a decimator keeping one of every `keep_one_out_of` clouds.
    ///
    /// A value of 0 is treated as 1 (keep everything).
    pub fn new(keep_one_out_of: usize) -> Self {
        Self {
            keep_one_out_of: keep_one_out_of.max(1),
            position: 0,
            next_index: 0,
        }
    }

    /// Register one incoming cloud.
    ///
    /// Returns the scan index if the cloud is kept, `None` if it is dropped.
    pub fn offer(&mut self) -> Option<usize> {
        let keep = self.position % self.keep_one_out_of == 0;
        self.position += 1;
        if keep {
            let index = self.next_index;
            self.next_index += 1;
            Some(index)
        } else {
            None
        }
    }

    /// Number of clouds offered so far.
    pub fn seen(&self) -> usize {
        self.position
    }

    /// Number of clouds kept so far.
    pub fn kept(&self) -> usize {
        self.next_index
    }

    pub fn keep_one_out_of(&self) -> usize {
        self.keep_one_out_of
    }
}
