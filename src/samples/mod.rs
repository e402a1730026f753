//! The fixed table of sample images the harness classifies.

mod builtin;
mod mnist;

pub use builtin::DIGITS;
pub use mnist::{read_idx_labels, IdxImages};

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub const IMAGE_SIDE: usize = 28;
pub const IMAGE_LEN: usize = IMAGE_SIDE * IMAGE_SIDE;
pub const NUM_CLASSES: usize = 10;

/// A 28x28 grayscale image, row-major.
pub type Image = [u8; IMAGE_LEN];
/// Ground-truth class of an [`Image`], in `0..=9`.
pub type Label = u8;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("sample table is empty")]
    Empty,
    #[error("sample table holds {0} samples, at most 10 are supported")]
    TooMany(usize),
    #[error("{images} images but {labels} labels")]
    LengthMismatch { images: usize, labels: usize },
    #[error("label {label} at index {index} is outside 0..=9")]
    InvalidLabel { index: usize, label: u8 },
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("'{}': expected magic {expected:#010x}, found {found:#010x}", path.display())]
    BadMagic { path: PathBuf, expected: u32, found: u32 },
    #[error("'{}': images are {rows}x{cols}, expected 28x28", path.display())]
    ImageSize { path: PathBuf, rows: usize, cols: usize },
    #[error("dataset has no image labelled {0}")]
    MissingClass(u8),
}

/// One entry of the [`SampleStore`].
#[derive(Debug, Clone, Copy)]
pub struct Sample<'a> {
    pub index: usize,
    pub image: &'a Image,
    pub label: Label,
}

/// Immutable table of up to ten images and their labels, indexed from 0.
#[derive(Debug, Clone)]
pub struct SampleStore {
    images: Vec<Image>,
    labels: Vec<Label>,
}

impl SampleStore {
    /// The ten built-in digits; sample `i` is labelled `i`.
    pub fn builtin() -> Self {
        SampleStore {
            images: DIGITS.to_vec(),
            labels: (0..NUM_CLASSES as u8).collect(),
        }
    }

    pub fn new(images: Vec<Image>, labels: Vec<Label>) -> Result<Self, SampleError> {
        if images.is_empty() {
            return Err(SampleError::Empty);
        }
        if images.len() > NUM_CLASSES {
            return Err(SampleError::TooMany(images.len()));
        }
        if images.len() != labels.len() {
            return Err(SampleError::LengthMismatch {
                images: images.len(),
                labels: labels.len(),
            });
        }
        if let Some((index, &label)) = labels
            .iter()
            .enumerate()
            .find(|&(_, &l)| l as usize >= NUM_CLASSES)
        {
            return Err(SampleError::InvalidLabel { index, label });
        }
        Ok(SampleStore { images, labels })
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Sample<'_>> {
        Some(Sample {
            index,
            image: self.images.get(index)?,
            label: *self.labels.get(index)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Sample<'_>> {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Index selected before any digit command: 7 when it exists, otherwise 0.
    pub fn default_index(&self) -> usize {
        if self.len() > 7 {
            7
        } else {
            0
        }
    }
}

impl Default for SampleStore {
    fn default() -> Self {
        Self::builtin()
    }
}
