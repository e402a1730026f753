use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::debug;

use super::{Image, Label, SampleError, SampleStore, IMAGE_LEN, IMAGE_SIDE, NUM_CLASSES};

const IMAGES_MAGIC: u32 = 0x0000_0803;
const LABELS_MAGIC: u32 = 0x0000_0801;

/// Opens `path`, transparently gunzipping files ending in `.gz`.
fn open(path: &Path) -> Result<Box<dyn Read>, SampleError> {
    let file = File::open(path).map_err(|source| SampleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

fn read_u32(reader: &mut dyn Read, path: &Path) -> Result<u32, SampleError> {
    let mut buf4 = [0u8; 4];
    reader.read_exact(&mut buf4).map_err(|source| SampleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(u32::from_be_bytes(buf4))
}

fn expect_magic(reader: &mut dyn Read, path: &Path, expected: u32) -> Result<(), SampleError> {
    let found = read_u32(reader, path)?;
    if found != expected {
        return Err(SampleError::BadMagic {
            path: path.to_path_buf(),
            expected,
            found,
        });
    }
    Ok(())
}

/// Reads an IDX1 label file (optionally gzip-compressed).
pub fn read_idx_labels(path: impl AsRef<Path>) -> Result<Vec<Label>, SampleError> {
    let path = path.as_ref();
    let mut reader = open(path)?;
    expect_magic(&mut reader, path, LABELS_MAGIC)?;
    let num_labels = read_u32(&mut reader, path)? as usize;

    let mut labels = Vec::new();
    reader
        .take(num_labels as u64)
        .read_to_end(&mut labels)
        .map_err(|source| SampleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    if labels.len() != num_labels {
        return Err(SampleError::LengthMismatch {
            images: num_labels,
            labels: labels.len(),
        });
    }
    Ok(labels)
}

/// Streaming reader over an IDX3 image file of 28x28 images.
pub struct IdxImages {
    reader: Box<dyn Read>,
    path: PathBuf,
    len: usize,
    read: usize,
}

impl IdxImages {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SampleError> {
        let path = path.as_ref();
        let mut reader = open(path)?;
        expect_magic(&mut reader, path, IMAGES_MAGIC)?;
        let len = read_u32(&mut reader, path)? as usize;
        let rows = read_u32(&mut reader, path)? as usize;
        let cols = read_u32(&mut reader, path)? as usize;
        if rows != IMAGE_SIDE || cols != IMAGE_SIDE {
            return Err(SampleError::ImageSize {
                path: path.to_path_buf(),
                rows,
                cols,
            });
        }
        Ok(IdxImages {
            reader,
            path: path.to_path_buf(),
            len,
            read: 0,
        })
    }

    /// Number of images declared in the header.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Next image, or `None` once every declared image has been read.
    pub fn next_image(&mut self) -> Result<Option<Image>, SampleError> {
        if self.read == self.len {
            return Ok(None);
        }
        let mut img = [0u8; IMAGE_LEN];
        self.reader.read_exact(&mut img).map_err(|source| SampleError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.read += 1;
        Ok(Some(img))
    }
}

impl SampleStore {
    /// Builds a store from MNIST IDX files, taking the first image of each class so
    /// that sample `i` is labelled `i`.
    pub fn from_idx(images: impl AsRef<Path>, labels: impl AsRef<Path>) -> Result<Self, SampleError> {
        let labels = read_idx_labels(labels)?;
        let mut images = IdxImages::open(images)?;
        if images.len() != labels.len() {
            return Err(SampleError::LengthMismatch {
                images: images.len(),
                labels: labels.len(),
            });
        }

        let mut picked: [Option<Image>; NUM_CLASSES] = [None; NUM_CLASSES];
        let mut found = 0;
        for &label in &labels {
            let Some(img) = images.next_image()? else { break };
            let slot = match picked.get_mut(label as usize) {
                Some(slot) => slot,
                None => continue,
            };
            if slot.is_none() {
                *slot = Some(img);
                found += 1;
                if found == NUM_CLASSES {
                    break;
                }
            }
        }
        debug!(scanned = images.read, found, "picked samples from IDX files");

        let mut table = Vec::with_capacity(NUM_CLASSES);
        for (class, img) in picked.into_iter().enumerate() {
            table.push(img.ok_or(SampleError::MissingClass(class as u8))?);
        }
        SampleStore::new(table, (0..NUM_CLASSES as u8).collect())
    }
}
