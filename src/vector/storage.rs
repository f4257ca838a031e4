//! Immutable, row-aligned vector store.
//!
//! Row `n` holds the embedding of corpus record `n`. The store is loaded once
//! at startup through a memory map and decoded into a contiguous `f32` buffer
//! that is never mutated afterwards.
//!
//! # Storage Formats
//!
//! Two on-disk layouts are accepted, distinguished by their magic bytes:
//! - Segment format (`CLVS`): header (16 bytes) with magic, version,
//!   dimension and row count, then contiguous little-endian `f32` rows.
//! - NumPy `.npy` (v1-v3): a 2-D C-ordered `<f4` or `<f8` array, which is what
//!   the offline embedding job produces.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapOptions};

use crate::vector::types::{VectorDimension, VectorStoreError};

/// Current segment format version.
const STORAGE_VERSION: u32 = 1;

/// Size of the segment header in bytes.
const HEADER_SIZE: usize = 16;

/// Magic bytes identifying segment files.
const MAGIC_BYTES: &[u8; 4] = b"CLVS";

/// Magic prefix of NumPy array files.
const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

const BYTES_PER_F32: usize = 4;

/// Pre-computed embeddings, one row per corpus record.
#[derive(Clone, PartialEq)]
pub struct VectorStore {
    dimension: VectorDimension,
    rows: usize,
    data: Vec<f32>,
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("rows", &self.rows)
            .field("dimension", &self.dimension.get())
            .finish()
    }
}

impl VectorStore {
    /// Builds a store from in-memory rows, checking every row has the same length.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, VectorStoreError> {
        let dimension = rows.first().map(Vec::len).unwrap_or(1);
        let dimension = VectorDimension::new(dimension)
            .map_err(|e| VectorStoreError::InvalidFormat(e.to_string()))?;

        let mut data = Vec::with_capacity(rows.len() * dimension.get());
        for (row, vector) in rows.iter().enumerate() {
            if vector.len() != dimension.get() {
                return Err(VectorStoreError::RowDimension {
                    row,
                    expected: dimension.get(),
                    actual: vector.len(),
                });
            }
            data.extend_from_slice(vector);
        }

        Ok(Self {
            dimension,
            rows: rows.len(),
            data,
        })
    }

    /// Opens a store file in either supported format.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, VectorStoreError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(VectorStoreError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Vector store file not found: {}", path.display()),
            )));
        }

        let file = File::open(path)?;
        // The file is only read during this call and the map is dropped before returning.
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        let store = if mmap.starts_with(NPY_MAGIC) {
            Self::decode_npy(&mmap)?
        } else if mmap.starts_with(MAGIC_BYTES) {
            Self::decode_segment(&mmap)?
        } else {
            return Err(VectorStoreError::InvalidFormat(format!(
                "{} is neither a CLVS segment nor a .npy array",
                path.display()
            )));
        };

        tracing::debug!(
            path = %path.display(),
            rows = store.rows,
            dimension = store.dimension.get(),
            "loaded vector store"
        );
        Ok(store)
    }

    /// Writes the store in segment format.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), VectorStoreError> {
        let mut writer = VectorStoreWriter::create(path, self.dimension)?;
        for row in self.rows() {
            writer.append(&[row])?;
        }
        writer.finish()?;
        Ok(())
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    /// Row `index`, or `None` past the end.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.rows {
            return None;
        }
        let dim = self.dimension.get();
        Some(&self.data[index * dim..(index + 1) * dim])
    }

    /// Iterates rows in corpus order.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, f32> {
        self.data.chunks_exact(self.dimension.get())
    }

    /// All rows as one contiguous slice.
    #[must_use]
    pub fn as_flat(&self) -> &[f32] {
        &self.data
    }

    fn decode_segment(mmap: &Mmap) -> Result<Self, VectorStoreError> {
        if mmap.len() < HEADER_SIZE {
            return Err(VectorStoreError::InvalidFormat(
                "File too small to contain header".to_string(),
            ));
        }

        let version = read_u32(mmap, 4);
        if version != STORAGE_VERSION {
            return Err(VectorStoreError::VersionMismatch {
                expected: STORAGE_VERSION,
                actual: version,
            });
        }

        let dimension = VectorDimension::new(read_u32(mmap, 8) as usize)
            .map_err(|e| VectorStoreError::InvalidFormat(e.to_string()))?;
        let rows = read_u32(mmap, 12) as usize;

        let expected_len = body_len(rows, dimension.get(), BYTES_PER_F32)?
            .checked_add(HEADER_SIZE)
            .ok_or_else(|| shape_overflow(rows, dimension.get()))?;
        if mmap.len() < expected_len {
            return Err(VectorStoreError::InvalidFormat(format!(
                "Header declares {rows} rows but file holds {} bytes of data",
                mmap.len() - HEADER_SIZE
            )));
        }

        let data = decode_f32_le(&mmap[HEADER_SIZE..expected_len]);
        Ok(Self {
            dimension,
            rows,
            data,
        })
    }

    fn decode_npy(bytes: &[u8]) -> Result<Self, VectorStoreError> {
        let header = NpyHeader::parse(bytes)?;
        if header.fortran_order {
            return Err(VectorStoreError::InvalidFormat(
                "Fortran-ordered arrays are not supported".to_string(),
            ));
        }

        let (rows, dim) = header.shape;
        let dimension = VectorDimension::new(dim)
            .map_err(|e| VectorStoreError::InvalidFormat(e.to_string()))?;
        let body = &bytes[header.data_offset..];

        let data = match header.descr.as_str() {
            "<f4" => {
                let needed = body_len(rows, dim, BYTES_PER_F32)?;
                check_body_len(body.len(), needed)?;
                decode_f32_le(&body[..needed])
            }
            "<f8" => {
                let needed = body_len(rows, dim, 8)?;
                check_body_len(body.len(), needed)?;
                body[..needed]
                    .chunks_exact(8)
                    .map(|chunk| {
                        let mut buf = [0u8; 8];
                        buf.copy_from_slice(chunk);
                        f64::from_le_bytes(buf) as f32
                    })
                    .collect()
            }
            other => return Err(VectorStoreError::UnsupportedDtype(other.to_string())),
        };

        Ok(Self {
            dimension,
            rows,
            data,
        })
    }
}

/// Streaming writer for the segment format.
///
/// Rows are appended in batches; the header row count is patched on `finish`.
pub struct VectorStoreWriter {
    path: PathBuf,
    file: BufWriter<File>,
    dimension: VectorDimension,
    rows: usize,
}

impl VectorStoreWriter {
    /// Creates (or truncates) a segment file and writes its header.
    pub fn create(
        path: impl AsRef<Path>,
        dimension: VectorDimension,
    ) -> Result<Self, VectorStoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        let mut writer = Self {
            path,
            file: BufWriter::new(file),
            dimension,
            rows: 0,
        };
        writer.write_header()?;
        Ok(writer)
    }

    /// Appends a batch of rows, rejecting any with the wrong dimension.
    pub fn append(&mut self, rows: &[&[f32]]) -> Result<(), VectorStoreError> {
        for row in rows {
            if row.len() != self.dimension.get() {
                return Err(VectorStoreError::RowDimension {
                    row: self.rows,
                    expected: self.dimension.get(),
                    actual: row.len(),
                });
            }
            for &value in *row {
                self.file.write_all(&value.to_le_bytes())?;
            }
            self.rows += 1;
        }
        Ok(())
    }

    /// Rows written so far.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flushes rows and patches the header count. Returns the file path.
    pub fn finish(mut self) -> Result<PathBuf, VectorStoreError> {
        self.file.flush()?;
        let file = self.file.get_mut();
        // Row count lives at byte offset 12 of the header
        file.seek(SeekFrom::Start(12))?;
        file.write_all(&(self.rows as u32).to_le_bytes())?;
        file.flush()?;
        Ok(self.path)
    }

    fn write_header(&mut self) -> Result<(), io::Error> {
        self.file.write_all(MAGIC_BYTES)?;
        self.file.write_all(&STORAGE_VERSION.to_le_bytes())?;
        self.file
            .write_all(&(self.dimension.get() as u32).to_le_bytes())?;
        self.file.write_all(&0u32.to_le_bytes())?;
        Ok(())
    }
}

/// The parts of a `.npy` header the loader cares about.
#[derive(Debug, PartialEq)]
struct NpyHeader {
    descr: String,
    fortran_order: bool,
    shape: (usize, usize),
    data_offset: usize,
}

impl NpyHeader {
    fn parse(bytes: &[u8]) -> Result<Self, VectorStoreError> {
        let invalid = |msg: &str| VectorStoreError::InvalidFormat(format!("npy: {msg}"));

        if bytes.len() < 10 {
            return Err(invalid("file too small"));
        }
        let major = bytes[6];
        let (header_len, prefix) = match major {
            1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
            2 | 3 => {
                if bytes.len() < 12 {
                    return Err(invalid("file too small"));
                }
                (read_u32(bytes, 8) as usize, 12)
            }
            other => return Err(invalid(&format!("unsupported version {other}"))),
        };

        let end = prefix + header_len;
        if bytes.len() < end {
            return Err(invalid("truncated header"));
        }
        let header = std::str::from_utf8(&bytes[prefix..end])
            .map_err(|_| invalid("header is not valid text"))?;

        let descr = dict_value(header, "descr")
            .map(|v| v.trim_matches(|c| c == '\'' || c == '"').to_string())
            .ok_or_else(|| invalid("missing 'descr'"))?;
        let fortran_order = dict_value(header, "fortran_order")
            .map(|v| v.starts_with("True"))
            .unwrap_or(false);

        let shape_start = header
            .find("'shape'")
            .and_then(|i| header[i..].find('(').map(|j| i + j + 1))
            .ok_or_else(|| invalid("missing 'shape'"))?;
        let shape_end = header[shape_start..]
            .find(')')
            .map(|j| shape_start + j)
            .ok_or_else(|| invalid("unterminated 'shape'"))?;
        let dims: Vec<usize> = header[shape_start..shape_end]
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<usize>())
            .collect::<Result<_, _>>()
            .map_err(|_| invalid("non-integer shape"))?;

        let shape = match dims.as_slice() {
            [rows, dim] => (*rows, *dim),
            _ => return Err(invalid("expected a 2-D array")),
        };

        Ok(Self {
            descr,
            fortran_order,
            shape,
            data_offset: end,
        })
    }
}

/// Returns the raw text after `'key':` up to the next top-level comma.
fn dict_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("'{key}':");
    let start = header.find(&needle)? + needle.len();
    let rest = header[start..].trim_start();
    let end = rest.find(',').unwrap_or(rest.len());
    Some(rest[..end].trim())
}

/// Byte length of a `rows x dim` array, rejecting shapes that overflow.
fn body_len(rows: usize, dim: usize, width: usize) -> Result<usize, VectorStoreError> {
    rows.checked_mul(dim)
        .and_then(|values| values.checked_mul(width))
        .ok_or_else(|| shape_overflow(rows, dim))
}

fn shape_overflow(rows: usize, dim: usize) -> VectorStoreError {
    VectorStoreError::InvalidFormat(format!("shape ({rows}, {dim}) is too large"))
}

fn check_body_len(actual: usize, needed: usize) -> Result<(), VectorStoreError> {
    if actual < needed {
        return Err(VectorStoreError::InvalidFormat(format!(
            "npy: array body holds {actual} bytes, shape requires {needed}"
        )));
    }
    Ok(())
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn decode_f32_le(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(BYTES_PER_F32)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
