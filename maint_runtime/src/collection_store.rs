//! Collection store: load/save one collection at a time.
//!
//! Rules:
//!   - A missing file is an empty collection (first run)
//!   - Save rewrites the whole file, flushes and fsyncs
//!   - Nothing is written between load at start and save at exit

use std::cell::{Cell, RefCell};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::codec::{decode_collection, encode_collection, BinaryRecord, CodecError, CollectionFile};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("{path}: {source}")]
    Codec {
        path: String,
        #[source]
        source: CodecError,
    },
}

/// Persistence port for one collection.
pub trait CollectionPort<T> {
    fn load(&self) -> Result<CollectionFile<T>, StoreError>;
    /// `counter` is written only for collections whose header has one.
    fn save(&self, records: &[T], counter: i32) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// File-backed
// ---------------------------------------------------------------------------

/// One collection stored in one flat binary file.
pub struct BinaryFile<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> BinaryFile<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl<T: BinaryRecord> CollectionPort<T> for BinaryFile<T> {
    fn load(&self) -> Result<CollectionFile<T>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(CollectionFile::empty()),
            Err(e) => return Err(self.io_error(e)),
        };
        let mut bytes = Vec::new();
        BufReader::new(file)
            .read_to_end(&mut bytes)
            .map_err(|e| self.io_error(e))?;
        decode_collection(&bytes).map_err(|source| StoreError::Codec {
            path: self.path.display().to_string(),
            source,
        })
    }

    fn save(&self, records: &[T], counter: i32) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let bytes = encode_collection(records, counter);
        let mut file = File::create(&self.path).map_err(|e| self.io_error(e))?;
        {
            let mut writer = BufWriter::new(&mut file);
            writer.write_all(&bytes).map_err(|e| self.io_error(e))?;
            writer.flush().map_err(|e| self.io_error(e))?;
        }
        file.sync_all().map_err(|e| self.io_error(e))
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Holds the encoded bytes in memory. Goes through the same codec as
/// `BinaryFile`, so a round trip here is a round trip of the file format.
pub struct MemoryCollection<T> {
    bytes: RefCell<Option<Vec<u8>>>,
    fail_saves: Cell<bool>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Default for MemoryCollection<T> {
    fn default() -> Self {
        Self {
            bytes: RefCell::new(None),
            fail_saves: Cell::new(false),
            _record: PhantomData,
        }
    }
}

impl<T> MemoryCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        let store = Self::default();
        store.bytes.replace(Some(bytes));
        store
    }

    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.bytes.borrow().clone()
    }

    /// Make every later save fail with a permission error.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }
}

impl<T: BinaryRecord> CollectionPort<T> for MemoryCollection<T> {
    fn load(&self) -> Result<CollectionFile<T>, StoreError> {
        match self.bytes.borrow().as_deref() {
            None => Ok(CollectionFile::empty()),
            Some(bytes) => decode_collection(bytes).map_err(|source| StoreError::Codec {
                path: "<memory>".to_string(),
                source,
            }),
        }
    }

    fn save(&self, records: &[T], counter: i32) -> Result<(), StoreError> {
        if self.fail_saves.get() {
            return Err(StoreError::Io {
                path: "<memory>".to_string(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "save refused"),
            });
        }
        self.bytes.replace(Some(encode_collection(records, counter)));
        Ok(())
    }
}

impl<T, P: CollectionPort<T> + ?Sized> CollectionPort<T> for std::rc::Rc<P> {
    fn load(&self) -> Result<CollectionFile<T>, StoreError> {
        (**self).load()
    }

    fn save(&self, records: &[T], counter: i32) -> Result<(), StoreError> {
        (**self).save(records, counter)
    }
}
