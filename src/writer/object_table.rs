//! Indirect object identity and bookkeeping.
//!
//! Ids are allocated monotonically from 1 and never reused. Objects are kept
//! in creation order, which is also numbering order. Completed objects are
//! written in ascending id order; an object left open (the catalog, a font
//! still collecting glyphs) does not hold back completed objects after it.

use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef};
use bytes::BytesMut;

/// Lifecycle of an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectState {
    /// Still accepting payload and stream mutations
    Open,
    /// Complete; written at the next flush
    Ended,
    /// Emitted at the given byte offset; payload has been released
    Written {
        /// Offset of the `"<id> 0 obj"` token
        offset: u64,
    },
}

/// A uniquely numbered unit of document content.
#[derive(Debug)]
pub struct IndirectObject {
    id: u32,
    payload: Object,
    stream: Option<BytesMut>,
    compress: bool,
    encrypt: bool,
    state: ObjectState,
}

impl IndirectObject {
    fn new(id: u32, payload: Object, stream: Option<BytesMut>) -> Self {
        Self {
            id,
            payload,
            stream,
            compress: true,
            encrypt: true,
            state: ObjectState::Open,
        }
    }

    /// Object number.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Reference to this object.
    pub fn reference(&self) -> ObjectRef {
        ObjectRef::new(self.id, 0)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ObjectState {
        self.state
    }

    /// Byte offset, known only once the object has been written.
    pub fn offset(&self) -> Option<u64> {
        match self.state {
            ObjectState::Written { offset } => Some(offset),
            _ => None,
        }
    }

    /// The value payload.
    pub fn payload(&self) -> &Object {
        &self.payload
    }

    /// Raw stream bytes, if this is a stream object.
    pub fn stream(&self) -> Option<&[u8]> {
        self.stream.as_deref()
    }

    /// Whether stream data may be Flate-compressed at write time.
    pub fn compressible(&self) -> bool {
        self.compress
    }

    /// Whether strings and stream data pass through the encryption hook.
    pub fn encryptable(&self) -> bool {
        self.encrypt
    }

    fn ensure_mutable(&self) -> Result<()> {
        match self.state {
            ObjectState::Written { .. } => Err(Error::Invariant(format!(
                "object {} mutated after it was written",
                self.id
            ))),
            _ => Ok(()),
        }
    }

    /// Mutable access to the payload.
    pub fn payload_mut(&mut self) -> Result<&mut Object> {
        self.ensure_mutable()?;
        Ok(&mut self.payload)
    }

    /// Mutable access to a dictionary payload.
    pub fn dict_mut(&mut self) -> Result<&mut Dictionary> {
        let id = self.id;
        self.payload_mut()?
            .as_dict_mut()
            .ok_or_else(|| Error::Invariant(format!("object {} is not a dictionary", id)))
    }

    /// Append raw bytes to the stream, turning the object into a stream if needed.
    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_mutable()?;
        self.stream
            .get_or_insert_with(BytesMut::new)
            .extend_from_slice(data);
        Ok(())
    }

    /// Exclude this stream from compression.
    pub fn set_compress(&mut self, compress: bool) {
        self.compress = compress;
    }

    /// Exclude this object from the encryption hook.
    pub fn set_encrypt(&mut self, encrypt: bool) {
        self.encrypt = encrypt;
    }

    /// Mark the object complete.
    pub fn end(&mut self) {
        if self.state == ObjectState::Open {
            self.state = ObjectState::Ended;
        }
    }

    /// Hand the payload and stream to the writer, keeping only the offset.
    pub(crate) fn take_for_write(&mut self) -> (Object, Option<BytesMut>) {
        (std::mem::replace(&mut self.payload, Object::Null), self.stream.take())
    }

    pub(crate) fn mark_written(&mut self, offset: u64) {
        self.state = ObjectState::Written { offset };
    }
}

/// All indirect objects of one document, in creation order.
#[derive(Debug, Default)]
pub struct ObjectTable {
    objects: Vec<IndirectObject>,
    /// Index of the first unwritten object
    first_unwritten: usize,
    written: usize,
}

impl ObjectTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new object and return its reference.
    pub fn create(&mut self, payload: Object) -> ObjectRef {
        let id = self.objects.len() as u32 + 1;
        self.objects.push(IndirectObject::new(id, payload, None));
        log::debug!("Allocated object {}", id);
        ObjectRef::new(id, 0)
    }

    /// Append a new stream object and return its reference.
    pub fn create_stream(&mut self, payload: Object, data: &[u8]) -> ObjectRef {
        let id = self.objects.len() as u32 + 1;
        self.objects
            .push(IndirectObject::new(id, payload, Some(BytesMut::from(data))));
        log::debug!("Allocated stream object {} ({} bytes)", id, data.len());
        ObjectRef::new(id, 0)
    }

    /// Number of objects allocated so far.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no object has been allocated.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Number of objects already written.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Look up an object.
    pub fn get(&self, r: ObjectRef) -> Option<&IndirectObject> {
        (r.id as usize)
            .checked_sub(1)
            .and_then(|idx| self.objects.get(idx))
    }

    /// Look up an object mutably.
    pub fn get_mut(&mut self, r: ObjectRef) -> Result<&mut IndirectObject> {
        (r.id as usize)
            .checked_sub(1)
            .and_then(|idx| self.objects.get_mut(idx))
            .ok_or_else(|| Error::NotFound(format!("object {}", r)))
    }

    /// Mutable dictionary payload of an object.
    pub fn dict_mut(&mut self, r: ObjectRef) -> Result<&mut Dictionary> {
        self.get_mut(r)?.dict_mut()
    }

    /// Mark an object complete.
    pub fn end(&mut self, r: ObjectRef) -> Result<()> {
        self.get_mut(r)?.end();
        Ok(())
    }

    /// Mark every object complete.
    pub fn end_all(&mut self) {
        for obj in &mut self.objects {
            obj.end();
        }
    }

    /// Iterate objects in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &IndirectObject> {
        self.objects.iter()
    }

    /// Indices of completed, unwritten objects in ascending order.
    pub(crate) fn ready_indices(&self) -> Vec<usize> {
        self.objects
            .iter()
            .enumerate()
            .skip(self.first_unwritten)
            .filter(|(_, obj)| obj.state == ObjectState::Ended)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub(crate) fn at_mut(&mut self, idx: usize) -> Option<&mut IndirectObject> {
        self.objects.get_mut(idx)
    }

    /// Record a write and move the cursor past the written prefix.
    pub(crate) fn record_written(&mut self) {
        self.written += 1;
        while self
            .objects
            .get(self.first_unwritten)
            .is_some_and(|obj| obj.offset().is_some())
        {
            self.first_unwritten += 1;
        }
    }
}
