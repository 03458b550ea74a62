use crate::arena::ByteArena;
use crate::code::Code;
use crate::hash::hash_str;
use rdf_pipe_common::error::DictionaryError;
use std::time::Instant;
use tracing::debug;

/// The kind of term stored in a record. The discriminant is stored in the upper three bits of
/// the record header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum TermKind {
    /// An IRI stored as a whole.
    Iri = 0,
    /// An IRI stored as a local name relative to an interned namespace.
    NamespacedIri = 1,
    BlankNode = 2,
    SimpleLiteral = 4,
    LanguageLiteral = 5,
    TypedLiteral = 6,
}

const INLINE_FLAG: u8 = 0x10;
const SECONDARY_OFFSET_WIDTH: usize = 5;
const SECONDARY_LEN_WIDTH: usize = 4;
const INDEX_WIDTH: usize = 2;
const SECONDARY_LIMIT: u64 = 1 << (8 * SECONDARY_OFFSET_WIDTH);

impl TermKind {
    fn from_header(header: u8) -> Option<(Self, bool)> {
        if header & 0x0F != 0 {
            return None;
        }
        let kind = match header >> 5 {
            0 => Self::Iri,
            1 => Self::NamespacedIri,
            2 => Self::BlankNode,
            4 => Self::SimpleLiteral,
            5 => Self::LanguageLiteral,
            6 => Self::TypedLiteral,
            _ => return None,
        };
        Some((kind, header & INLINE_FLAG != 0))
    }

    fn header(self, inline: bool) -> u8 {
        (self as u8) << 5 | if inline { INLINE_FLAG } else { 0 }
    }

    /// Returns whether records of this kind end with an interning table index.
    pub fn has_index(self) -> bool {
        matches!(
            self,
            Self::NamespacedIri | Self::LanguageLiteral | Self::TypedLiteral
        )
    }

    pub fn is_literal(self) -> bool {
        self as u8 >= Self::SimpleLiteral as u8
    }

    pub fn is_iri(self) -> bool {
        matches!(self, Self::Iri | Self::NamespacedIri)
    }
}

/// The decomposed form of a term, as stored in a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TermKey<'a> {
    pub kind: TermKind,
    /// The namespace, language or datatype index. Zero for kinds without index.
    pub index: u16,
    /// The local name, blank node id or literal label.
    pub value: &'a str,
}

impl TermKey<'_> {
    /// The structural hash locating the record in the hash table.
    #[allow(clippy::cast_possible_truncation, reason = "Folds the string hash to 32 bits")]
    pub fn hash(&self) -> u32 {
        u32::from(self.kind as u8)
            .wrapping_mul(6661)
            .wrapping_add(u32::from(self.index).wrapping_mul(661))
            .wrapping_add(hash_str(self.value) as u32)
    }
}

/// A decoded record, owning its value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Record {
    pub kind: TermKind,
    pub index: u16,
    pub value: String,
}

/// The bytes of a new record, serialized before the table lock is taken.
pub(crate) struct PendingRecord {
    primary: Vec<u8>,
    /// Length-prefixed value, if the value is too long to be stored inline.
    secondary: Option<Vec<u8>>,
}

impl PendingRecord {
    pub fn new(key: &TermKey<'_>, inline_limit: usize) -> Result<Self, DictionaryError> {
        let value = key.value.as_bytes();
        let index = key.kind.has_index().then(|| key.index.to_le_bytes());
        match u8::try_from(value.len()) {
            Ok(len) if value.len() <= inline_limit => {
                let mut primary = Vec::with_capacity(2 + value.len() + INDEX_WIDTH);
                primary.push(key.kind.header(true));
                primary.push(len);
                primary.extend_from_slice(value);
                primary.extend(index.into_iter().flatten());
                Ok(Self {
                    primary,
                    secondary: None,
                })
            }
            _ => {
                let mut primary = Vec::with_capacity(1 + SECONDARY_OFFSET_WIDTH + INDEX_WIDTH);
                primary.push(key.kind.header(false));
                // The secondary offset is patched in once it is known.
                primary.extend_from_slice(&[0; SECONDARY_OFFSET_WIDTH]);
                primary.extend(index.into_iter().flatten());

                let mut secondary = Vec::with_capacity(SECONDARY_LEN_WIDTH + value.len());
                secondary.extend_from_slice(&secondary_len(value.len())?);
                secondary.extend_from_slice(value);
                Ok(Self {
                    primary,
                    secondary: Some(secondary),
                })
            }
        }
    }
}

/// Encodes the length prefix of a spilled value.
fn secondary_len(len: usize) -> Result<[u8; SECONDARY_LEN_WIDTH], DictionaryError> {
    u32::try_from(len)
        .map(u32::to_le_bytes)
        .map_err(|_| DictionaryError::Exhausted {
            region: "secondary",
            limit: SECONDARY_LIMIT,
        })
}

/// Where a record keeps its value.
#[derive(Clone, Copy, Debug)]
struct RecordLocation {
    kind: TermKind,
    index: u16,
    inline: bool,
    value_offset: u64,
    value_len: usize,
}

/// The result of probing the hash table.
enum Probe {
    Found(Code),
    Vacant(usize),
}

/// The general-purpose storage of the dictionary: records in a primary arena (long values
/// spilled into a secondary arena), located through an open-addressed hash table.
///
/// Slots of the table hold `code << 32 | hash`, where zero marks an empty slot. Records are never
/// removed, thus codes stay valid for the lifetime of the table.
#[derive(Clone, Debug)]
pub(crate) struct IndexedTerms {
    slots: Vec<u64>,
    len: usize,
    primary: ByteArena,
    secondary: ByteArena,
    primary_limit: u64,
}

impl IndexedTerms {
    pub fn new(initial_capacity: usize, primary_limit: u64) -> Self {
        let mut primary = ByteArena::default();
        // Offset zero would map to code zero.
        primary.append(&[0]);
        Self {
            slots: vec![0; initial_capacity.max(16).next_power_of_two()],
            len: 0,
            primary,
            secondary: ByteArena::default(),
            primary_limit: primary_limit.min(Code::max_offset()),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn table_bytes(&self) -> usize {
        self.slots.len() * size_of::<u64>()
    }

    pub fn primary_bytes(&self) -> u64 {
        self.primary.len()
    }

    pub fn secondary_bytes(&self) -> u64 {
        self.secondary.len()
    }

    pub fn find(&self, key: &TermKey<'_>, hash: u32) -> Option<Code> {
        match self.probe(key, hash) {
            Probe::Found(code) => Some(code),
            Probe::Vacant(_) => None,
        }
    }

    /// Returns the code of `key`, writing `record` if the key is not yet present.
    ///
    /// The table is probed again, as another writer may have inserted the key since the caller
    /// last looked.
    pub fn insert(
        &mut self,
        key: &TermKey<'_>,
        hash: u32,
        record: &PendingRecord,
    ) -> Result<Code, DictionaryError> {
        let mut slot = match self.probe(key, hash) {
            Probe::Found(code) => return Ok(code),
            Probe::Vacant(slot) => slot,
        };

        let offset = self.primary.len().next_multiple_of(4);
        let code = Code::indexed(offset)
            .filter(|_| offset + record.primary.len() as u64 <= self.primary_limit)
            .ok_or(DictionaryError::Exhausted {
                region: "primary",
                limit: self.primary_limit,
            })?;

        let secondary_offset = self.secondary.len();
        if let Some(secondary) = &record.secondary {
            if secondary_offset + secondary.len() as u64 > SECONDARY_LIMIT {
                return Err(DictionaryError::Exhausted {
                    region: "secondary",
                    limit: SECONDARY_LIMIT,
                });
            }
        }

        if (self.len + 1) * 3 > self.slots.len() * 2 {
            self.rehash();
            slot = self.vacant_slot(hash);
        }

        self.primary.write(offset, &record.primary);
        if let Some(secondary) = &record.secondary {
            self.secondary.append(secondary);
            self.primary.write(
                offset + 1,
                &secondary_offset.to_le_bytes()[..SECONDARY_OFFSET_WIDTH],
            );
        }

        self.slots[slot] = u64::from(code.as_u32()) << 32 | u64::from(hash);
        self.len += 1;
        Ok(code)
    }

    /// Reads the record of `code`, checking that this table issued the code.
    pub fn read(&self, code: Code) -> Result<Record, DictionaryError> {
        let unknown = || DictionaryError::UnknownCode(code.as_u32());
        let location = self.locate(code).ok_or_else(unknown)?;
        let arena = if location.inline {
            &self.primary
        } else {
            &self.secondary
        };
        let bytes = arena
            .read_bytes(location.value_offset, location.value_len)
            .ok_or_else(unknown)?;
        let value = String::from_utf8(bytes).map_err(|_| unknown())?;

        let key = TermKey {
            kind: location.kind,
            index: location.index,
            value: &value,
        };
        if self.find(&key, key.hash()) != Some(code) {
            return Err(unknown());
        }
        Ok(Record {
            kind: location.kind,
            index: location.index,
            value,
        })
    }

    /// Returns the kind of term behind `code`. The code is checked like in [Self::read].
    pub fn kind_of(&self, code: Code) -> Result<TermKind, DictionaryError> {
        self.read(code).map(|record| record.kind)
    }

    fn locate(&self, code: Code) -> Option<RecordLocation> {
        if !code.is_indexed() {
            return None;
        }
        let offset = code.offset();
        let (kind, inline) = TermKind::from_header(self.primary.read_u8(offset)?)?;
        let (value_offset, value_len, index_offset) = if inline {
            let len = usize::from(self.primary.read_u8(offset + 1)?);
            (offset + 2, len, offset + 2 + len as u64)
        } else {
            let secondary_offset = self
                .primary
                .read_uint(offset + 1, SECONDARY_OFFSET_WIDTH)?;
            let len = self
                .secondary
                .read_uint(secondary_offset, SECONDARY_LEN_WIDTH)?;
            (
                secondary_offset + SECONDARY_LEN_WIDTH as u64,
                usize::try_from(len).ok()?,
                offset + 1 + SECONDARY_OFFSET_WIDTH as u64,
            )
        };
        let index = if kind.has_index() {
            u16::try_from(self.primary.read_uint(index_offset, INDEX_WIDTH)?).ok()?
        } else {
            0
        };
        Some(RecordLocation {
            kind,
            index,
            inline,
            value_offset,
            value_len,
        })
    }

    fn matches(&self, code: Code, key: &TermKey<'_>) -> bool {
        let Some(location) = self.locate(code) else {
            return false;
        };
        let arena = if location.inline {
            &self.primary
        } else {
            &self.secondary
        };
        location.kind == key.kind
            && location.index == key.index
            && location.value_len == key.value.len()
            && arena.equals(location.value_offset, key.value.as_bytes())
    }

    fn probe(&self, key: &TermKey<'_>, hash: u32) -> Probe {
        let mask = self.slots.len() - 1;
        let mut position = hash as usize & mask;
        loop {
            let slot = self.slots[position];
            if slot == 0 {
                return Probe::Vacant(position);
            }
            let (code, slot_hash) = unpack_slot(slot);
            if slot_hash == hash && self.matches(code, key) {
                return Probe::Found(code);
            }
            position = (position + 1) & mask;
        }
    }

    fn vacant_slot(&self, hash: u32) -> usize {
        let mask = self.slots.len() - 1;
        let mut position = hash as usize & mask;
        while self.slots[position] != 0 {
            position = (position + 1) & mask;
        }
        position
    }

    fn rehash(&mut self) {
        let start = Instant::now();
        let old_len = self.slots.len();
        let old_slots = std::mem::replace(&mut self.slots, vec![0; old_len * 2]);
        for slot in old_slots.into_iter().filter(|slot| *slot != 0) {
            let position = self.vacant_slot(unpack_slot(slot).1);
            self.slots[position] = slot;
        }
        debug!(
            "Rehashed term table from {} to {} slots ({} values) in {:?}",
            old_len,
            self.slots.len(),
            self.len,
            start.elapsed()
        );
    }
}

#[allow(clippy::cast_possible_truncation, reason = "Splits the packed slot")]
fn unpack_slot(slot: u64) -> (Code, u32) {
    (Code::from_u32((slot >> 32) as u32), slot as u32)
}
