use std::fmt::{Debug, Display, Formatter};

/// A compact, fixed-width stand-in for an RDF term.
///
/// Codes are only meaningful for the [TermDictionary](crate::TermDictionary) that issued them.
///
/// # Code Regions
///
/// The value of a code alone tells how it must be decoded:
/// - `0` is never issued.
/// - `0x0000_0001..=0xDFFF_FFFF` are *indexed* codes. The code times four is the offset of the
///   term's record in the primary arena.
/// - `0xE000_0000` is the [null code](Code::NULL), standing in for "no term" or the default graph.
/// - `0xE100_0000..=0xFFFF_FFFF` are *embedded* codes. Bits 24 to 28 select one of the packable
///   datatypes and the low 24 bits hold the packed value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Code(u32);

const EMBEDDED_TAG: u32 = 0xE000_0000;
const PAYLOAD_MASK: u32 = 0x00FF_FFFF;
const MAX_INDEXED: u32 = 0xDFFF_FFFF;

impl Code {
    /// The code of the default graph.
    pub const NULL: Code = Code(EMBEDDED_TAG);

    /// Creates a code from its raw value.
    #[inline]
    pub const fn from_u32(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw value of this code.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }

    /// Returns whether the term is packed into the code itself.
    #[inline]
    pub fn is_embedded(self) -> bool {
        self.0 & EMBEDDED_TAG == EMBEDDED_TAG && self.datatype_index() != 0
    }

    /// Returns whether the term is stored in the arenas of the dictionary.
    #[inline]
    pub fn is_indexed(self) -> bool {
        (1..=MAX_INDEXED).contains(&self.0)
    }

    pub(crate) fn embedded(datatype_index: u8, payload: u32) -> Self {
        debug_assert!((1..32).contains(&datatype_index));
        Self(EMBEDDED_TAG | u32::from(datatype_index) << 24 | payload & PAYLOAD_MASK)
    }

    /// Returns the datatype index and payload of an embedded code.
    pub(crate) fn embedded_parts(self) -> (u8, u32) {
        (self.datatype_index(), self.0 & PAYLOAD_MASK)
    }

    /// Returns the code of the record at `offset`, if the offset is addressable.
    pub(crate) fn indexed(offset: u64) -> Option<Self> {
        debug_assert_eq!(offset % 4, 0);
        u32::try_from(offset >> 2)
            .ok()
            .filter(|code| (1..=MAX_INDEXED).contains(code))
            .map(Self)
    }

    /// The largest primary arena offset an indexed code can address.
    pub(crate) const fn max_offset() -> u64 {
        (MAX_INDEXED as u64) << 2
    }

    pub(crate) fn offset(self) -> u64 {
        u64::from(self.0) << 2
    }

    fn datatype_index(self) -> u8 {
        self.0.to_le_bytes()[3] & 0x1F
    }
}

impl Debug for Code {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Code({:#010x})", self.0)
    }
}

impl Display for Code {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// A quad whose four components have been encoded by the same dictionary.
///
/// The graph name of a quad in the default graph is [Code::NULL].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CodedQuad {
    pub subject: Code,
    pub predicate: Code,
    pub object: Code,
    pub graph_name: Code,
}

impl CodedQuad {
    pub fn new(subject: Code, predicate: Code, object: Code, graph_name: Code) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph_name,
        }
    }
}
