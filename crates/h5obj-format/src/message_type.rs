//! HDF5 object header message type identifiers.

/// Header message types the store reads, writes, or must recognize to skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Nil,
    Dataspace,
    LinkInfo,
    Datatype,
    FillValueOld,
    FillValue,
    Link,
    DataLayout,
    GroupInfo,
    FilterPipeline,
    Attribute,
    SharedMessageTable,
    ObjectHeaderContinuation,
    SymbolTable,
    ObjectModificationTime,
    BTreeKValues,
    AttributeInfo,
    ObjectReferenceCount,
    /// Unknown message type with its raw type ID.
    Unknown(u16),
}

const TABLE: [(u16, MessageType); 18] = [
    (0x0000, MessageType::Nil),
    (0x0001, MessageType::Dataspace),
    (0x0002, MessageType::LinkInfo),
    (0x0003, MessageType::Datatype),
    (0x0004, MessageType::FillValueOld),
    (0x0005, MessageType::FillValue),
    (0x0006, MessageType::Link),
    (0x0008, MessageType::DataLayout),
    (0x000A, MessageType::GroupInfo),
    (0x000B, MessageType::FilterPipeline),
    (0x000C, MessageType::Attribute),
    (0x000F, MessageType::SharedMessageTable),
    (0x0010, MessageType::ObjectHeaderContinuation),
    (0x0011, MessageType::SymbolTable),
    (0x0012, MessageType::ObjectModificationTime),
    (0x0013, MessageType::BTreeKValues),
    (0x0015, MessageType::AttributeInfo),
    (0x0016, MessageType::ObjectReferenceCount),
];

impl MessageType {
    /// Convert a raw type ID to a `MessageType`.
    pub fn from_u16(val: u16) -> MessageType {
        TABLE
            .iter()
            .find(|(id, _)| *id == val)
            .map_or(MessageType::Unknown(val), |(_, mt)| *mt)
    }

    /// Convert back to the raw type ID.
    pub fn to_u16(self) -> u16 {
        if let MessageType::Unknown(v) = self {
            return v;
        }
        TABLE
            .iter()
            .find(|(_, mt)| *mt == self)
            .map_or(0, |(id, _)| *id)
    }
}
