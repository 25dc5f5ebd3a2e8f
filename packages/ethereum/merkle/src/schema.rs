//! Descriptors of SSZ types, enough to merkleize beacon API JSON.

use serde_json::{Map, Value};

/// Number of bytes in a merkle chunk
pub const BYTES_PER_CHUNK: usize = 32;

/// An SSZ type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SszType {
    /// `uint64`
    Uint64,
    /// `uint256`
    Uint256,
    /// `ByteVector[N]`, including `BytesN` aliases
    ByteVector(usize),
    /// `ByteList[N]`
    ByteList(usize),
    /// `Bitvector[N]`
    Bitvector(usize),
    /// `Bitlist[N]`
    Bitlist(usize),
    /// `Vector[T, N]`
    Vector(Box<SszType>, usize),
    /// `List[T, N]`
    List(Box<SszType>, usize),
    /// A container
    Container(Container),
}

/// An SSZ container: named fields in merkleization order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    /// The container name, used in error messages
    pub name: &'static str,
    /// The fields of the container
    pub fields: Vec<(&'static str, SszType)>,
}

impl SszType {
    /// The serialized size of a basic type, `None` for composite types.
    #[must_use]
    pub const fn basic_size(&self) -> Option<usize> {
        match self {
            Self::Uint64 => Some(8),
            Self::Uint256 => Some(32),
            _ => None,
        }
    }

    /// The default value of the type in beacon API JSON encoding.
    #[must_use]
    pub fn default_value(&self) -> Value {
        match self {
            Self::Uint64 | Self::Uint256 => Value::String("0".to_string()),
            Self::ByteVector(len) => zero_hex(*len),
            Self::Bitvector(len) => zero_hex(len.div_ceil(8)),
            Self::ByteList(_) => Value::String("0x".to_string()),
            Self::Bitlist(_) => Value::String("0x01".to_string()),
            Self::Vector(elem, len) => Value::Array(vec![elem.default_value(); *len]),
            Self::List(..) => Value::Array(Vec::new()),
            Self::Container(container) => container.default_value(),
        }
    }

    /// The container, if the type is one.
    #[must_use]
    pub const fn as_container(&self) -> Option<&Container> {
        match self {
            Self::Container(container) => Some(container),
            _ => None,
        }
    }
}

impl Container {
    /// Creates a container from its fields.
    #[must_use]
    pub const fn new(name: &'static str, fields: Vec<(&'static str, SszType)>) -> Self {
        Self { name, fields }
    }

    /// Depth of the tree over the field roots.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.fields.len().next_power_of_two().trailing_zeros() as usize
    }

    /// The default value of the container in beacon API JSON encoding.
    #[must_use]
    pub fn default_value(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(name, ty)| ((*name).to_string(), ty.default_value()))
                .collect::<Map<_, _>>(),
        )
    }

    /// Position of the field called `name`.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|(field, _)| *field == name)
    }

    /// The type of the field called `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&SszType> {
        self.fields
            .iter()
            .find_map(|(field, ty)| (*field == name).then_some(ty))
    }
}

impl From<Container> for SszType {
    fn from(container: Container) -> Self {
        Self::Container(container)
    }
}

fn zero_hex(len: usize) -> Value {
    Value::String(format!("0x{}", "00".repeat(len)))
}

/// `Bytes32`
#[must_use]
pub const fn bytes32() -> SszType {
    SszType::ByteVector(32)
}

/// `Vector[T, N]`
#[must_use]
pub fn vector(ty: SszType, len: usize) -> SszType {
    SszType::Vector(Box::new(ty), len)
}

/// `List[T, N]`
#[must_use]
pub fn list(ty: SszType, max: usize) -> SszType {
    SszType::List(Box::new(ty), max)
}
