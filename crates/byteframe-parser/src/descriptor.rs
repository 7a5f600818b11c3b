use crate::error::{DescriptorError, Result};

/// How the end of a message payload is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framing {
    /// The payload runs until the end marker byte (inclusive).
    Bounded,
    /// The payload is exactly this many bytes.
    Sized(usize),
}

impl Framing {
    /// Declared payload length, or `None` for bounded framing.
    pub fn length(&self) -> Option<usize> {
        match self {
            Framing::Bounded => None,
            Framing::Sized(len) => Some(*len),
        }
    }

    pub fn is_sized(&self) -> bool {
        matches!(self, Framing::Sized(_))
    }
}

/// Per-identifier framing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Descriptor {
    id: u8,
    framing: Framing,
    checksum: bool,
}

impl Descriptor {
    /// Create a validated descriptor.
    ///
    /// Fails with [`DescriptorError::SizeNotSet`] for `Framing::Sized(0)`.
    pub fn new(id: u8, framing: Framing, checksum: bool) -> Result<Self> {
        if framing == Framing::Sized(0) {
            return Err(DescriptorError::SizeNotSet { id });
        }
        Ok(Self {
            id,
            framing,
            checksum,
        })
    }

    /// Terminator-delimited descriptor. Always valid.
    pub fn bounded(id: u8, checksum: bool) -> Self {
        Self {
            id,
            framing: Framing::Bounded,
            checksum,
        }
    }

    /// Length-delimited descriptor.
    pub fn sized(id: u8, length: usize, checksum: bool) -> Result<Self> {
        Self::new(id, Framing::Sized(length), checksum)
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Whether a checksum byte trails the payload.
    pub fn checksum(&self) -> bool {
        self.checksum
    }
}

/// Ordered set of descriptors keyed by identifier.
///
/// Built once before parsing starts; [`Parser`](crate::Parser) takes ownership so the table is
/// read-only while bytes are being fed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorTable {
    descriptors: Vec<Descriptor>,
}

impl DescriptorTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a descriptor built from its parts.
    pub fn register(&mut self, id: u8, framing: Framing, checksum: bool) -> Result<&Descriptor> {
        let descriptor = Descriptor::new(id, framing, checksum)?;
        self.insert(descriptor)
    }

    /// Register an already-built descriptor.
    ///
    /// Fails with [`DescriptorError::IdAliasing`] when the identifier is taken; the table is left
    /// unchanged in that case.
    pub fn insert(&mut self, descriptor: Descriptor) -> Result<&Descriptor> {
        if self.contains(descriptor.id) {
            return Err(DescriptorError::IdAliasing { id: descriptor.id });
        }
        self.descriptors.push(descriptor);
        let last = self.descriptors.len() - 1;
        Ok(&self.descriptors[last])
    }

    /// Chaining form of [`register`](Self::register) for building a table in one expression.
    pub fn with(mut self, id: u8, framing: Framing, checksum: bool) -> Result<Self> {
        self.register(id, framing, checksum)?;
        Ok(self)
    }

    /// Find the descriptor for an identifier.
    pub fn lookup(&self, id: u8) -> Option<&Descriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    pub fn contains(&self, id: u8) -> bool {
        self.lookup(id).is_some()
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl<'a> IntoIterator for &'a DescriptorTable {
    type Item = &'a Descriptor;
    type IntoIter = std::slice::Iter<'a, Descriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let mut table = DescriptorTable::new();
        table.register(0x01, Framing::Sized(2), true).unwrap();
        table.register(0x02, Framing::Bounded, false).unwrap();

        let sized = table.lookup(0x01).unwrap();
        assert_eq!(sized.framing(), Framing::Sized(2));
        assert!(sized.checksum());

        let bounded = table.lookup(0x02).unwrap();
        assert_eq!(bounded.framing(), Framing::Bounded);
        assert!(!bounded.checksum());

        assert!(table.lookup(0x03).is_none());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn sized_zero_is_rejected() {
        let mut table = DescriptorTable::new();
        let err = table.register(0x10, Framing::Sized(0), false).unwrap_err();
        assert_eq!(err, DescriptorError::SizeNotSet { id: 0x10 });
        assert!(table.is_empty());
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut table = DescriptorTable::new();
        table.register(0x05, Framing::Bounded, false).unwrap();

        let err = table.register(0x05, Framing::Sized(4), true).unwrap_err();
        assert_eq!(err, DescriptorError::IdAliasing { id: 0x05 });

        // The original registration survives.
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(0x05).unwrap().framing(), Framing::Bounded);
    }

    #[test]
    fn iteration_keeps_registration_order() {
        let table = DescriptorTable::new()
            .with(0x30, Framing::Bounded, false)
            .and_then(|t| t.with(0x10, Framing::Sized(1), false))
            .and_then(|t| t.with(0x20, Framing::Sized(8), true))
            .unwrap();

        let ids: Vec<u8> = table.iter().map(Descriptor::id).collect();
        assert_eq!(ids, vec![0x30, 0x10, 0x20]);
    }

    #[test]
    fn framing_length() {
        assert_eq!(Framing::Bounded.length(), None);
        assert_eq!(Framing::Sized(3).length(), Some(3));
        assert!(Framing::Sized(3).is_sized());
        assert!(!Framing::Bounded.is_sized());
    }

    #[test]
    fn error_messages_name_the_identifier() {
        let err = Descriptor::sized(0x7A, 0, false).unwrap_err();
        assert!(err.to_string().contains("0x7A"));
    }
}
