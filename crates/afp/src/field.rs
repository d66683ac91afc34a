//! Structured field framing
//!
//! Every record of a MO:DCA data stream has the same shape:
//!
//! ```text
//! 0x5A | length (u16, BE) | class | type | category | flags | reserved (2) | payload
//! ```
//!
//! The length counts the 8 byte introducer and the payload, but not the
//! leading carriage control byte.

use std::fmt;

use bitflags::bitflags;

use crate::{
    common::Name,
    error::{AfpError, AfpResult},
};

/// The carriage control character that starts every structured field
pub const CARRIAGE_CONTROL: u8 = 0x5A;

/// Length of the introducer (length, id, flags, reserved)
pub const INTRODUCER_LEN: usize = 8;

/// Length of the introducer plus carriage control byte
pub const HEADER_LEN: usize = INTRODUCER_LEN + 1;

/// Hard maximum of the length slot
pub const MAX_FIELD_LEN: usize = 32767;

/// Payload limit of fields that are split in fixed size pieces
pub const MAX_DATA_LEN: usize = 8192;

/// The structured field identifier (class, type, category)
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SfId(pub [u8; 3]);

macro_rules! sf_ids {
    ($($(#[$m:meta])* $name:ident = $ty:literal $cat:literal;)*) => {
        impl SfId {
            $(
                $(#[$m])*
                pub const $name: SfId = SfId([0xD3, $ty, $cat]);
            )*

            /// The three letter mnemonic of a known field
            pub fn mnemonic(&self) -> Option<&'static str> {
                match *self {
                    $(Self::$name => Some(stringify!($name)),)*
                    _ => None,
                }
            }
        }
    };
}

sf_ids! {
    /// Begin Document
    BDT = 0xA8 0xA8;
    /// End Document
    EDT = 0xA9 0xA8;
    /// Begin Named Page Group
    BNG = 0xA8 0xAD;
    /// End Named Page Group
    ENG = 0xA9 0xAD;
    /// Begin Page
    BPG = 0xA8 0xAF;
    /// End Page
    EPG = 0xA9 0xAF;
    /// Begin Overlay
    BMO = 0xA8 0xDF;
    /// End Overlay
    EMO = 0xA9 0xDF;
    /// Begin Resource Group
    BRG = 0xA8 0xC6;
    /// End Resource Group
    ERG = 0xA9 0xC6;
    /// Begin Active Environment Group
    BAG = 0xA8 0xC9;
    /// End Active Environment Group
    EAG = 0xA9 0xC9;
    /// Begin Object Environment Group
    BOG = 0xA8 0xC7;
    /// End Object Environment Group
    EOG = 0xA9 0xC7;
    /// Begin Presentation Text Object
    BPT = 0xA8 0x9B;
    /// End Presentation Text Object
    EPT = 0xA9 0x9B;
    /// Presentation Text Data
    PTX = 0xEE 0x9B;
    /// Presentation Text Data Descriptor
    PTD = 0xB1 0x9B;
    /// Begin Image Object (IOCA)
    BIM = 0xA8 0xFB;
    /// End Image Object
    EIM = 0xA9 0xFB;
    /// Image Picture Data
    IPD = 0xEE 0xFB;
    /// Image Data Descriptor
    IDD = 0xA6 0xFB;
    /// Begin Graphics Object (GOCA)
    BGR = 0xA8 0xBB;
    /// End Graphics Object
    EGR = 0xA9 0xBB;
    /// Graphics Data
    GAD = 0xEE 0xBB;
    /// Graphics Data Descriptor
    GDD = 0xA6 0xBB;
    /// Begin IM Image
    BII = 0xA8 0x7B;
    /// End IM Image
    EII = 0xA9 0x7B;
    /// IM Image Output Control
    IOC = 0xA7 0x7B;
    /// IM Image Input Descriptor
    IID = 0xA6 0x7B;
    /// IM Image Cell Position
    ICP = 0xAC 0x7B;
    /// IM Image Raster Data
    IRD = 0xEE 0x7B;
    /// Object Area Descriptor
    OBD = 0xA6 0x6B;
    /// Object Area Position
    OBP = 0xAC 0x6B;
    /// Map Image Object
    MIO = 0xAB 0xFB;
    /// Map Graphics Object
    MGO = 0xAB 0xBB;
    /// Page Descriptor
    PGD = 0xA6 0xAF;
    /// Map Coded Font
    MCF = 0xAB 0x8A;
    /// Map Page Overlay
    MPO = 0xAB 0xD8;
    /// Include Page Overlay
    IPO = 0xAF 0xD8;
    /// Include Page Segment
    IPS = 0xAF 0x5F;
    /// Invoke Medium Map
    IMM = 0xAB 0xCC;
    /// Tag Logical Element
    TLE = 0xA0 0x90;
    /// No Operation
    NOP = 0xEE 0xEE;
}

impl SfId {
    /// Whether this field opens a bracket
    pub fn is_begin(&self) -> bool {
        self.0[0] == 0xD3 && self.0[1] == 0xA8
    }

    /// Whether this field closes a bracket
    pub fn is_end(&self) -> bool {
        self.0[0] == 0xD3 && self.0[1] == 0xA9
    }

    /// The begin field matching this end field
    pub fn matching_begin(&self) -> Option<SfId> {
        if self.is_end() {
            Some(SfId([0xD3, 0xA8, self.0[2]]))
        } else {
            None
        }
    }

    /// The end field matching this begin field
    pub fn matching_end(&self) -> Option<SfId> {
        if self.is_begin() {
            Some(SfId([0xD3, 0xA9, self.0[2]]))
        } else {
            None
        }
    }
}

impl fmt::Debug for SfId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mnemonic() {
            Some(m) => write!(f, "{}", m),
            None => write!(f, "{:02X}{:02X}{:02X}", self.0[0], self.0[1], self.0[2]),
        }
    }
}

impl fmt::Display for SfId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

bitflags! {
    /// The flag byte of the introducer
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct SfFlags: u8 {
        /// An extension follows the introducer
        const EXTENSION = 0x80;
        /// The data is continued in the next field
        const SEGMENTED = 0x20;
        /// Padding is present at the end of the data
        const PADDING = 0x08;
    }
}

/// The largest payload allowed for a given field
pub fn max_payload_for(id: SfId) -> usize {
    match id {
        SfId::IPD | SfId::PTX | SfId::IRD => MAX_DATA_LEN,
        _ => MAX_FIELD_LEN - INTRODUCER_LEN,
    }
}

/// Encode one structured field
pub fn encode_field(id: SfId, flags: SfFlags, payload: &[u8]) -> AfpResult<Vec<u8>> {
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    encode_field_into(&mut out, id, flags, payload)?;
    Ok(out)
}

/// Encode one structured field, appending it to `out`
pub fn encode_field_into(
    out: &mut Vec<u8>,
    id: SfId,
    flags: SfFlags,
    payload: &[u8],
) -> AfpResult<()> {
    let max = max_payload_for(id);
    if payload.len() > max {
        return Err(AfpError::PayloadTooLarge {
            id,
            len: payload.len(),
            max,
        });
    }
    let len = (INTRODUCER_LEN + payload.len()) as u16;
    out.push(CARRIAGE_CONTROL);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&id.0);
    out.push(flags.bits());
    out.extend_from_slice(&[0x00, 0x00]);
    out.extend_from_slice(payload);
    Ok(())
}

/// The header template for fields that are split by the chunk writer
///
/// The length slot is at offset 1, two bytes wide.
pub fn header_template(id: SfId, flags: SfFlags) -> [u8; HEADER_LEN] {
    [
        CARRIAGE_CONTROL,
        0x00,
        0x00,
        id.0[0],
        id.0[1],
        id.0[2],
        flags.bits(),
        0x00,
        0x00,
    ]
}

/// The decoded introducer of a structured field
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FieldHeader {
    /// Length of introducer plus payload
    pub length: u16,
    /// The identifier
    pub id: SfId,
    /// The flags
    pub flags: SfFlags,
}

impl FieldHeader {
    /// The number of payload bytes following the header
    pub fn payload_len(&self) -> usize {
        usize::from(self.length).saturating_sub(INTRODUCER_LEN)
    }
}

/// Decode the header of an encoded structured field
///
/// Returns `None` if the input is shorter than a header or does not start
/// with the carriage control byte.
pub fn decode_header(bytes: &[u8]) -> Option<FieldHeader> {
    match bytes {
        [CARRIAGE_CONTROL, l0, l1, c, t, k, flags, _, _, ..] => Some(FieldHeader {
            length: u16::from_be_bytes([*l0, *l1]),
            id: SfId([*c, *t, *k]),
            flags: SfFlags::from_bits_retain(*flags),
        }),
        _ => None,
    }
}

/// The shape of a structured field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Opens a named bracket, the triplets follow the name
    Begin {
        /// The name of the object
        name: Name,
        /// Triplets after the name
        triplets: Vec<u8>,
    },
    /// Closes a named bracket
    End {
        /// The name of the object
        name: Name,
    },
    /// Any other field
    Data {
        /// The payload
        payload: Vec<u8>,
    },
}

/// A structured field that is not yet encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredField {
    /// The identifier
    pub id: SfId,
    /// The flags
    pub flags: SfFlags,
    /// The content
    pub kind: FieldKind,
}

impl StructuredField {
    /// Begin field of a named object
    pub fn begin(id: SfId, name: Name) -> Self {
        Self::begin_with(id, name, Vec::new())
    }

    /// Begin field of a named object with triplets
    pub fn begin_with(id: SfId, name: Name, triplets: Vec<u8>) -> Self {
        Self {
            id,
            flags: SfFlags::empty(),
            kind: FieldKind::Begin { name, triplets },
        }
    }

    /// End field of a named object
    pub fn end(id: SfId, name: Name) -> Self {
        Self {
            id,
            flags: SfFlags::empty(),
            kind: FieldKind::End { name },
        }
    }

    /// Data field
    pub fn data(id: SfId, payload: Vec<u8>) -> Self {
        Self {
            id,
            flags: SfFlags::empty(),
            kind: FieldKind::Data { payload },
        }
    }

    /// Data field whose payload is checked against [`max_payload_for`]
    pub fn checked_data(id: SfId, payload: Vec<u8>) -> AfpResult<Self> {
        let max = max_payload_for(id);
        if payload.len() > max {
            return Err(AfpError::PayloadTooLarge {
                id,
                len: payload.len(),
                max,
            });
        }
        Ok(Self::data(id, payload))
    }

    /// The number of bytes of the payload
    pub fn payload_len(&self) -> usize {
        match &self.kind {
            FieldKind::Begin { triplets, .. } => 8 + triplets.len(),
            FieldKind::End { .. } => 8,
            FieldKind::Data { payload } => payload.len(),
        }
    }

    /// Append the encoding of this field to `out`
    pub fn encode_into(&self, out: &mut Vec<u8>) -> AfpResult<()> {
        match &self.kind {
            FieldKind::Begin { name, triplets } => {
                let mut payload = Vec::with_capacity(8 + triplets.len());
                payload.extend_from_slice(name.as_bytes());
                payload.extend_from_slice(triplets);
                encode_field_into(out, self.id, self.flags, &payload)
            }
            FieldKind::End { name } => encode_field_into(out, self.id, self.flags, name.as_bytes()),
            FieldKind::Data { payload } => encode_field_into(out, self.id, self.flags, payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_roundtrip() {
        let payload = [1u8, 2, 3, 4, 5];
        let bytes = encode_field(SfId::NOP, SfFlags::empty(), &payload).unwrap();
        let header = decode_header(&bytes).unwrap();
        assert_eq!(usize::from(header.length), payload.len() + INTRODUCER_LEN);
        assert_eq!(header.id, SfId::NOP);
        assert_eq!(header.payload_len(), 5);
        assert_eq!(&bytes[HEADER_LEN..], &payload);
    }

    #[test]
    fn test_encode_max_sizes() {
        let max = max_payload_for(SfId::GAD);
        let bytes = encode_field(SfId::GAD, SfFlags::empty(), &vec![0; max]).unwrap();
        assert_eq!(decode_header(&bytes).unwrap().length, 32767);

        match encode_field(SfId::IPD, SfFlags::empty(), &vec![0; MAX_DATA_LEN + 1]) {
            Err(AfpError::PayloadTooLarge { id, len, max }) => {
                assert_eq!(id, SfId::IPD);
                assert_eq!(len, 8193);
                assert_eq!(max, 8192);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_checked_data() {
        let max = max_payload_for(SfId::NOP);
        assert!(StructuredField::checked_data(SfId::NOP, vec![0x40; max]).is_ok());
        assert!(matches!(
            StructuredField::checked_data(SfId::NOP, vec![0x40; max + 1]),
            Err(AfpError::PayloadTooLarge { id: SfId::NOP, .. })
        ));
    }

    #[test]
    fn test_named_bracket() {
        let name = Name::new("PGN00001");
        let mut out = vec![];
        StructuredField::begin(SfId::BPG, name)
            .encode_into(&mut out)
            .unwrap();
        assert_eq!(
            &out[..9],
            &[0x5A, 0x00, 0x10, 0xD3, 0xA8, 0xAF, 0x00, 0x00, 0x00]
        );
        assert_eq!(&out[9..], name.as_bytes());
        assert_eq!(SfId::BPG.matching_end(), Some(SfId::EPG));
        assert_eq!(SfId::EDT.matching_begin(), Some(SfId::BDT));
        assert_eq!(SfId::IPD.matching_end(), None);
        assert_eq!(format!("{}", SfId::BPG), "BPG");
    }

    #[test]
    fn test_decode_short() {
        assert_eq!(decode_header(&[0x5A, 0x00]), None);
        assert_eq!(decode_header(&[0x00; 9]), None);
    }
}
