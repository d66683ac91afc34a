//! Names of the objects in a data stream

use crate::{common::Name, error::AfpResult, util::NameGenerator};

/// The kinds of named objects
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Document
    Document,
    /// Named page group
    PageGroup,
    /// Page
    Page,
    /// Page overlay
    Overlay,
    /// IOCA image object
    Image,
    /// GOCA graphics object
    Graphics,
    /// Presentation text object
    Text,
    /// Active environment group of a page or overlay
    ActiveEnvironment,
    /// Object environment group of a data object
    ObjectEnvironment,
    /// Resource group
    ResourceGroup,
    /// IM image used for shading
    Shading,
}

impl ObjectKind {
    const ALL: [ObjectKind; 11] = [
        Self::Document,
        Self::PageGroup,
        Self::Page,
        Self::Overlay,
        Self::Image,
        Self::Graphics,
        Self::Text,
        Self::ActiveEnvironment,
        Self::ObjectEnvironment,
        Self::ResourceGroup,
        Self::Shading,
    ];

    /// The three letter prefix of generated names
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Document => "DOC",
            Self::PageGroup => "PGP",
            Self::Page => "PGN",
            Self::Overlay => "OVL",
            Self::Image => "IMG",
            Self::Graphics => "GRA",
            Self::Text => "PTO",
            Self::ActiveEnvironment => "AEG",
            Self::ObjectEnvironment => "OEG",
            Self::ResourceGroup => "RES",
            Self::Shading => "SHD",
        }
    }
}

/// Hands out unique names, one counter per kind
#[derive(Debug)]
pub struct Factory {
    generators: [NameGenerator; 11],
}

impl Default for Factory {
    fn default() -> Self {
        Self::new()
    }
}

impl Factory {
    /// Create a factory with all counters at 1
    pub fn new() -> Self {
        Self {
            generators: ObjectKind::ALL.map(|kind| NameGenerator::new(kind.prefix())),
        }
    }

    /// The next name for an object of the given kind
    pub fn name(&mut self, kind: ObjectKind) -> AfpResult<Name> {
        self.generators[kind as usize].next_name()
    }
}
