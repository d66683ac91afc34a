//! Containers above the page level

use std::io::Write;

use log::debug;

use crate::{
    common::Name,
    error::AfpResult,
    field::{SfId, StructuredField},
    write::{Formatter, Serialize},
};

use super::page::{PageArena, PageHandle};

/// An entry of a document or page group
pub(crate) enum Child {
    /// A field that is not part of any page
    Field(StructuredField),
    /// A page, written once it is complete
    Page(PageHandle),
    /// A page group, written once it is ended
    Group(PageGroup),
}

impl Child {
    fn is_complete(&self, pages: &PageArena) -> bool {
        match self {
            Self::Field(_) => true,
            Self::Page(handle) => pages.get(*handle).map_or(false, |p| p.complete),
            Self::Group(group) => group.complete,
        }
    }

    fn write<W: Write>(self, pages: &mut PageArena, f: &mut Formatter<W>) -> AfpResult<()> {
        match self {
            Self::Field(field) => f.field(&field),
            Self::Page(handle) => match pages.take(handle) {
                Some(page) => page.write(f),
                None => Ok(()),
            },
            Self::Group(group) => {
                f.field(&StructuredField::begin(SfId::BNG, group.name))?;
                for child in group.children {
                    child.write(pages, f)?;
                }
                f.field(&StructuredField::end(SfId::ENG, group.name))
            }
        }
    }
}

/// A named group of pages
pub(crate) struct PageGroup {
    pub(crate) name: Name,
    pub(crate) children: Vec<Child>,
    pub(crate) complete: bool,
}

impl PageGroup {
    pub(crate) fn new(name: Name) -> Self {
        Self {
            name,
            children: Vec::new(),
            complete: false,
        }
    }
}

/// The root of the object tree
pub(crate) struct Document {
    pub(crate) name: Name,
    pub(crate) children: Vec<Child>,
}

impl Document {
    pub(crate) fn new(name: Name) -> Self {
        Self {
            name,
            children: Vec::new(),
        }
    }

    /// The page group that is currently open
    pub(crate) fn open_group(&mut self) -> Option<&mut PageGroup> {
        match self.children.last_mut() {
            Some(Child::Group(group)) if !group.complete => Some(group),
            _ => None,
        }
    }

    /// Add to the open page group, or to the document
    pub(crate) fn push(&mut self, child: Child) {
        match self.open_group() {
            Some(group) => group.children.push(child),
            None => self.children.push(child),
        }
    }

    /// Queue all complete children up to the first incomplete one
    ///
    /// Returns the number of children that were written.
    pub(crate) fn flush<W: Write>(
        &mut self,
        pages: &mut PageArena,
        f: &mut Formatter<W>,
    ) -> AfpResult<usize> {
        let ready = self
            .children
            .iter()
            .take_while(|c| c.is_complete(pages))
            .count();
        for child in self.children.drain(..ready) {
            child.write(pages, f)?;
        }
        if ready > 0 {
            debug!(
                "Flushed {} object(s) of {}, {} page(s) pending",
                ready,
                self.name,
                pages.live()
            );
        }
        Ok(ready)
    }

    /// Whether every child has been written
    pub(crate) fn is_drained(&self) -> bool {
        self.children.is_empty()
    }
}
