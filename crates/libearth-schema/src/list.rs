//! Lazy lists for descriptors declared `multiple`.
//!
//! An [`ElementList`] makes the parser consume the stream only as far as the
//! requested offset: `get(0)` returns as soon as the first child has been
//! read, while `len()` has to read until the owning element ends.

use crate::document::Element;
use libearth_core::Result;
use std::fmt;
use std::marker::PhantomData;

/// Item type of an [`ElementList`].
///
/// Implemented for [`Element`] (multiple child elements) and [`String`]
/// (multiple text children).
pub trait ListItem<'d>: Sized {
    /// Number of items stored so far under `attribute` of `owner`.
    fn count(owner: &Element<'d>, attribute: &str) -> usize;

    /// Item at `index`, if it has been read.
    fn at(owner: &Element<'d>, attribute: &str, index: usize) -> Option<Self>;
}

impl<'d> ListItem<'d> for Element<'d> {
    fn count(owner: &Element<'d>, attribute: &str) -> usize {
        owner.slot_len(attribute)
    }

    fn at(owner: &Element<'d>, attribute: &str, index: usize) -> Option<Self> {
        owner.slot_child(attribute, index)
    }
}

impl<'d> ListItem<'d> for String {
    fn count(owner: &Element<'d>, attribute: &str) -> usize {
        owner.slot_len(attribute)
    }

    fn at(owner: &Element<'d>, attribute: &str, index: usize) -> Option<Self> {
        owner.slot_text(attribute, index)
    }
}

/// List-like view of multiple children that reads them on demand.
pub struct ElementList<'d, T> {
    owner: Element<'d>,
    attribute: String,
    marker: PhantomData<fn() -> T>,
}

impl<'d, T: ListItem<'d>> ElementList<'d, T> {
    pub(crate) fn new(owner: Element<'d>, attribute: &str) -> Self {
        Self {
            owner,
            attribute: attribute.to_string(),
            marker: PhantomData,
        }
    }

    /// Whether every item has been read, i.e. the owning element has ended.
    pub fn consumes_all(&self) -> bool {
        self.owner.is_closed()
    }

    /// Pulls events until `done` holds or no more items can arrive.
    fn consume_buffer(&self, done: impl Fn() -> bool) -> Result<()> {
        while !done() && !self.consumes_all() {
            if !self.owner.pull()? {
                break;
            }
        }
        Ok(())
    }

    /// Number of items. Reads until the owning element ends.
    ///
    /// # Errors
    ///
    /// Any stream error met while reading.
    pub fn len(&self) -> Result<usize> {
        self.consume_buffer(|| false)?;
        Ok(T::count(&self.owner, &self.attribute))
    }

    /// Whether the list has no items. Reads only until the first item.
    ///
    /// # Errors
    ///
    /// Any stream error met while reading.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.get(0)?.is_none())
    }

    /// Item at `index`, reading only as far as needed.
    ///
    /// # Errors
    ///
    /// Any stream error met while reading.
    pub fn get(&self, index: usize) -> Result<Option<T>> {
        self.consume_buffer(|| T::count(&self.owner, &self.attribute) > index)?;
        Ok(T::at(&self.owner, &self.attribute, index))
    }

    /// Iterates lazily, reading between items.
    pub fn iter(&self) -> Iter<'_, 'd, T> {
        Iter {
            list: self,
            index: 0,
            failed: false,
        }
    }

    /// Reads every item.
    ///
    /// # Errors
    ///
    /// Any stream error met while reading.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        self.iter().collect()
    }

    /// Items read so far, without touching the stream.
    pub fn loaded(&self) -> Vec<T> {
        (0..T::count(&self.owner, &self.attribute))
            .filter_map(|index| T::at(&self.owner, &self.attribute, index))
            .collect()
    }
}

impl<'d, T: ListItem<'d> + fmt::Debug> fmt::Debug for ElementList<'d, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ElementList ")?;
        let mut list = f.debug_list();
        list.entries(self.loaded());
        if !self.consumes_all() {
            list.entry(&format_args!("..."));
        }
        list.finish()
    }
}

/// Lazy iterator over an [`ElementList`].
///
/// Yields `Err` once and then stops if the stream fails.
pub struct Iter<'l, 'd, T> {
    list: &'l ElementList<'d, T>,
    index: usize,
    failed: bool,
}

impl<'d, T: ListItem<'d>> Iterator for Iter<'_, 'd, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.list.get(self.index) {
            Ok(Some(item)) => {
                self.index += 1;
                Some(Ok(item))
            }
            Ok(None) => None,
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

impl<'l, 'd, T: ListItem<'d>> IntoIterator for &'l ElementList<'d, T> {
    type Item = Result<T>;
    type IntoIter = Iter<'l, 'd, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
