//! TLV data model shared by the BER, SIMPLE and COMPACT codecs

pub mod ber;
pub mod compact;
pub mod simple;
pub mod tag;

use bytes::Bytes;
use derive_more::{Deref, DerefMut, From, IntoIterator};

use tag::Tag;

/// Payload of a [`TagValue`]
#[derive(Debug, Clone)]
pub enum Value {
    /// Flat value bytes
    Primitive(Bytes),
    /// Nested TLV objects
    Constructed(Vec<TagValue>),
}

/// A single TLV object
///
/// Equality is logical: the constructed bit of the tag and the SIMPLE-TLV
/// `skip_length` flag are encoding details and are not compared, and an empty
/// primitive value equals an empty constructed one.
#[derive(Debug, Clone)]
pub struct TagValue {
    /// Object tag
    pub tag: Tag,
    /// Value bytes or children
    pub value: Value,
    /// Omit the length field when encoding as SIMPLE-TLV
    pub skip_length: bool,
}

impl TagValue {
    /// Create a primitive object
    pub fn new(tag: impl Into<Tag>, value: impl Into<Bytes>) -> Self {
        Self {
            tag: tag.into(),
            value: Value::Primitive(value.into()),
            skip_length: false,
        }
    }

    /// Create a constructed object from its children
    pub fn constructed(tag: impl Into<Tag>, children: Vec<Self>) -> Self {
        Self {
            tag: tag.into(),
            value: Value::Constructed(children),
            skip_length: false,
        }
    }

    /// Create an object with an empty value
    pub fn empty(tag: impl Into<Tag>) -> Self {
        Self::new(tag, Bytes::new())
    }

    /// Omit the length field when encoding as SIMPLE-TLV
    pub const fn with_skip_length(mut self) -> Self {
        self.skip_length = true;
        self
    }

    /// Value bytes, or `None` for a constructed object
    pub const fn as_bytes(&self) -> Option<&Bytes> {
        match &self.value {
            Value::Primitive(bytes) => Some(bytes),
            Value::Constructed(_) => None,
        }
    }

    /// Children of a constructed object, empty for a primitive one
    pub fn children(&self) -> &[Self] {
        match &self.value {
            Value::Primitive(_) => &[],
            Value::Constructed(children) => children,
        }
    }

    /// Whether the object carries children
    pub const fn is_constructed(&self) -> bool {
        matches!(&self.value, Value::Constructed(children) if !children.is_empty())
    }
}

impl PartialEq for TagValue {
    fn eq(&self, other: &Self) -> bool {
        if !self.tag.matches(other.tag) {
            return false;
        }

        match (&self.value, &other.value) {
            (Value::Primitive(a), Value::Primitive(b)) => a == b,
            (Value::Constructed(a), Value::Constructed(b)) => a == b,
            (Value::Primitive(bytes), Value::Constructed(children))
            | (Value::Constructed(children), Value::Primitive(bytes)) => {
                bytes.is_empty() && children.is_empty()
            }
        }
    }
}

impl Eq for TagValue {}

/// An ordered list of TLV objects
///
/// Lookups compare tags exactly, so `85` and `A5` are different objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut, From, IntoIterator)]
#[into_iterator(owned, ref, ref_mut)]
pub struct TagValues(Vec<TagValue>);

impl TagValues {
    /// Create an empty list
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Unwrap into the underlying vector
    pub fn into_inner(self) -> Vec<TagValue> {
        self.0
    }

    /// First object carrying `tag`
    pub fn get(&self, tag: impl Into<Tag>) -> Option<&TagValue> {
        let tag = tag.into();
        self.0.iter().find(|tv| tv.tag == tag)
    }

    /// Walk into nested objects following `path`, one tag per level
    pub fn get_child(&self, path: &[Tag]) -> Option<&TagValue> {
        let (first, rest) = path.split_first()?;
        let mut current = self.get(*first)?;
        for tag in rest {
            current = current.children().iter().find(|tv| tv.tag == *tag)?;
        }
        Some(current)
    }

    /// Every object carrying `tag`, in order
    pub fn get_all(&self, tag: impl Into<Tag>) -> Vec<&TagValue> {
        let tag = tag.into();
        self.0.iter().filter(|tv| tv.tag == tag).collect()
    }

    /// Append an object
    pub fn put(&mut self, value: TagValue) {
        self.0.push(value);
    }

    /// Remove and return the first object carrying `tag`
    pub fn pop(&mut self, tag: impl Into<Tag>) -> Option<TagValue> {
        let tag = tag.into();
        let index = self.0.iter().position(|tv| tv.tag == tag)?;
        Some(self.0.remove(index))
    }

    /// Remove and return every object carrying `tag`
    pub fn pop_all(&mut self, tag: impl Into<Tag>) -> Self {
        let tag = tag.into();
        let (popped, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.0)
            .into_iter()
            .partition(|tv| tv.tag == tag);
        self.0 = kept;
        Self(popped)
    }

    /// Remove every object carrying `tag`, returning how many were removed
    pub fn delete_all(&mut self, tag: impl Into<Tag>) -> usize {
        let tag = tag.into();
        let before = self.0.len();
        self.0.retain(|tv| tv.tag != tag);
        before - self.0.len()
    }
}

impl FromIterator<TagValue> for TagValues {
    fn from_iter<I: IntoIterator<Item = TagValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TagValues {
        TagValues::from(vec![
            TagValue::new(0x50u8, vec![0x41, 0x42]),
            TagValue::constructed(
                0x61u8,
                vec![
                    TagValue::new(0x4Fu8, vec![0xA0, 0x00]),
                    TagValue::constructed(0x73u8, vec![TagValue::new(0x80u8, vec![0x01])]),
                ],
            ),
            TagValue::new(0x50u8, vec![0x43]),
        ])
    }

    #[test]
    fn test_equality_ignores_constructed_bit() {
        let a = TagValue::constructed(0x01u8, vec![TagValue::new(0x02u8, vec![3, 4])]);
        let b = TagValue::constructed(0x21u8, vec![TagValue::new(0x02u8, vec![3, 4])]);
        assert_eq!(a, b);

        assert_eq!(TagValue::empty(0x21u8), TagValue::constructed(0x21u8, vec![]));
        assert_ne!(TagValue::new(0x02u8, vec![1]), TagValue::new(0x02u8, vec![2]));
        assert_ne!(TagValue::new(0x02u8, vec![1]), TagValue::new(0x03u8, vec![1]));
    }

    #[test]
    fn test_get_and_get_child() {
        let tvs = sample();
        let name = tvs.get(0x50u8).and_then(TagValue::as_bytes).unwrap();
        assert_eq!(name.as_ref(), &[0x41, 0x42]);
        assert!(tvs.get(0x99u8).is_none());

        let leaf = tvs.get_child(&[Tag(0x61), Tag(0x73), Tag(0x80)]).unwrap();
        assert_eq!(leaf.as_bytes().unwrap().as_ref(), &[0x01]);
        assert!(tvs.get_child(&[Tag(0x61), Tag(0x99)]).is_none());
        assert!(tvs.get_child(&[]).is_none());
    }

    #[test]
    fn test_lookup_distinguishes_constructed_bit() {
        // FCP holding both a proprietary template and a proprietary primitive
        let fcp = ber::decode(&[
            0x62, 0x08, 0xA5, 0x02, 0x80, 0x00, 0x85, 0x02, 0xBE, 0xEF,
        ])
        .unwrap();
        let children = TagValues::from(fcp[0].children().to_vec());

        let primitive = children.get(0x85u8).unwrap();
        assert_eq!(primitive.tag, Tag(0x85));
        assert_eq!(primitive.as_bytes().unwrap().as_ref(), &[0xBE, 0xEF]);
        assert_eq!(children.get(0xA5u8).unwrap().tag, Tag(0xA5));
        assert_eq!(children.get_all(0x85u8).len(), 1);
        assert!(fcp.get_child(&[Tag(0x62), Tag(0x05)]).is_none());
        assert_eq!(
            fcp.get_child(&[Tag(0x62), Tag(0xA5), Tag(0x80)]).unwrap().tag,
            Tag(0x80)
        );

        let mut tvs = simple::decode(&[0x21, 0x01, 0xAA, 0x01, 0x01, 0xBB]).unwrap();
        assert_eq!(tvs.get(0x01u8).unwrap().as_bytes().unwrap().as_ref(), &[0xBB]);
        assert_eq!(tvs.delete_all(0x01u8), 1);
        assert!(tvs.pop(0x01u8).is_none());
        assert_eq!(tvs.pop_all(0x21u8).len(), 1);
        assert!(tvs.is_empty());
    }

    #[test]
    fn test_pop_and_delete() {
        let mut tvs = sample();
        assert_eq!(tvs.get_all(0x50u8).len(), 2);

        let first = tvs.pop(0x50u8).unwrap();
        assert_eq!(first.as_bytes().unwrap().as_ref(), &[0x41, 0x42]);
        assert_eq!(tvs.len(), 2);

        let mut tvs = sample();
        let popped = tvs.pop_all(0x50u8);
        assert_eq!(popped.len(), 2);
        assert_eq!(tvs.len(), 1);

        let mut tvs = sample();
        assert_eq!(tvs.delete_all(0x50u8), 2);
        assert_eq!(tvs.delete_all(0x50u8), 0);
        assert_eq!(tvs[0].tag, Tag(0x61));
    }
}
