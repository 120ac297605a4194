//! Immutable document locations.
//!
//! A [`Path`] is a persistent linked list of segments: extending a path shares
//! the parent's storage, so handing child paths out to every traversal event
//! stays cheap.

use std::fmt;
use std::rc::Rc;

/// A single step in a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object property name.
    Property(String),
    /// Array element index.
    Element(usize),
}

#[derive(Debug)]
struct PathNode {
    parent: Path,
    segment: PathSegment,
    len: usize,
}

/// Location of a value inside a document.
///
/// The empty path denotes the document root.
#[derive(Debug, Clone, Default)]
pub struct Path(Option<Rc<PathNode>>);

impl Path {
    /// The root path.
    pub fn root() -> Self {
        Self(None)
    }

    /// Returns a new path extended with a property segment.
    pub fn with_property(&self, name: impl Into<String>) -> Self {
        self.with_segment(PathSegment::Property(name.into()))
    }

    /// Returns a new path extended with an element segment.
    pub fn with_element(&self, index: usize) -> Self {
        self.with_segment(PathSegment::Element(index))
    }

    fn with_segment(&self, segment: PathSegment) -> Self {
        Self(Some(Rc::new(PathNode {
            parent: self.clone(),
            segment,
            len: self.len() + 1,
        })))
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.as_ref().map_or(0, |node| node.len)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_none()
    }

    /// Last segment, if any.
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.as_ref().map(|node| &node.segment)
    }

    /// Segments from the root down.
    pub fn segments(&self) -> Vec<PathSegment> {
        let mut segments = Vec::with_capacity(self.len());
        let mut current = self;
        while let Some(node) = &current.0 {
            segments.push(node.segment.clone());
            current = &node.parent;
        }
        segments.reverse();
        segments
    }

    /// Renders the path as an RFC 6901 JSON Pointer.
    pub fn to_pointer(&self) -> String {
        let mut out = String::new();
        for segment in self.segments() {
            out.push('/');
            match segment {
                PathSegment::Property(name) => {
                    out.push_str(&name.replace('~', "~0").replace('/', "~1"))
                }
                PathSegment::Element(index) => out.push_str(&index.to_string()),
            }
        }
        out
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        let (mut left, mut right) = (self, other);
        if left.len() != right.len() {
            return false;
        }
        loop {
            match (&left.0, &right.0) {
                (None, None) => return true,
                (Some(a), Some(b)) => {
                    if Rc::ptr_eq(a, b) {
                        return true;
                    }
                    if a.segment != b.segment {
                        return false;
                    }
                    left = &a.parent;
                    right = &b.parent;
                }
                _ => return false,
            }
        }
    }
}

impl Eq for Path {}

impl From<Vec<PathSegment>> for Path {
    fn from(segments: Vec<PathSegment>) -> Self {
        segments
            .into_iter()
            .fold(Path::root(), |path, segment| path.with_segment(segment))
    }
}

/// Normalized JSONPath form: `$['store']['book'][0]`.
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in self.segments() {
            match segment {
                PathSegment::Property(name) => {
                    f.write_str("['")?;
                    for ch in name.chars() {
                        match ch {
                            '\\' => f.write_str("\\\\")?,
                            '\'' => f.write_str("\\'")?,
                            _ => write!(f, "{ch}")?,
                        }
                    }
                    f.write_str("']")?;
                }
                PathSegment::Element(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn root_is_empty() {
        let root = Path::root();
        assert!(root.is_root());
        assert_eq!(root.len(), 0);
        assert!(root.segments().is_empty());
        assert_eq!(root.to_string(), "$");
    }

    #[test]
    fn extension_does_not_touch_parent() {
        let parent = Path::root().with_property("store");
        let child = parent.with_element(3);
        assert_eq!(parent.len(), 1);
        assert_eq!(
            child.segments(),
            vec![PathSegment::Property("store".into()), PathSegment::Element(3)]
        );
        assert_ne!(parent, child);
    }

    #[test]
    fn equality_is_structural() {
        let a = Path::root().with_property("a").with_element(0);
        let b = Path::from(vec![PathSegment::Property("a".into()), PathSegment::Element(0)]);
        assert_eq!(a, b);
        assert_ne!(a, Path::root().with_property("a").with_element(1));
        assert_ne!(
            Path::root().with_element(0),
            Path::root().with_property("0")
        );
    }

    #[test]
    fn renders_normalized_path_and_pointer() {
        let path = Path::root()
            .with_property("store")
            .with_property("it's/~")
            .with_element(2);
        assert_eq!(path.to_string(), r"$['store']['it\'s/~'][2]");
        assert_eq!(path.to_pointer(), "/store/it's~1~0/2");
    }

    fn segment() -> impl Strategy<Value = PathSegment> {
        prop_oneof![
            "[a-z]{0,4}".prop_map(PathSegment::Property),
            (0usize..16).prop_map(PathSegment::Element),
        ]
    }

    proptest! {
        #[test]
        fn equality_is_reflexive(segments in prop::collection::vec(segment(), 0..8)) {
            let path = Path::from(segments.clone());
            prop_assert_eq!(&path, &path);
            prop_assert_eq!(path.clone(), Path::from(segments));
        }

        #[test]
        fn with_property_never_equals_original(
            segments in prop::collection::vec(segment(), 0..8),
            name in "[a-z]{0,4}",
        ) {
            let path = Path::from(segments);
            prop_assert_ne!(path.with_property(name), path);
        }
    }
}
