//! Hierarchical dataset files.
//!
//! An `.hds` file is a tree of named groups and typed datasets. Both carry
//! typed scalar attributes. Each dataset picks its own compression.
//!
//! # On-disk layout
//!
//! ```text
//! "ARXH" | version: u32 BE | body (bincode) | crc32(body): u32 BE
//! ```
//!
//! Dataset payloads are bincode-encoded and compressed individually inside
//! the body, so a reader only pays for the compression the writer chose.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::text::Compression;

const MAGIC: &[u8; 4] = b"ARXH";
const VERSION: u32 = 1;

/// Storage type of a dataset or attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dtype {
    I8,
    I32,
    U32,
    U64,
    F64,
    Str,
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::I8 => "i8",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F64 => "f64",
            Self::Str => "string",
        };
        f.write_str(s)
    }
}

/// Contents of a dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ArrayData {
    I8(Vec<i8>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    F64(Vec<f64>),
    Str(Vec<String>),
}

impl ArrayData {
    pub fn dtype(&self) -> Dtype {
        match self {
            Self::I8(_) => Dtype::I8,
            Self::I32(_) => Dtype::I32,
            Self::U32(_) => Dtype::U32,
            Self::U64(_) => Dtype::U64,
            Self::F64(_) => Dtype::F64,
            Self::Str(_) => Dtype::Str,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::I8(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::U64(v) => v.len(),
            Self::F64(v) => v.len(),
            Self::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

macro_rules! array_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(impl From<Vec<$t>> for ArrayData {
            fn from(v: Vec<$t>) -> Self {
                Self::$variant(v)
            }
        })*
    };
}

array_from!(i8 => I8, i32 => I32, u32 => U32, u64 => U64, f64 => F64, String => Str);

/// A typed scalar attribute value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    I8(i8),
    I32(i32),
    U32(u32),
    U64(u64),
    F64(f64),
    Str(String),
}

impl AttrValue {
    pub fn dtype(&self) -> Dtype {
        match self {
            Self::I8(_) => Dtype::I8,
            Self::I32(_) => Dtype::I32,
            Self::U32(_) => Dtype::U32,
            Self::U64(_) => Dtype::U64,
            Self::F64(_) => Dtype::F64,
            Self::Str(_) => Dtype::Str,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Any integer attribute widened to `u64`; negative values yield `None`.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::I8(x) => u64::try_from(*x).ok(),
            Self::I32(x) => u64::try_from(*x).ok(),
            Self::U32(x) => Some(u64::from(*x)),
            Self::U64(x) => Some(*x),
            Self::F64(_) | Self::Str(_) => None,
        }
    }
}

macro_rules! attr_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(impl From<$t> for AttrValue {
            fn from(v: $t) -> Self {
                Self::$variant(v)
            }
        })*
    };
}

attr_from!(i8 => I8, i32 => I32, u32 => U32, u64 => U64, f64 => F64, String => Str);

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

/// A typed array with attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    data: ArrayData,
    scalar: bool,
    compression: Compression,
    attrs: BTreeMap<String, AttrValue>,
}

impl Dataset {
    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn into_data(self) -> ArrayData {
        self.data
    }

    pub fn dtype(&self) -> Dtype {
        self.data.dtype()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether this dataset was written as a single scalar value.
    pub fn is_scalar(&self) -> bool {
        self.scalar
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.attrs.insert(name.into(), value.into());
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    pub fn attrs(&self) -> &BTreeMap<String, AttrValue> {
        &self.attrs
    }
}

/// A member of a group.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Group(Group),
    Dataset(Dataset),
}

/// Named children in insertion order, plus attributes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Group {
    attrs: BTreeMap<String, AttrValue>,
    children: Vec<(String, Node)>,
    /// Position of each child in `children`.
    index: HashMap<String, usize>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, name: &str, node: Node) -> StoreResult<&mut Node> {
        if name.is_empty() || name.contains('/') {
            return Err(StoreError::Corrupt(format!("invalid member name {name:?}")));
        }
        if self.contains(name) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }
        let idx = self.children.len();
        self.index.insert(name.to_string(), idx);
        self.children.push((name.to_string(), node));
        Ok(&mut self.children[idx].1)
    }

    /// Add an empty child group.
    pub fn create_group(&mut self, name: &str) -> StoreResult<&mut Group> {
        match self.insert(name, Node::Group(Group::new()))? {
            Node::Group(g) => Ok(g),
            Node::Dataset(_) => Err(StoreError::WrongKind {
                path: name.to_string(),
                expected: "group",
            }),
        }
    }

    /// Add a one-dimensional dataset.
    pub fn create_dataset(
        &mut self,
        name: &str,
        data: impl Into<ArrayData>,
        compression: Compression,
    ) -> StoreResult<&mut Dataset> {
        let ds = Dataset {
            data: data.into(),
            scalar: false,
            compression,
            attrs: BTreeMap::new(),
        };
        match self.insert(name, Node::Dataset(ds))? {
            Node::Dataset(d) => Ok(d),
            Node::Group(_) => Err(StoreError::WrongKind {
                path: name.to_string(),
                expected: "dataset",
            }),
        }
    }

    /// Add a scalar dataset holding exactly one value.
    pub fn create_scalar(&mut self, name: &str, data: impl Into<ArrayData>) -> StoreResult<&mut Dataset> {
        let data = data.into();
        if data.len() != 1 {
            return Err(StoreError::ShapeMismatch {
                what: format!("scalar dataset {name}"),
                expected: 1,
                actual: data.len(),
            });
        }
        let ds = self.create_dataset(name, data, Compression::None)?;
        ds.scalar = true;
        Ok(ds)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.index.get(name).map(|&i| &self.children[i].1)
    }

    /// Child group by name.
    pub fn group(&self, name: &str) -> StoreResult<&Group> {
        match self.get(name) {
            Some(Node::Group(g)) => Ok(g),
            Some(Node::Dataset(_)) => Err(StoreError::WrongKind {
                path: name.to_string(),
                expected: "group",
            }),
            None => Err(StoreError::NotFound(name.to_string())),
        }
    }

    /// Child dataset by name.
    pub fn dataset(&self, name: &str) -> StoreResult<&Dataset> {
        match self.get(name) {
            Some(Node::Dataset(d)) => Ok(d),
            Some(Node::Group(_)) => Err(StoreError::WrongKind {
                path: name.to_string(),
                expected: "dataset",
            }),
            None => Err(StoreError::NotFound(name.to_string())),
        }
    }

    /// Walk a `/`-separated path of nested groups.
    pub fn group_at(&self, path: &str) -> StoreResult<&Group> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |g, part| g.group(part))
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(n, node)| (n.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.attrs.insert(name.into(), value.into());
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Attribute that must be present.
    pub fn require_attr(&self, name: &str) -> StoreResult<&AttrValue> {
        self.attrs.get(name).ok_or_else(|| StoreError::MissingAttribute {
            path: String::from("<group>"),
            name: name.to_string(),
        })
    }

    pub fn attrs(&self) -> &BTreeMap<String, AttrValue> {
        &self.attrs
    }
}

#[derive(Serialize, Deserialize)]
struct WireGroup {
    attrs: BTreeMap<String, AttrValue>,
    children: Vec<(String, WireNode)>,
}

#[derive(Serialize, Deserialize)]
enum WireNode {
    Group(WireGroup),
    Dataset(WireDataset),
}

#[derive(Serialize, Deserialize)]
struct WireDataset {
    attrs: BTreeMap<String, AttrValue>,
    scalar: bool,
    compression: Compression,
    len: u64,
    payload: Vec<u8>,
}

fn ser_err(e: bincode::Error) -> StoreError {
    StoreError::Serialization(e.to_string())
}

impl WireGroup {
    fn encode(group: &Group) -> StoreResult<Self> {
        let mut children = Vec::with_capacity(group.children.len());
        for (name, node) in &group.children {
            let wire = match node {
                Node::Group(g) => WireNode::Group(Self::encode(g)?),
                Node::Dataset(d) => {
                    let raw = bincode::serialize(&d.data).map_err(ser_err)?;
                    WireNode::Dataset(WireDataset {
                        attrs: d.attrs.clone(),
                        scalar: d.scalar,
                        compression: d.compression,
                        len: d.data.len() as u64,
                        payload: d.compression.compress(&raw)?,
                    })
                }
            };
            children.push((name.clone(), wire));
        }
        Ok(Self {
            attrs: group.attrs.clone(),
            children,
        })
    }

    fn decode(self) -> StoreResult<Group> {
        let mut group = Group {
            attrs: self.attrs,
            ..Group::default()
        };
        for (name, node) in self.children {
            let node = match node {
                WireNode::Group(g) => Node::Group(g.decode()?),
                WireNode::Dataset(d) => {
                    let raw = d.compression.decompress(&d.payload)?;
                    let data: ArrayData = bincode::deserialize(&raw).map_err(ser_err)?;
                    if data.len() as u64 != d.len {
                        return Err(StoreError::Corrupt(format!(
                            "dataset {name}: declared {} elements, found {}",
                            d.len,
                            data.len()
                        )));
                    }
                    Node::Dataset(Dataset {
                        data,
                        scalar: d.scalar,
                        compression: d.compression,
                        attrs: d.attrs,
                    })
                }
            };
            group.insert(&name, node).map_err(|e| match e {
                StoreError::AlreadyExists(n) => StoreError::Corrupt(format!("duplicate member {n:?}")),
                other => other,
            })?;
        }
        Ok(group)
    }
}

/// An in-memory hierarchical dataset file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HdsFile {
    root: Group,
}

impl HdsFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &Group {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Group {
        &mut self.root
    }

    /// Serialize to the on-disk byte layout.
    pub fn to_bytes(&self) -> StoreResult<Vec<u8>> {
        let body = bincode::serialize(&WireGroup::encode(&self.root)?).map_err(ser_err)?;
        let mut out = Vec::with_capacity(body.len() + 12);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_be_bytes());
        out.extend_from_slice(&body);
        out.extend_from_slice(&crc32fast::hash(&body).to_be_bytes());
        Ok(out)
    }

    /// Parse the on-disk byte layout, checking magic, version and CRC.
    pub fn from_bytes(bytes: &[u8]) -> StoreResult<Self> {
        if bytes.len() < 12 {
            return Err(StoreError::Corrupt("file too short".into()));
        }
        if &bytes[0..4] != MAGIC {
            return Err(StoreError::InvalidMagic {
                expected: "ARXH".into(),
                actual: String::from_utf8_lossy(&bytes[0..4]).into(),
            });
        }
        let version = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if version != VERSION {
            return Err(StoreError::UnsupportedVersion(version));
        }
        let (body, trailer) = bytes[8..].split_at(bytes.len() - 12);
        let expected = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let computed = crc32fast::hash(body);
        if expected != computed {
            return Err(StoreError::CrcMismatch { expected, computed });
        }
        let wire: WireGroup = bincode::deserialize(body).map_err(ser_err)?;
        Ok(Self {
            root: wire.decode()?,
        })
    }

    /// Write to `path`, replacing any existing file.
    pub fn write(&self, path: &Path) -> StoreResult<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, &bytes).map_err(|e| StoreError::file(path, e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote hds file");
        Ok(())
    }

    pub fn open(path: &Path) -> StoreResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| StoreError::file(path, e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "opened hds file");
        Self::from_bytes(&bytes)
    }
}
