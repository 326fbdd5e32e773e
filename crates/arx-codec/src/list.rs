//! Recursive list codec.
//!
//! A [`Value`] tree is first lowered to a [`ListNode`] tree. Values with no
//! inline encoding (data frames, host objects) are cut out into an ordered
//! side-list and replaced by [`ListNode::External`] indices. The node tree is
//! then written as JSON or as nested hierarchical groups; both forms carry the
//! same node kinds and the same external numbering.

use arx_store::{AttrValue, Compression, Group, HdsFile};
use arx_types::{AtomicVector, ElementType, Factor, List, Scalar, Value, VectorData, MISSING_CODE};
use serde_json::{json, Map, Value as Json};

use crate::error::{CodecError, CodecResult};
use crate::factor::{read_factor, write_factor};
use crate::vector::{
    read_integers, read_names, read_scalar, read_vector, scalar_from_json, scalar_to_json,
    vector_from_json, vector_to_json, write_names, write_scalar, write_vector,
};

/// Version stamped on JSON list documents.
pub const JSON_VERSION: &str = "1.2";
/// Version stamped on hierarchical list files.
pub const HDS_VERSION: &str = "1.3";
/// Name of the top-level group in a hierarchical list file.
pub const ROOT_GROUP: &str = "simple_list";

const NODE_ATTR: &str = "node_kind";
const TYPE_ATTR: &str = "element_type";
const VERSION_ATTR: &str = "version";

/// One node of an encoded list tree.
#[derive(Clone, Debug, PartialEq)]
pub enum ListNode {
    Nothing,
    Scalar(Scalar),
    Vector(AtomicVector),
    Factor(Factor),
    List {
        children: Vec<ListNode>,
        names: Option<Vec<String>>,
    },
    /// Index into the external side-list.
    External(usize),
}

/// A lowered tree plus the values cut out of it, in first-encounter order.
#[derive(Debug)]
pub struct EncodedList<'a> {
    pub root: ListNode,
    pub externals: Vec<&'a Value>,
}

/// Lower a value tree. Externals are never deduplicated.
pub fn encode(value: &Value) -> EncodedList<'_> {
    let mut externals = Vec::new();
    let root = lower(value, &mut externals);
    EncodedList { root, externals }
}

fn lower<'a>(value: &'a Value, externals: &mut Vec<&'a Value>) -> ListNode {
    match value {
        Value::Nothing => ListNode::Nothing,
        Value::Scalar(s) => ListNode::Scalar(s.clone()),
        Value::Vector(v) => ListNode::Vector(v.clone()),
        Value::Factor(f) => ListNode::Factor(f.clone()),
        Value::List(l) => ListNode::List {
            children: l.iter().map(|v| lower(v, externals)).collect(),
            names: l.names().map(<[String]>::to_vec),
        },
        Value::Frame(_) | Value::Object(_) => {
            externals.push(value);
            ListNode::External(externals.len() - 1)
        }
    }
}

impl ListNode {
    /// Rebuild the value tree, resolving each external index through `resolve`.
    pub fn into_value<E, F>(self, resolve: &mut F) -> Result<Value, E>
    where
        E: From<CodecError>,
        F: FnMut(usize) -> Result<Value, E>,
    {
        Ok(match self {
            Self::Nothing => Value::Nothing,
            Self::Scalar(s) => Value::Scalar(s),
            Self::Vector(v) => Value::Vector(v),
            Self::Factor(f) => Value::Factor(f),
            Self::List { children, names } => {
                let values = children
                    .into_iter()
                    .map(|c| c.into_value(resolve))
                    .collect::<Result<Vec<_>, E>>()?;
                let list = match names {
                    Some(n) => List::with_names(values, n).map_err(CodecError::from)?,
                    None => List::new(values),
                };
                Value::List(list)
            }
            Self::External(i) => resolve(i)?,
        })
    }

    /// Number of external references in this subtree.
    pub fn external_count(&self) -> usize {
        match self {
            Self::External(_) => 1,
            Self::List { children, .. } => children.iter().map(Self::external_count).sum(),
            _ => 0,
        }
    }
}

fn malformed(msg: impl Into<String>) -> CodecError {
    CodecError::MalformedList(msg.into())
}

/// A length-one vector with its only element missing.
fn missing_scalar(t: ElementType) -> ListNode {
    let data = match t {
        ElementType::Integer => VectorData::Integer(vec![None]),
        ElementType::Number => VectorData::Number(vec![None]),
        ElementType::String => VectorData::String(vec![None]),
        ElementType::Boolean => VectorData::Boolean(vec![None]),
    };
    ListNode::Vector(AtomicVector::new(data))
}

fn with_names(data: VectorData, names: Option<Vec<String>>) -> CodecResult<AtomicVector> {
    Ok(match names {
        Some(n) => AtomicVector::with_names(data, n)?,
        None => AtomicVector::new(data),
    })
}

// JSON form.

fn names_to_json(obj: &mut Map<String, Json>, names: Option<&[String]>) {
    if let Some(n) = names {
        obj.insert("names".into(), json!(n));
    }
}

/// JSON form of a node.
pub fn to_json(node: &ListNode) -> Json {
    match node {
        ListNode::Nothing => json!({"type": "nothing"}),
        ListNode::External(i) => json!({"type": "external", "index": i}),
        ListNode::Scalar(s) => {
            let (t, v) = scalar_to_json(s);
            json!({"type": t.as_str(), "values": v})
        }
        ListNode::Vector(v) => {
            let (t, values) = vector_to_json(v.data());
            let mut obj = Map::new();
            obj.insert("type".into(), json!(t.as_str()));
            obj.insert("values".into(), Json::Array(values));
            names_to_json(&mut obj, v.names());
            Json::Object(obj)
        }
        ListNode::Factor(f) => {
            let codes: Vec<Json> = f
                .codes()
                .iter()
                .map(|&c| if c == MISSING_CODE { Json::Null } else { json!(c) })
                .collect();
            let mut obj = Map::new();
            obj.insert("type".into(), json!("factor"));
            obj.insert("values".into(), Json::Array(codes));
            obj.insert("levels".into(), json!(f.levels()));
            obj.insert("ordered".into(), json!(f.is_ordered()));
            names_to_json(&mut obj, f.names());
            Json::Object(obj)
        }
        ListNode::List { children, names } => {
            let mut obj = Map::new();
            obj.insert("type".into(), json!("list"));
            obj.insert("values".into(), Json::Array(children.iter().map(to_json).collect()));
            names_to_json(&mut obj, names.as_deref());
            Json::Object(obj)
        }
    }
}

/// JSON document for a whole tree, stamped with [`JSON_VERSION`].
pub fn to_json_document(root: &ListNode) -> Json {
    let mut doc = to_json(root);
    if let Json::Object(obj) = &mut doc {
        obj.insert("version".into(), json!(JSON_VERSION));
    }
    doc
}

fn json_strings(value: &Json, what: &str) -> CodecResult<Vec<String>> {
    value
        .as_array()
        .ok_or_else(|| malformed(format!("{what} must be an array")))?
        .iter()
        .map(|s| {
            s.as_str()
                .map(str::to_string)
                .ok_or_else(|| malformed(format!("{what} must hold strings")))
        })
        .collect()
}

fn json_names(obj: &Map<String, Json>) -> CodecResult<Option<Vec<String>>> {
    obj.get("names").map(|n| json_strings(n, "names")).transpose()
}

/// Parse the JSON form of a node.
pub fn from_json(value: &Json) -> CodecResult<ListNode> {
    let obj = value.as_object().ok_or_else(|| malformed("node must be an object"))?;
    let kind = obj
        .get("type")
        .and_then(Json::as_str)
        .ok_or_else(|| malformed("node has no type"))?;
    let values = obj.get("values");

    match kind {
        "nothing" => Ok(ListNode::Nothing),
        "external" => {
            let index = obj
                .get("index")
                .and_then(Json::as_u64)
                .ok_or_else(|| malformed("external node needs an index"))?;
            Ok(ListNode::External(index as usize))
        }
        "list" => {
            let children = values
                .and_then(Json::as_array)
                .ok_or_else(|| malformed("list values must be an array"))?
                .iter()
                .map(from_json)
                .collect::<CodecResult<Vec<_>>>()?;
            let names = json_names(obj)?;
            if let Some(n) = &names {
                if n.len() != children.len() {
                    return Err(CodecError::ShapeMismatch {
                        what: "list names".into(),
                        expected: children.len(),
                        actual: n.len(),
                    });
                }
            }
            Ok(ListNode::List { children, names })
        }
        "factor" => {
            let codes = values
                .and_then(Json::as_array)
                .ok_or_else(|| malformed("factor values must be an array"))?
                .iter()
                .map(|c| match c {
                    Json::Null => Ok(MISSING_CODE),
                    other => other
                        .as_i64()
                        .and_then(|c| i32::try_from(c).ok())
                        .filter(|&c| c >= 0)
                        .ok_or_else(|| malformed(format!("invalid factor code {other}"))),
                })
                .collect::<CodecResult<Vec<_>>>()?;
            let levels = json_strings(obj.get("levels").unwrap_or(&Json::Null), "levels")?;
            let ordered = obj.get("ordered").and_then(Json::as_bool).unwrap_or(false);
            let factor = Factor::new(codes, levels, ordered)?;
            Ok(ListNode::Factor(match json_names(obj)? {
                Some(n) => factor.with_names(n)?,
                None => factor,
            }))
        }
        other => {
            let t: ElementType = other
                .parse()
                .map_err(|_| CodecError::UnknownNodeType(other.to_string()))?;
            let values = values.ok_or_else(|| malformed(format!("{other} node has no values")))?;
            match values {
                Json::Array(items) => {
                    let data = vector_from_json(t, items)?;
                    Ok(ListNode::Vector(with_names(data, json_names(obj)?)?))
                }
                scalar => Ok(match scalar_from_json(t, scalar)? {
                    Some(s) => ListNode::Scalar(s),
                    None => missing_scalar(t),
                }),
            }
        }
    }
}

// Hierarchical form.

fn write_node(node: &ListNode, group: &mut Group, compression: Compression) -> CodecResult<()> {
    match node {
        ListNode::Nothing => group.set_attr(NODE_ATTR, "nothing"),
        ListNode::External(i) => {
            group.set_attr(NODE_ATTR, "external");
            group.create_scalar("index", vec![*i as u64])?;
        }
        ListNode::Scalar(s) => {
            group.set_attr(NODE_ATTR, "vector");
            let t = write_scalar(group, "data", s)?;
            group.set_attr(TYPE_ATTR, t.as_str());
        }
        ListNode::Vector(v) => {
            group.set_attr(NODE_ATTR, "vector");
            let t = write_vector(group, "data", v.data(), compression)?;
            group.set_attr(TYPE_ATTR, t.as_str());
            if let Some(n) = v.names() {
                write_names(group, "names", n, compression)?;
            }
        }
        ListNode::Factor(f) => {
            group.set_attr(NODE_ATTR, "vector");
            group.set_attr(TYPE_ATTR, "factor");
            write_factor(group, f, compression)?;
            if let Some(n) = f.names() {
                write_names(group, "names", n, compression)?;
            }
        }
        ListNode::List { children, names } => {
            group.set_attr(NODE_ATTR, "list");
            let data = group.create_group("data")?;
            for (i, child) in children.iter().enumerate() {
                write_node(child, data.create_group(&i.to_string())?, compression)?;
            }
            if let Some(n) = names {
                write_names(group, "names", n, compression)?;
            }
        }
    }
    Ok(())
}

fn str_attr<'a>(group: &'a Group, name: &str) -> CodecResult<&'a str> {
    group
        .attr(name)
        .and_then(AttrValue::as_str)
        .ok_or_else(|| malformed(format!("missing {name} attribute")))
}

fn optional_names(group: &Group) -> CodecResult<Option<Vec<String>>> {
    if group.contains("names") {
        Ok(Some(read_names(group, "names")?))
    } else {
        Ok(None)
    }
}

fn read_node(group: &Group) -> CodecResult<ListNode> {
    match str_attr(group, NODE_ATTR)? {
        "nothing" => Ok(ListNode::Nothing),
        "external" => {
            let index = read_integers(group, "index")?
                .first()
                .copied()
                .flatten()
                .and_then(|i| usize::try_from(i).ok())
                .ok_or_else(|| malformed("external node needs an index"))?;
            Ok(ListNode::External(index))
        }
        "list" => {
            let data = group.group("data")?;
            let children = (0..data.len())
                .map(|i| read_node(data.group(&i.to_string())?))
                .collect::<CodecResult<Vec<_>>>()?;
            let names = optional_names(group)?;
            if let Some(n) = &names {
                if n.len() != children.len() {
                    return Err(CodecError::ShapeMismatch {
                        what: "list names".into(),
                        expected: children.len(),
                        actual: n.len(),
                    });
                }
            }
            Ok(ListNode::List { children, names })
        }
        "vector" => {
            let kind = str_attr(group, TYPE_ATTR)?;
            if kind == "factor" {
                let factor = read_factor(group)?;
                return Ok(ListNode::Factor(match optional_names(group)? {
                    Some(n) => factor.with_names(n)?,
                    None => factor,
                }));
            }
            let t: ElementType = kind
                .parse()
                .map_err(|_| CodecError::UnknownNodeType(kind.to_string()))?;
            if group.dataset("data")?.is_scalar() {
                return Ok(match read_scalar(group, "data", t)? {
                    Some(s) => ListNode::Scalar(s),
                    None => missing_scalar(t),
                });
            }
            let data = read_vector(group, "data", t)?;
            Ok(ListNode::Vector(with_names(data, optional_names(group)?)?))
        }
        other => Err(CodecError::UnknownNodeType(other.to_string())),
    }
}

/// Build a hierarchical list file holding `root`.
pub fn to_hds(root: &ListNode, compression: Compression) -> CodecResult<HdsFile> {
    let mut file = HdsFile::new();
    let group = file.root_mut().create_group(ROOT_GROUP)?;
    group.set_attr(VERSION_ATTR, HDS_VERSION);
    write_node(root, group, compression)?;
    Ok(file)
}

/// Read the tree stored by [`to_hds`].
pub fn from_hds(file: &HdsFile) -> CodecResult<ListNode> {
    read_node(file.root().group(ROOT_GROUP)?)
}
