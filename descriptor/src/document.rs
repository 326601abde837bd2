//! Structural descriptions of types as emitted by a schema-introspection tool.

use crate::{plan::Extensibility, Error, SerializationPlan};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, str::FromStr};

/// Separator between a namespace and a type name.
const NAMESPACE_SEPARATOR: &str = "::";

/// Strip the leading `Namespace::` prefix from `name`.
///
/// Only the first segment is removed: `Outer::Inner::T` becomes `Inner::T`.
pub fn strip_namespace(name: &str) -> &str {
    name.split_once(NAMESPACE_SEPARATOR)
        .map_or(name, |(_, rest)| rest)
}

/// A set of type descriptions. Read-only once loaded.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Document {
    #[serde(default)]
    pub types: Vec<TypeDefinition>,
}

/// Description of a single type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TypeDefinition {
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub extensibility: Extensibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_descriptor: Option<TopicDescriptor>,
}

/// Serialization metadata of a topic type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TopicDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    #[serde(default)]
    pub align: usize,
    #[serde(default)]
    pub flag_set: u32,
    #[serde(default)]
    pub type_name: String,
    #[serde(default)]
    pub keys: Vec<KeyDescriptor>,
    /// Opcode program. Producers may write words as signed or unsigned integers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ops: Option<Vec<i64>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyDescriptor {
    pub name: String,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub order: u32,
}

impl Document {
    /// Read and parse the document at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| Error::Io(path.to_path_buf(), e))?;
        serde_json::from_str(&raw).map_err(|e| Error::Parse(path.to_path_buf(), e))
    }

    /// Find a type by exact name, falling back to the first type whose name without its leading
    /// namespace equals `name` (or `name` without its own leading namespace).
    pub fn find(&self, name: &str) -> Option<&TypeDefinition> {
        self.types
            .iter()
            .find(|definition| definition.name == name)
            .or_else(|| {
                let base = strip_namespace(name);
                self.types.iter().find(|definition| {
                    let stored = strip_namespace(&definition.name);
                    stored == name || stored == base
                })
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|definition| definition.name.as_str())
    }
}

impl FromStr for Document {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}

impl TypeDefinition {
    /// Declared native size: the type-level `Size`, else the descriptor's.
    pub fn size(&self) -> Option<usize> {
        self.size
            .or_else(|| self.topic_descriptor.as_ref().and_then(|d| d.size))
    }

    /// Whether the entry describes a laid-out type, i.e. declares a size or a topic descriptor.
    ///
    /// Enums, typedefs and similar entries carry neither.
    pub fn has_layout(&self) -> bool {
        self.size().is_some() || self.topic_descriptor.is_some()
    }

    /// Serialization plan of the type.
    ///
    /// Returns `Ok(None)` for types without a topic descriptor. A descriptor without `Ops`, a
    /// missing size, or a word outside the 32-bit range are errors.
    pub fn plan(&self) -> Result<Option<SerializationPlan>, Error> {
        let Some(ops) = self.ops()? else {
            return Ok(None);
        };
        let size = self
            .size()
            .ok_or_else(|| Error::MissingSize(self.name.clone()))?;
        Ok(Some(SerializationPlan::new(ops, size)))
    }

    /// Opcode words of the type, or `Ok(None)` for types without a topic descriptor.
    pub fn ops(&self) -> Result<Option<Vec<u32>>, Error> {
        let Some(descriptor) = &self.topic_descriptor else {
            return Ok(None);
        };
        let Some(ops) = &descriptor.ops else {
            return Err(Error::MissingOps(self.name.clone()));
        };
        ops.iter()
            .enumerate()
            .map(|(index, &value)| {
                word(value).ok_or_else(|| Error::InvalidOpcode {
                    name: self.name.clone(),
                    index,
                    value,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

/// Reinterpret a signed or unsigned 32-bit integer as an opcode word.
fn word(value: i64) -> Option<u32> {
    if let Ok(word) = u32::try_from(value) {
        return Some(word);
    }
    i32::try_from(value).ok().map(|word| word as u32)
}
