use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::AppError;

/// Kind of a file record. Folders carry no content; files and images always do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "file_kind", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Folder,
    File,
    Image,
}

impl FileKind {
    pub fn has_content(self) -> bool {
        !matches!(self, FileKind::Folder)
    }
}

impl Display for FileKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FileKind::Folder => write!(f, "folder"),
            FileKind::File => write!(f, "file"),
            FileKind::Image => write!(f, "image"),
        }
    }
}

impl FromStr for FileKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folder" => Ok(FileKind::Folder),
            "file" => Ok(FileKind::File),
            "image" => Ok(FileKind::Image),
            _ => Err(anyhow::anyhow!("Invalid file kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }
}

impl From<bool> for Visibility {
    fn from(is_public: bool) -> Self {
        if is_public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }
}

impl Display for Visibility {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// Parent of a record: the root sentinel or a folder record.
///
/// On the wire the root is `0` and a folder is its UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParentRef {
    #[default]
    Root,
    Folder(Uuid),
}

impl ParentRef {
    /// Parse a query-string value. `"0"` is the root; anything that is not a UUID is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value == "0" {
            return Some(ParentRef::Root);
        }
        Uuid::parse_str(value).ok().map(ParentRef::Folder)
    }

    pub fn folder_id(self) -> Option<Uuid> {
        match self {
            ParentRef::Root => None,
            ParentRef::Folder(id) => Some(id),
        }
    }
}

impl From<Option<Uuid>> for ParentRef {
    fn from(id: Option<Uuid>) -> Self {
        id.map(ParentRef::Folder).unwrap_or(ParentRef::Root)
    }
}

impl Display for ParentRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ParentRef::Root => write!(f, "0"),
            ParentRef::Folder(id) => write!(f, "{}", id),
        }
    }
}

impl Serialize for ParentRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParentRef::Root => serializer.serialize_u8(0),
            ParentRef::Folder(id) => serializer.collect_str(id),
        }
    }
}

impl<'de> Deserialize<'de> for ParentRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = ParentIdInput::deserialize(deserializer)?;
        raw.to_parent_ref()
            .ok_or_else(|| serde::de::Error::custom("parentId must be 0 or a folder id"))
    }
}

/// Raw `parentId` as sent by clients: a number (`0`) or a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ParentIdInput {
    Number(i64),
    Text(String),
}

impl ParentIdInput {
    /// `None` means the value cannot name any record.
    pub fn to_parent_ref(&self) -> Option<ParentRef> {
        match self {
            ParentIdInput::Number(0) => Some(ParentRef::Root),
            ParentIdInput::Number(_) => None,
            ParentIdInput::Text(text) => ParentRef::parse(text),
        }
    }
}

/// Persisted file or folder metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FileRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub kind: FileKind,
    pub is_public: bool,
    /// `None` is the root sentinel.
    pub parent_id: Option<Uuid>,
    /// Content pointer; present iff `kind` is not a folder.
    pub blob_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn parent(&self) -> ParentRef {
        ParentRef::from(self.parent_id)
    }

    pub fn visibility(&self) -> Visibility {
        Visibility::from(self.is_public)
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Record to insert. The store assigns the identity and creation timestamp.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub user_id: Uuid,
    pub name: String,
    pub kind: FileKind,
    pub visibility: Visibility,
    pub parent: ParentRef,
    pub blob_id: Option<Uuid>,
}

impl NewFileRecord {
    pub fn folder(user_id: Uuid, name: String, visibility: Visibility, parent: ParentRef) -> Self {
        Self {
            user_id,
            name,
            kind: FileKind::Folder,
            visibility,
            parent,
            blob_id: None,
        }
    }

    pub fn with_content(
        user_id: Uuid,
        name: String,
        kind: FileKind,
        visibility: Visibility,
        parent: ParentRef,
        blob_id: Uuid,
    ) -> Self {
        Self {
            user_id,
            name,
            kind,
            visibility,
            parent,
            blob_id: Some(blob_id),
        }
    }

    /// Folders never carry a content pointer; files and images always do.
    pub fn check_shape(&self) -> Result<(), AppError> {
        if self.kind.has_content() != self.blob_id.is_some() {
            return Err(AppError::Internal(format!(
                "{} record with content pointer {:?} violates the content invariant",
                self.kind, self.blob_id
            )));
        }
        Ok(())
    }

    pub fn into_record(self, id: Uuid, created_at: DateTime<Utc>) -> FileRecord {
        FileRecord {
            id,
            user_id: self.user_id,
            name: self.name,
            kind: self.kind,
            is_public: self.visibility.is_public(),
            parent_id: self.parent.folder_id(),
            blob_id: self.blob_id,
            created_at,
        }
    }
}

/// Public projection of a record returned by the HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub is_public: bool,
    #[schema(value_type = String, example = "0")]
    pub parent_id: ParentRef,
}

impl From<FileRecord> for FileResponse {
    fn from(record: FileRecord) -> Self {
        FileResponse {
            parent_id: record.parent(),
            id: record.id,
            user_id: record.user_id,
            name: record.name,
            kind: record.kind,
            is_public: record.is_public,
        }
    }
}

/// Upload body. Presence of `name`, `type` and `data` is checked by the upload
/// pipeline so each missing field gets its own message.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    #[schema(example = "image")]
    pub kind: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "0")]
    pub parent_id: Option<ParentIdInput>,
    /// Base64 encoded content, required unless `type` is `folder`.
    pub data: Option<String>,
}
