#![allow(dead_code)]

use chrono::{DateTime, Utc};
use graphbind::{
    Connection, FieldDescriptor, Mapped, MappingResult, Record, ScalarKind, ToWire, Unmapped,
    WireEnum, impl_to_wire,
};

pub const POST_WITH_EMPTY_COMMENTS: &str =
    include_str!("../fixtures/post-with-empty-comments.json");
pub const POST_WITH_COMMENT_COUNT_ONLY: &str =
    include_str!("../fixtures/post-with-comment-count-only.json");
pub const POST_WITH_NORMAL_COMMENTS: &str =
    include_str!("../fixtures/post-with-normal-comments.json");
pub const DEVICE_CODE: &str = include_str!("../fixtures/devicecode.json");
pub const THREADS_BASIC_PROFILE: &str = include_str!("../fixtures/threads-basic-profile.json");

pub fn init_logging() {
    let _ = env_logger::Builder::from_env("RUST_LOG")
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Friends,
    Unknown,
}

impl WireEnum for Visibility {
    const CONSTANTS: &'static [&'static str] = &["PUBLIC", "FRIENDS", "UNKNOWN"];

    fn from_wire(value: &str) -> Option<Self> {
        match value {
            "PUBLIC" => Some(Self::Public),
            "FRIENDS" => Some(Self::Friends),
            "UNKNOWN" => Some(Self::Unknown),
            _ => None,
        }
    }

    fn as_wire(&self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Friends => "FRIENDS",
            Self::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: Option<String>,
    pub message: Option<String>,
    pub like_count: Option<i64>,
    pub created_time: Option<DateTime<Utc>>,
}

impl Mapped for Comment {
    fn type_name() -> &'static str {
        "Comment"
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::scalar("id", ScalarKind::Text),
            FieldDescriptor::scalar("message", ScalarKind::Text),
            FieldDescriptor::scalar("like_count", ScalarKind::I64),
            FieldDescriptor::scalar("created_time", ScalarKind::Timestamp),
        ]
    }

    fn from_record(record: &mut Record) -> MappingResult<Self> {
        Ok(Self {
            id: record.take("id")?,
            message: record.take("message")?,
            like_count: record.take("like_count")?,
            created_time: record.take("created_time")?,
        })
    }

    fn field_value(&self, ident: &str) -> Option<&dyn ToWire> {
        match ident {
            "id" => Some(&self.id),
            "message" => Some(&self.message),
            "like_count" => Some(&self.like_count),
            "created_time" => Some(&self.created_time),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: Option<String>,
    pub message: Option<String>,
    pub created_time: Option<DateTime<Utc>>,
    pub comments: Option<Connection<Comment>>,
    pub tags: Option<Vec<String>>,
    pub visibility: Option<Visibility>,
    pub unmapped: Unmapped,
}

impl Mapped for Post {
    fn type_name() -> &'static str {
        "Post"
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::scalar("id", ScalarKind::Text),
            FieldDescriptor::scalar("message", ScalarKind::Text),
            FieldDescriptor::scalar("created_time", ScalarKind::Timestamp),
            FieldDescriptor::object::<Connection<Comment>>("comments"),
            FieldDescriptor::scalar_list("tags", ScalarKind::Text),
            FieldDescriptor::scalar(
                "visibility",
                ScalarKind::enumeration_or::<Visibility>("UNKNOWN"),
            ),
            FieldDescriptor::catch_all("unmapped"),
        ]
    }

    fn from_record(record: &mut Record) -> MappingResult<Self> {
        Ok(Self {
            id: record.take("id")?,
            message: record.take("message")?,
            created_time: record.take("created_time")?,
            comments: record.take_object("comments")?,
            tags: record.take_list("tags")?,
            visibility: record.take_enum("visibility")?,
            unmapped: record.take_unmapped("unmapped")?,
        })
    }

    fn field_value(&self, ident: &str) -> Option<&dyn ToWire> {
        match ident {
            "id" => Some(&self.id),
            "message" => Some(&self.message),
            "created_time" => Some(&self.created_time),
            "comments" => Some(&self.comments),
            "tags" => Some(&self.tags),
            "visibility" => Some(&self.visibility),
            "unmapped" => Some(&self.unmapped),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCode {
    pub code: Option<String>,
    pub user_code: Option<String>,
    pub verification_uri: Option<String>,
    pub expires_in: Option<i32>,
    pub interval: Option<i32>,
}

impl Mapped for DeviceCode {
    fn type_name() -> &'static str {
        "DeviceCode"
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::scalar("code", ScalarKind::Text),
            FieldDescriptor::scalar("user_code", ScalarKind::Text),
            FieldDescriptor::scalar("verification_uri", ScalarKind::Text),
            FieldDescriptor::scalar("expires_in", ScalarKind::I32),
            FieldDescriptor::scalar("interval", ScalarKind::I32),
        ]
    }

    fn from_record(record: &mut Record) -> MappingResult<Self> {
        Ok(Self {
            code: record.take("code")?,
            user_code: record.take("user_code")?,
            verification_uri: record.take("verification_uri")?,
            expires_in: record.take("expires_in")?,
            interval: record.take("interval")?,
        })
    }

    fn field_value(&self, ident: &str) -> Option<&dyn ToWire> {
        match ident {
            "code" => Some(&self.code),
            "user_code" => Some(&self.user_code),
            "verification_uri" => Some(&self.verification_uri),
            "expires_in" => Some(&self.expires_in),
            "interval" => Some(&self.interval),
            _ => None,
        }
    }
}

/// Threads profile, whose wire names carry a product prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct TdProfile {
    pub id: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub profile_picture_url: Option<String>,
    pub biography: Option<String>,
    pub is_verified: Option<bool>,
}

impl Mapped for TdProfile {
    fn type_name() -> &'static str {
        "TdProfile"
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::scalar("id", ScalarKind::Text),
            FieldDescriptor::scalar("username", ScalarKind::Text),
            FieldDescriptor::scalar("name", ScalarKind::Text),
            FieldDescriptor::scalar("profile_picture_url", ScalarKind::Text)
                .wire("threads_profile_picture_url"),
            FieldDescriptor::scalar("biography", ScalarKind::Text).wire("threads_biography"),
            FieldDescriptor::scalar("is_verified", ScalarKind::Bool),
        ]
    }

    fn from_record(record: &mut Record) -> MappingResult<Self> {
        Ok(Self {
            id: record.take("id")?,
            username: record.take("username")?,
            name: record.take("name")?,
            profile_picture_url: record.take("profile_picture_url")?,
            biography: record.take("biography")?,
            is_verified: record.take("is_verified")?,
        })
    }

    fn field_value(&self, ident: &str) -> Option<&dyn ToWire> {
        match ident {
            "id" => Some(&self.id),
            "username" => Some(&self.username),
            "name" => Some(&self.name),
            "profile_picture_url" => Some(&self.profile_picture_url),
            "biography" => Some(&self.biography),
            "is_verified" => Some(&self.is_verified),
            _ => None,
        }
    }
}

impl_to_wire!(object: Comment, Post, DeviceCode, TdProfile);
impl_to_wire!(enumeration: Visibility);
