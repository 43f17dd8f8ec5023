/*!
 * Typed record identities.
 *
 * Every table in the schema is a zero-sized marker type implementing [`Table`].
 * The marker fixes the table name and the key type, so a `RecordId<User>` can only
 * be built from a string key and a `RecordId<AssetCache>` only from a pair of numbers.
 * A mismatched key is a compile error, not a runtime one.
 *
 * ```
 * use recordgate::record::{RecordId, table};
 *
 * let user = RecordId::new(table::User, "heliodex");
 * assert_eq!(user.to_string(), "user:⟨heliodex⟩");
 *
 * let cache = RecordId::new(table::AssetCache, (12_i64, 3_i64));
 * assert_eq!(cache.to_string(), "assetCache:[12, 3]");
 * ```
 */

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde_json::Value;

/// A key type that can identify a record
pub trait RecordKey: Clone + PartialEq + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// The key in query-language record id syntax
    fn render(&self) -> String;
}

impl RecordKey for String {
    fn render(&self) -> String {
        let mut out = String::with_capacity(self.len() + 2);
        out.push('⟨');
        for c in self.chars() {
            if c == '⟩' || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('⟩');
        out
    }
}

impl RecordKey for i64 {
    fn render(&self) -> String {
        self.to_string()
    }
}

impl RecordKey for (i64, i64) {
    fn render(&self) -> String {
        format!("[{}, {}]", self.0, self.1)
    }
}

/// A database table with a fixed key type
pub trait Table: Copy + Default + fmt::Debug + Send + Sync + 'static {
    /// Table name as used in queries
    const NAME: &'static str;

    /// Key type of the table's records
    type Key: RecordKey;
}

macro_rules! tables {
    ($($(#[$meta:meta])* $marker:ident => $name:literal : $key:ty),+ $(,)?) => {
        /// Marker types for every table in the schema
        pub mod table {
            use super::Table;

            $(
                $(#[$meta])*
                #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
                pub struct $marker;

                impl Table for $marker {
                    const NAME: &'static str = $name;
                    type Key = $key;
                }
            )+

            /// Names of all tables, in schema order
            pub const ALL: &[&str] = &[$($name),+];
        }
    };
}

tables! {
    /// Catalogue item, keyed by its numeric asset id
    Asset => "asset": i64,
    /// Rendered asset versions, keyed by asset id and version
    AssetCache => "assetCache": (i64, i64),
    AssetComment => "assetComment": String,
    /// Privileged action records
    AuditLog => "auditLog": String,
    Banner => "banner": String,
    Created => "created": String,
    CreatedAsset => "createdAsset": String,
    Dislikes => "dislikes": String,
    Follows => "follows": String,
    ForumCategory => "forumCategory": String,
    ForumPost => "forumPost": String,
    ForumReply => "forumReply": String,
    Friends => "friends": String,
    Group => "group": String,
    HasSession => "hasSession": String,
    ImageAsset => "imageAsset": String,
    /// Group membership edge
    In => "in": String,
    Likes => "likes": String,
    Moderation => "moderation": String,
    Notification => "notification": String,
    Owns => "owns": String,
    /// Game server, keyed by its numeric place id
    Place => "place": i64,
    /// Active game session, keyed by its join ticket
    Playing => "playing": String,
    Posted => "posted": String,
    RecentlyWorn => "recentlyWorn": String,
    RegKey => "regKey": String,
    Render => "render": String,
    ReplyToAsset => "replyToAsset": String,
    ReplyToComment => "replyToComment": String,
    ReplyToPost => "replyToPost": String,
    ReplyToReply => "replyToReply": String,
    Report => "report": String,
    Request => "request": String,
    Session => "session": String,
    StatusPost => "statusPost": String,
    Stuff => "stuff": String,
    ThumbnailCache => "thumbnailCache": i64,
    /// Currency transfer records
    Transaction => "transaction": String,
    Used => "used": String,
    User => "user": String,
    Wearing => "wearing": String,
}

/// Identity of one record in table `T`
pub struct RecordId<T: Table> {
    key: T::Key,
    _table: PhantomData<T>,
}

impl<T: Table> RecordId<T> {
    /// Create a record id from a table marker and a key of the table's key type
    pub fn new(_table: T, key: impl Into<T::Key>) -> Self {
        Self {
            key: key.into(),
            _table: PhantomData,
        }
    }

    /// Name of the table this record lives in
    pub fn table(&self) -> &'static str {
        T::NAME
    }

    /// The record key
    pub fn key(&self) -> &T::Key {
        &self.key
    }

    /// Consume the id and return its key
    pub fn into_key(self) -> T::Key {
        self.key
    }

    /// The id as a binding value; query templates turn it back into a record with `type::record`
    pub fn to_binding(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl<T: Table> fmt::Display for RecordId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", T::NAME, self.key.render())
    }
}

impl<T: Table> fmt::Debug for RecordId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordId")
            .field("table", &T::NAME)
            .field("key", &self.key)
            .finish()
    }
}

impl<T: Table> Clone for RecordId<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            _table: PhantomData,
        }
    }
}

impl<T: Table> PartialEq for RecordId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T: Table> Eq for RecordId<T> {}

impl<T: Table> Hash for RecordId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        T::NAME.hash(state);
        self.key.hash(state);
    }
}

impl<T: Table> From<RecordId<T>> for Value {
    fn from(id: RecordId<T>) -> Self {
        id.to_binding()
    }
}

impl<T: Table> From<&RecordId<T>> for Value {
    fn from(id: &RecordId<T>) -> Self {
        id.to_binding()
    }
}
