use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 统一的时间戳类型。
pub type Timestamp = DateTime<Utc>;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new(id: Uuid) -> Self {
                Self(id)
            }

            /// 生成新的随机标识。
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

uuid_identifier!(
    /// 用户唯一标识，由认证令牌携带。
    UserId
);

uuid_identifier!(
    /// 求职申请唯一标识。
    ApplicationId
);

uuid_identifier!(
    /// 公司唯一标识。
    CompanyId
);

uuid_identifier!(
    /// 职位唯一标识，归属于某个公司。
    RoleId
);

uuid_identifier!(
    /// 博客文章唯一标识。
    PostId
);

uuid_identifier!(
    /// 评论唯一标识。
    CommentId
);

uuid_identifier!(
    /// 申请备注唯一标识。
    NoteId
);
