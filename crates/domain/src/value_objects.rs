//! # 共通値オブジェクト
//!
//! 複数のエンティティで共有される値オブジェクトを定義する。
//!
//! | 型 | ラップ対象 | 用途 |
//! |---|-----------|------|
//! | [`Version`] | `u32` | 楽観的ロック用のバージョン番号 |
//! | [`MemberName`] | `String` | メンバー表示名（決裁ライン・参照者の照合キー） |
//! | [`FormType`] | `String` | 決裁様式の種別（「休暇届」など） |
//! | [`ReferenceNames`] | `Vec<MemberName>` | 参照者（CC）の表示名リスト |

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::DomainError;

// =========================================================================
// Version（バージョン番号）
// =========================================================================

/// バージョン番号（値オブジェクト）
///
/// 集約の更新ごとにインクリメントされ、楽観的ロックに使う。
///
/// # 不変条件
///
/// - 1 以上
///
/// ```rust
/// use signflow_domain::value_objects::Version;
///
/// let v1 = Version::initial();
/// assert_eq!(v1.next().as_u32(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(u32);

impl Version {
    /// 初期バージョン（1）
    pub fn initial() -> Self {
        Self(1)
    }

    pub fn new(value: u32) -> Result<Self, DomainError> {
        if value == 0 {
            return Err(DomainError::Validation(
                "バージョン番号は 1 以上である必要があります".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// 次のバージョンを返す
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// i32 に変換する（DB 互換用）
    pub fn as_i32(&self) -> i32 {
        i32::try_from(self.0).unwrap_or(i32::MAX)
    }
}

impl TryFrom<i32> for Version {
    type Error = DomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        let value = u32::try_from(value).map_err(|_| {
            DomainError::Validation("バージョン番号は 1 以上である必要があります".to_string())
        })?;
        Self::new(value)
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::initial()
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

// =========================================================================
// 文字列値オブジェクト
// =========================================================================

define_validated_string! {
    /// メンバー表示名
    ///
    /// 決裁ラインと参照者は ID ではなく表示名で保持されるため、
    /// この型の等価性がそのまま「本人かどうか」の判定になる。
    pub struct MemberName {
        label: "メンバー名",
        max_length: 50,
    }
}

define_validated_string! {
    /// 決裁様式の種別
    pub struct FormType {
        label: "様式種別",
        max_length: 50,
    }
}

// =========================================================================
// ReferenceNames（参照者リスト）
// =========================================================================

/// 参照者（CC）の表示名リスト
///
/// 永続化・外部入力ではカンマ区切り文字列として扱う。
/// 順序に意味はなく、各トークンは trim して比較する。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReferenceNames(Vec<MemberName>);

impl ReferenceNames {
    pub fn new(names: Vec<MemberName>) -> Self {
        Self(names.into_iter().unique().collect())
    }

    /// カンマ区切り文字列をパースする
    ///
    /// 空トークンは無視する。
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let names = raw
            .split(',')
            .filter(|token| !token.trim().is_empty())
            .map(MemberName::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(names))
    }

    /// カンマ区切り文字列に変換する（DB 互換用）
    pub fn to_joined(&self) -> String {
        self.0.iter().map(MemberName::as_str).join(",")
    }

    pub fn contains(&self, name: &MemberName) -> bool {
        self.0.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemberName> {
        self.0.iter()
    }
}
