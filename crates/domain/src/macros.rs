/// UUID v7 ベースの ID 型を定義する宣言型マクロ
///
/// 以下を一括生成する:
/// - `Uuid` をラップする Newtype 構造体
/// - `derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)`
/// - `new()` / `from_uuid()` / `as_uuid()`
/// - `Default`（`new()` に委譲）
///
/// # 使用例
///
/// ```rust
/// use signflow_domain::approval::ApprovalNo;
///
/// let no = ApprovalNo::new();
/// let restored = ApprovalNo::from_uuid(*no.as_uuid());
/// assert_eq!(no, restored);
/// ```
macro_rules! define_uuid_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        #[display("{_0}")]
        $vis struct $Name(uuid::Uuid);

        impl $Name {
            /// 新しい ID を生成する（UUID v7）
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// 既存の UUID から ID を復元する
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// 内部の UUID 参照を取得する
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $Name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// バリデーション付き String Newtype を定義する宣言型マクロ
///
/// 生成されるもの:
/// - `String` をラップする Newtype 構造体（`Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, serde）
/// - `new()`: trim → 空チェック → 最大文字数チェック
/// - `as_str()` / `into_string()`
/// - `Display`
///
/// 決裁ラインは表示名の一致で解決されるため、比較は trim 済みの値で行われる。
///
/// # 使用例
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use signflow_domain::value_objects::MemberName;
///
/// let name = MemberName::new("  김지훈 ")?;
/// assert_eq!(name.as_str(), "김지훈");
/// assert!(MemberName::new("   ").is_err());
/// # Ok(())
/// # }
/// ```
macro_rules! define_validated_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident {
            label: $label:expr,
            max_length: $max_length:expr $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(try_from = "String", into = "String")]
        $vis struct $Name(String);

        impl $Name {
            pub fn new(value: impl Into<String>) -> Result<Self, $crate::DomainError> {
                let value = value.into().trim().to_string();

                if value.is_empty() {
                    return Err($crate::DomainError::Validation(format!(
                        "{}は必須です",
                        $label
                    )));
                }

                if value.chars().count() > $max_length {
                    return Err($crate::DomainError::Validation(format!(
                        "{}は {} 文字以内である必要があります",
                        $label, $max_length
                    )));
                }

                Ok(Self(value))
            }

            /// 空文字列・空白のみを `None` として扱いながら生成する
            ///
            /// DB や外部入力の「未設定」を `Option` に正規化する用途。
            pub fn new_optional(
                value: Option<impl Into<String>>,
            ) -> Result<Option<Self>, $crate::DomainError> {
                match value.map(Into::into) {
                    Some(v) if !v.trim().is_empty() => Self::new(v).map(Some),
                    _ => Ok(None),
                }
            }

            /// 文字列参照を取得する
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// 所有権を持つ文字列に変換する
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $Name {
            type Error = $crate::DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$Name> for String {
            fn from(value: $Name) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}
