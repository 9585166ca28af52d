//! # 共通値オブジェクト
//!
//! 複数のエンティティで共有される値オブジェクトを定義する。
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: プリミティブ型をラップし、型安全性を確保
//! - **バリデーション**: 生成時に検証し、不正な値の存在を型レベルで排除
//! - **不変性**: 一度作成したら変更不可
//!
//! ## 含まれる型
//!
//! | 型 | ラップ対象 | 用途 |
//! |---|-----------|------|
//! | [`Version`] | `u32` | 楽観的ロック用のバージョン番号 |
//! | [`PaymentAmount`] | `i64` | 支払金額（円） |
//! | [`DoctorName`] | `String` | ドクター表示名 |
//! | [`PatientName`] | `String` | 患者名（PII、Debug マスク） |

use serde::{Deserialize, Serialize};

use crate::DomainError;

// =========================================================================
// Version（バージョン番号）
// =========================================================================

/// バージョン番号（値オブジェクト）
///
/// 予約レコードの楽観的ロックに使用する。
/// 1 から始まり、更新のたびにインクリメントされる。
/// 更新時はリポジトリがリクエストの version と DB の version を比較し、
/// 一致しない場合は競合エラーを返す。
///
/// # 不変条件
///
/// - バージョン番号は 1 以上
///
/// # 使用例
///
/// ```rust
/// use mediflow_domain::value_objects::Version;
///
/// let v1 = Version::initial();
/// assert_eq!(v1.as_u32(), 1);
///
/// let v2 = v1.next();
/// assert_eq!(v2.as_u32(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(u32);

impl Version {
    /// 初期バージョン（1）を作成する
    pub fn initial() -> Self {
        Self(1)
    }

    /// 指定した値からバージョンを作成する
    ///
    /// # エラー
    ///
    /// 0 は無効（バージョンは 1 以上）。`DomainError::Validation` を返す。
    pub fn new(value: u32) -> Result<Self, DomainError> {
        if value == 0 {
            return Err(DomainError::Validation(
                "バージョン番号は 1 以上である必要があります".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// 次のバージョンを返す
    ///
    /// # パニック
    ///
    /// u32 の最大値を超える場合はパニックする。実運用では到達しない想定。
    pub fn next(&self) -> Self {
        Self(
            self.0
                .checked_add(1)
                .expect("バージョン番号がオーバーフローしました"),
        )
    }

    /// 内部の u32 値を取得する
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// i32 に変換する（DB 互換用）
    ///
    /// # パニック
    ///
    /// i32 の範囲を超える場合はパニックする。
    pub fn as_i32(&self) -> i32 {
        i32::try_from(self.0).expect("バージョン番号が i32 の範囲を超えています")
    }
}

impl TryFrom<i32> for Version {
    type Error = DomainError;

    /// i32 から Version への変換を試みる
    ///
    /// # エラー
    ///
    /// 値が 0 以下の場合は `DomainError::Validation` を返す。
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(DomainError::Validation(
                "バージョン番号は 1 以上である必要があります".to_string(),
            ));
        }
        Ok(Self(value as u32))
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
// PaymentAmount（支払金額）
// =========================================================================

/// 支払金額（値オブジェクト）
///
/// 円単位の金額を表す。負の金額は存在しない。
///
/// # 不変条件
///
/// - 0 以上の整数（円）
///
/// # 使用例
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use mediflow_domain::value_objects::PaymentAmount;
///
/// let amount = PaymentAmount::new(5000)?;
/// assert_eq!(amount.as_i64(), 5000);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PaymentAmount(i64);

impl PaymentAmount {
    /// 指定した値から支払金額を作成する
    ///
    /// # エラー
    ///
    /// 負の値の場合は `DomainError::Validation` を返す。
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value < 0 {
            return Err(DomainError::Validation(
                "支払金額は 0 以上である必要があります".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// 内部の i64 値を取得する
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for PaymentAmount {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::fmt::Display for PaymentAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =========================================================================
// DoctorName（ドクター表示名）
// =========================================================================

define_validated_string! {
    /// ドクター表示名（値オブジェクト）
    ///
    /// 予約一覧やプロフィール画面に表示するドクターの名前。
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - 最大 100 文字
    pub struct DoctorName {
        label: "ドクター名",
        max_length: 100,
    }
}

// =========================================================================
// PatientName（患者名）
// =========================================================================

define_validated_string! {
    /// 患者名（値オブジェクト）
    ///
    /// 予約レコードに保持する患者の連絡先スナップショット。
    /// PII（個人識別情報）のため、Debug 出力はマスクされる。
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - 最大 100 文字
    pub struct PatientName {
        label: "患者名",
        max_length: 100,
        pii: true,
    }
}

// =========================================================================
// テスト
// =========================================================================

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    // Version のテスト

    #[test]
    fn test_バージョンの初期値は1() {
        let v = Version::initial();
        assert_eq!(v.as_u32(), 1);
    }

    #[test]
    fn test_バージョンのnextはインクリメントする() {
        let v1 = Version::initial();
        let v2 = v1.next();
        assert_eq!(v2.as_u32(), 2);
    }

    #[test]
    fn test_バージョン0は無効() {
        assert!(Version::new(0).is_err());
    }

    #[test]
    fn test_バージョンのi32変換() {
        let v = Version::new(42).unwrap();
        assert_eq!(v.as_i32(), 42);
    }

    #[rstest]
    #[case(0)]
    #[case(-1)]
    fn test_バージョンのi32からの変換_0以下は無効(#[case] value: i32) {
        assert!(Version::try_from(value).is_err());
    }

    #[test]
    fn test_バージョンのi32からの変換_正数は有効() {
        let v = Version::try_from(42).unwrap();
        assert_eq!(v.as_u32(), 42);
    }

    // PaymentAmount のテスト

    #[test]
    fn test_支払金額0は有効() {
        let amount = PaymentAmount::new(0).unwrap();
        assert_eq!(amount.as_i64(), 0);
    }

    #[test]
    fn test_支払金額の正数は有効() {
        let amount = PaymentAmount::new(5000).unwrap();
        assert_eq!(amount.as_i64(), 5000);
    }

    #[test]
    fn test_支払金額の負数は無効() {
        assert!(PaymentAmount::new(-1).is_err());
    }

    #[test]
    fn test_支払金額のi64からの変換() {
        let amount = PaymentAmount::try_from(300_i64).unwrap();
        assert_eq!(amount.as_i64(), 300);
    }

    // DoctorName のテスト

    #[test]
    fn test_ドクター名は正常な値を受け入れる() {
        assert!(DoctorName::new("山田太郎").is_ok());
    }

    #[rstest]
    #[case("", "空文字列")]
    #[case("   ", "空白のみ")]
    fn test_ドクター名は空を拒否する(#[case] input: &str, #[case] _reason: &str) {
        assert!(DoctorName::new(input).is_err());
    }

    #[test]
    fn test_ドクター名は前後の空白をトリムする() {
        let name = DoctorName::new("  山田太郎  ").unwrap();
        assert_eq!(name.as_str(), "山田太郎");
    }

    #[test]
    fn test_ドクター名は101文字以上を拒否する() {
        let long_name = "あ".repeat(101);
        assert!(DoctorName::new(&long_name).is_err());
    }

    #[test]
    fn test_ドクター名のdebug出力は実際の値を表示する() {
        let name = DoctorName::new("山田太郎").unwrap();
        assert!(format!("{:?}", name).contains("山田太郎"));
    }

    // PatientName のテスト

    #[test]
    fn test_患者名は正常な値を受け入れる() {
        assert!(PatientName::new("佐藤花子").is_ok());
    }

    #[test]
    fn test_患者名のdebug出力はマスクされる() {
        let name = PatientName::new("佐藤花子").unwrap();
        let debug = format!("{:?}", name);
        assert!(debug.contains(crate::REDACTED));
        assert!(!debug.contains("佐藤花子"));
    }

    #[test]
    fn test_患者名のas_strは実際の値を返す() {
        let name = PatientName::new("佐藤花子").unwrap();
        assert_eq!(name.as_str(), "佐藤花子");
    }

    #[test]
    fn test_患者名は100文字まで許容する() {
        let long_name = "あ".repeat(100);
        assert!(PatientName::new(&long_name).is_ok());
    }
}
