//! Value Objects
//!
//! 不変で、生成時に検証済みであることが保証される値。
//! 文字列のまま持ち回さず、ここで型を付けてから Domain に渡します。

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use super::error::ValueObjectError;

/// UserId の最大長
pub const USER_ID_MAX_LEN: usize = 64;
/// DisplayName の最大長
pub const DISPLAY_NAME_MAX_LEN: usize = 32;
/// MessageContent の最大長
pub const MESSAGE_CONTENT_MAX_LEN: usize = 2000;

fn validate(value: &str, field: &'static str, max_len: usize) -> Result<(), ValueObjectError> {
    if value.trim().is_empty() {
        return Err(ValueObjectError::Empty(field));
    }
    let len = value.chars().count();
    if len > max_len {
        return Err(ValueObjectError::TooLong {
            field,
            max: max_len,
            actual: len,
        });
    }
    Ok(())
}

/// ユーザーの安定した識別子
///
/// 外部のトークン検証サービスから得るか、検証に失敗した場合はサーバー側で生成する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate(&value, "user_id", USER_ID_MAX_LEN)?;
        Ok(Self(value))
    }

    /// 検証サービスが使えないときのゲスト ID を生成
    pub fn generate_guest() -> Self {
        Self(format!("guest-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 相手に表示される名前
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate(&value, "display_name", DISPLAY_NAME_MAX_LEN)?;
        Ok(Self(value))
    }

    /// ゲスト ID から表示名を作る（`guest-1a2b3c4d...` -> `Guest-1a2b`）
    pub fn for_guest(user_id: &UserId) -> Self {
        let suffix: String = user_id
            .as_str()
            .trim_start_matches("guest-")
            .chars()
            .take(4)
            .collect();
        Self(format!("Guest-{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Session の識別子
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 1 回の登録（トランスポート接続）ごとに振られる世代番号
///
/// 同じ UserId で再接続した場合、古い接続は古い ConnectionId のまま取り残される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// チャットメッセージ本文
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate(&value, "content", MESSAGE_CONTENT_MAX_LEN)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageContent {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// メッセージの識別子
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// WebRTC シグナリングの種類（中身はコアにとって不透明）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

/// Session を終了させた理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TeardownReason {
    /// leave_chat による明示的な退出
    PartnerLeft,
    /// トランスポート切断（または同じ UserId による再接続）
    Disconnected,
    /// end_video_call
    CallEnded,
}
