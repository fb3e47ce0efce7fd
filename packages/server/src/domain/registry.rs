//! Connection Registry
//!
//! UserId ごとに高々 1 本の生きた Connection を保持する。
//! 同じ UserId の再登録は古い Connection を置き換え、その置き換えを
//! `superseded_by` として明示的に記録する（古いハンドルが無効であることをテストで確認できる）。

use std::collections::HashMap;

use super::{
    entity::Connection,
    value_object::{ConnectionId, DisplayName, Timestamp, UserId},
};

/// `register` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub connection_id: ConnectionId,
    /// 置き換えられた古い Connection（Session / WaitingEntry の後始末は呼び出し側）
    pub superseded: Option<Connection>,
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<UserId, Connection>,
    /// old ConnectionId -> new ConnectionId
    superseded: HashMap<ConnectionId, ConnectionId>,
    next_connection_id: u64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        user_id: UserId,
        display_name: DisplayName,
        connected_at: Timestamp,
    ) -> Registration {
        self.next_connection_id += 1;
        let connection_id = ConnectionId::new(self.next_connection_id);
        let connection = Connection::new(connection_id, user_id.clone(), display_name, connected_at);

        let superseded = self.connections.insert(user_id, connection);
        if let Some(old) = &superseded {
            self.superseded.insert(old.id, connection_id);
        }

        Registration {
            connection_id,
            superseded,
        }
    }

    pub fn lookup(&self, user_id: &UserId) -> Option<&Connection> {
        self.connections.get(user_id)
    }

    pub fn lookup_mut(&mut self, user_id: &UserId) -> Option<&mut Connection> {
        self.connections.get_mut(user_id)
    }

    pub fn contains(&self, user_id: &UserId) -> bool {
        self.connections.contains_key(user_id)
    }

    /// `connection_id` が `user_id` の現在の接続かどうか
    pub fn is_current(&self, user_id: &UserId, connection_id: ConnectionId) -> bool {
        self.connections
            .get(user_id)
            .is_some_and(|c| c.id == connection_id)
    }

    /// 古い接続を置き換えた新しい接続の ID
    pub fn superseded_by(&self, connection_id: ConnectionId) -> Option<ConnectionId> {
        self.superseded.get(&connection_id).copied()
    }

    /// 現在の接続であれば削除して返す。
    ///
    /// 置き換え済み・未知の接続に対しては何もしない（置き換え記録だけ片付ける）。
    pub fn remove(&mut self, user_id: &UserId, connection_id: ConnectionId) -> Option<Connection> {
        if self.is_current(user_id, connection_id) {
            self.connections.remove(user_id)
        } else {
            self.superseded.remove(&connection_id);
            None
        }
    }

    pub fn user_ids(&self) -> impl Iterator<Item = &UserId> {
        self.connections.keys()
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
