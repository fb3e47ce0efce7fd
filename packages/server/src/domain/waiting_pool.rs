//! Waiting Pool
//!
//! マッチング待ちユーザーの FIFO。同じ UserId は高々 1 回しか入らない。

use std::collections::VecDeque;

use super::{
    entity::WaitingEntry,
    value_object::{Timestamp, UserId},
};

#[derive(Debug, Default)]
pub struct WaitingPool {
    entries: VecDeque<WaitingEntry>,
}

impl WaitingPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// 末尾に追加する。既に入っていれば何もせず `false` を返す。
    ///
    /// Session 中のユーザーを弾くのは Registry を知っている `Lobby` の責務。
    pub fn enqueue(&mut self, user_id: UserId, enqueued_at: Timestamp) -> bool {
        if self.contains(&user_id) {
            return false;
        }
        self.entries.push_back(WaitingEntry {
            user_id,
            enqueued_at,
        });
        true
    }

    /// `user_id` 以外で最も古いエントリを取り出す（自分自身とはマッチしない）
    pub fn dequeue_oldest_other_than(&mut self, user_id: &UserId) -> Option<WaitingEntry> {
        let index = self.entries.iter().position(|e| &e.user_id != user_id)?;
        self.entries.remove(index)
    }

    /// 冪等な削除。削除したら `true`
    pub fn remove(&mut self, user_id: &UserId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| &e.user_id != user_id);
        before != self.entries.len()
    }

    pub fn contains(&self, user_id: &UserId) -> bool {
        self.entries.iter().any(|e| &e.user_id == user_id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &WaitingEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
